//! # AWS SQS Consumer
//!
//! A concurrent AWS SQS batch consumer that polls a queue from multiple
//! receivers, fans every received batch out to a caller-supplied handler and
//! deletes only the messages that were handled successfully, in a single
//! batched call per batch.
//!
//! ## Features
//!
//! - Asynchronous batch polling with a configurable number of parallel receivers
//! - Per-message handler fan-out with selective batched deletion
//! - Continue-on-error semantics: handler failures, receive outages and delete
//!   failures are logged and recovered locally, never fatal
//! - Bounded number of in-flight batch processors
//! - Graceful, caller-driven shutdown through a [`CancellationToken`]
//! - Trait-based handler system with generic shared resource support
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aws_sdk_sqs::types::Message;
//! use rs_sqs_consumer::client::create_sqs_client_from_env;
//! use rs_sqs_consumer::consumer::SqsConsumer;
//! use rs_sqs_consumer::consumer::config::SqsConsumerConfig;
//! use rs_sqs_consumer::errors::SqsConsumerError;
//!
//! async fn handle_message(message: Message, shared: String) -> Result<(), SqsConsumerError> {
//!     println!("Processing message: {:?} with shared: {}", message.body(), shared);
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_sqs_client_from_env().await;
//!     let queue_url = "https://sqs.region.amazonaws.com/account/queue-name";
//!     let shared_data = "shared state".to_string();
//!
//!     let consumer = SqsConsumer::with_handler_fn(
//!         client,
//!         queue_url,
//!         handle_message,
//!         shared_data,
//!         SqsConsumerConfig::default(),
//!     );
//!
//!     consumer.run_until_ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod consumer;
pub mod errors;
pub mod handler;
