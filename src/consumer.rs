//! The consumer pipeline: receivers polling the queue, a distributor fanning
//! batches out to processors, and processors deleting handled messages.
//!
//! Batches flow through a bounded channel from the receivers to the
//! distributor. The channel is the backpressure point: when processing falls
//! behind, the receivers block on publish and stop polling the queue.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use aws_sdk_sqs::types::Message;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backend::{QueueClient, ReceiveOptions, SqsQueueClient};
use crate::errors::SqsConsumerError;
use crate::handler::{FnMessageHandler, MessageHandler};
use self::config::SqsConsumerConfig;
use self::distributor::Distributor;
use self::processor::BatchProcessor;
use self::receiver::BatchReceiver;

pub mod config;
mod distributor;
mod processor;
mod receiver;

/// A concurrent SQS queue consumer.
///
/// Polls a queue with one or more parallel receivers, invokes a
/// [`MessageHandler`] concurrently over every message of every received batch
/// and deletes the successfully handled messages in one batched call per
/// batch. Messages whose handler call failed are left untouched and the queue
/// redelivers them once their visibility timeout expires.
///
/// Shutdown is caller-driven: [`run`](SqsConsumer::run) and
/// [`start`](SqsConsumer::start) take a [`CancellationToken`], so the caller
/// decides whether cancellation comes from an OS signal, a timer or an
/// explicit call. [`run_until_ctrl_c`](SqsConsumer::run_until_ctrl_c) wires
/// the token to SIGINT for binaries that want the classic behavior.
#[derive(Clone)]
pub struct SqsConsumer {
    queue_url: String,
    queue_client: Arc<dyn QueueClient>,
    handler: Arc<dyn MessageHandler>,
    config: SqsConsumerConfig,
    poll_delay_ms: Arc<AtomicU64>,
}

impl SqsConsumer {
    /// Creates a consumer for `queue_url` backed by the given SQS client.
    pub fn new(
        sqs_client: aws_sdk_sqs::Client,
        queue_url: &str,
        handler: impl MessageHandler + 'static,
        config: SqsConsumerConfig,
    ) -> Self {
        Self::with_queue_client(
            Arc::new(SqsQueueClient::new(sqs_client)),
            queue_url,
            handler,
            config,
        )
    }

    /// Creates a consumer with an SQS client loaded from the environment.
    ///
    /// See [`create_sqs_client_from_env`](crate::client::create_sqs_client_from_env)
    /// for the variables consulted.
    pub async fn from_env(
        queue_url: &str,
        handler: impl MessageHandler + 'static,
        config: SqsConsumerConfig,
    ) -> Self {
        let sqs_client = crate::client::create_sqs_client_from_env().await;
        Self::new(sqs_client, queue_url, handler, config)
    }

    /// Creates a consumer whose handler is a plain async function closing
    /// over a cloneable shared resource.
    ///
    /// The resource is cloned into every handler invocation; use an `Arc`,
    /// pool or client handle for anything expensive.
    pub fn with_handler_fn<F, Fut, TShared>(
        sqs_client: aws_sdk_sqs::Client,
        queue_url: &str,
        handler_fn: F,
        shared_resources: TShared,
        config: SqsConsumerConfig,
    ) -> Self
    where
        F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SqsConsumerError>> + Send + 'static,
        TShared: Send + Sync + Clone + 'static,
    {
        Self::new(
            sqs_client,
            queue_url,
            FnMessageHandler::new(handler_fn, shared_resources),
            config,
        )
    }

    /// Creates a consumer on top of a custom [`QueueClient`] transport.
    ///
    /// This is the seam used by the crate's own tests to run the pipeline
    /// against an in-memory queue; it also allows binding the consumer to
    /// any other queue service that can satisfy the trait.
    pub fn with_queue_client(
        queue_client: Arc<dyn QueueClient>,
        queue_url: &str,
        handler: impl MessageHandler + 'static,
        config: SqsConsumerConfig,
    ) -> Self {
        let poll_delay_ms = Arc::new(AtomicU64::new(config.poll_delay.as_millis() as u64));

        SqsConsumer {
            queue_url: queue_url.to_string(),
            queue_client,
            handler: Arc::new(handler),
            config,
            poll_delay_ms,
        }
    }

    /// Adjusts the delay between queue polls without restarting the pipeline.
    ///
    /// Running receivers pick the new value up on their next iteration.
    pub fn set_poll_delay(&self, delay: Duration) {
        self.poll_delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Runs the pipeline until `shutdown` is cancelled, then drains it.
    ///
    /// Blocks the calling task for the lifetime of the consumer. After
    /// cancellation the receivers stop polling, every batch already received
    /// is still processed and has its delete attempted, and the call returns
    /// once all of that work has finished.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            queue_url = %self.queue_url,
            receivers = self.config.receivers,
            "starting to consume queue"
        );

        let (batch_tx, batch_rx) = mpsc::channel::<Vec<Message>>(1);
        let receive_options = ReceiveOptions {
            max_number_of_messages: self.config.max_number_of_messages,
            visibility_timeout_seconds: self.config.visibility_timeout_seconds,
            wait_time_seconds: self.config.wait_time_seconds,
        };

        let mut receivers = JoinSet::new();
        for id in 0..self.config.receivers.max(1) {
            let receiver = BatchReceiver::new(
                id,
                self.queue_url.clone(),
                Arc::clone(&self.queue_client),
                receive_options.clone(),
                self.config.idle_poll_delay,
                Arc::clone(&self.poll_delay_ms),
                batch_tx.clone(),
                shutdown.clone(),
            );
            receivers.spawn(receiver.run());
        }

        // The receiver tasks now hold the only senders: the channel closes
        // exactly once, when the last receiver returns.
        drop(batch_tx);

        let processor = Arc::new(BatchProcessor::new(
            self.queue_url.clone(),
            Arc::clone(&self.queue_client),
            Arc::clone(&self.handler),
            self.config.handler_timeout,
        ));

        Distributor::new(batch_rx, processor, self.config.max_inflight_batches)
            .run()
            .await;

        // The distributor only returns after the channel closed, so the
        // receivers have all finished; collect their results.
        while receivers.join_next().await.is_some() {}

        info!(queue_url = %self.queue_url, "consumer stopped");
    }

    /// Starts the pipeline in the background and returns immediately.
    ///
    /// The returned handle resolves once the pipeline has fully drained
    /// after `shutdown` is cancelled. Equivalent to spawning
    /// [`run`](SqsConsumer::run) on the current runtime.
    pub fn start(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let consumer = self.clone();
        tokio::spawn(async move { consumer.run(shutdown).await })
    }

    /// Runs the pipeline until the process receives a Ctrl-C (SIGINT), then
    /// drains it.
    pub async fn run_until_ctrl_c(&self) -> std::io::Result<()> {
        let shutdown = CancellationToken::new();
        let pipeline = self.start(shutdown.clone());

        tokio::signal::ctrl_c().await?;
        info!(queue_url = %self.queue_url, "Ctrl-C received; draining consumer");
        shutdown.cancel();

        let _ = pipeline.await;
        Ok(())
    }
}
