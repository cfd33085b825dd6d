use std::future::Future;

use async_trait::async_trait;
use aws_sdk_sqs::types::Message;

use crate::errors::SqsConsumerError;

/// Trait for implementing asynchronous message handlers.
///
/// A handler receives one message per call and reports success or failure.
/// The consumer invokes handlers concurrently, one call per message in a
/// batch, so implementations must be safe for concurrent invocation. SQS
/// delivers at least once; handlers must also tolerate duplicate deliveries.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes a single message.
    ///
    /// Returning `Ok` marks the message for deletion from the queue;
    /// returning an error leaves it in place for redelivery.
    async fn handle(&self, message: Message) -> Result<(), SqsConsumerError>;
}

/// [`MessageHandler`] built from a plain async function and a shared resource.
///
/// The shared resource is cloned into every handler call, so it is typically
/// a cheaply cloneable handle such as an `Arc`, a connection pool or a client.
///
/// # Type Parameters
///
/// * `F` - The message handler function type
/// * `TShared` - The type of shared resources passed to the handler
pub struct FnMessageHandler<F, TShared> {
    handler_fn: F,
    shared_resources: TShared,
}

impl<F, TShared> FnMessageHandler<F, TShared> {
    /// Creates a new handler from a function and the resources it shares
    /// across calls.
    pub fn new(handler_fn: F, shared_resources: TShared) -> Self {
        FnMessageHandler {
            handler_fn,
            shared_resources,
        }
    }
}

#[async_trait]
impl<F, Fut, TShared> MessageHandler for FnMessageHandler<F, TShared>
where
    F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SqsConsumerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    async fn handle(&self, message: Message) -> Result<(), SqsConsumerError> {
        (self.handler_fn)(message, self.shared_resources.clone()).await
    }
}
