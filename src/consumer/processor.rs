use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, Message};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::backend::QueueClient;
use crate::errors::SqsConsumerError;
use crate::handler::MessageHandler;

/// Processes one batch at a time: handler fan-out, then a single batched
/// delete of the messages that were handled successfully.
pub(crate) struct BatchProcessor {
    queue_url: String,
    queue_client: Arc<dyn QueueClient>,
    handler: Arc<dyn MessageHandler>,
    handler_timeout: Option<Duration>,
}

impl BatchProcessor {
    pub(crate) fn new(
        queue_url: String,
        queue_client: Arc<dyn QueueClient>,
        handler: Arc<dyn MessageHandler>,
        handler_timeout: Option<Duration>,
    ) -> Self {
        BatchProcessor {
            queue_url,
            queue_client,
            handler,
            handler_timeout,
        }
    }

    /// Runs the handler concurrently over every message in the batch, waits
    /// for all of them, and deletes the handled messages in one batched
    /// call.
    ///
    /// A failed handler call only excludes its own message from the delete
    /// set. Messages left undeleted become visible again after their
    /// visibility timeout and are redelivered.
    pub(crate) async fn process_batch(&self, batch: Vec<Message>) {
        let handler_calls: Vec<JoinHandle<Option<String>>> = batch
            .into_iter()
            .map(|message| self.spawn_handler_call(message))
            .collect();

        let mut entries = Vec::with_capacity(handler_calls.len());
        for joined in join_all(handler_calls).await {
            let receipt_handle = match joined {
                Ok(Some(receipt_handle)) => receipt_handle,
                Ok(None) => continue,
                Err(err) => {
                    error!(error = %err, "message handler task failed");
                    continue;
                }
            };

            // Each entry carries a fresh unique id, so resubmitting the same
            // delete batch is harmless.
            match DeleteMessageBatchRequestEntry::builder()
                .id(Uuid::new_v4().to_string())
                .receipt_handle(receipt_handle)
                .build()
            {
                Ok(entry) => entries.push(entry),
                Err(err) => error!(error = %err, "could not build delete entry"),
            }
        }

        if entries.is_empty() {
            return;
        }

        debug!(count = entries.len(), "deleting handled messages");
        if let Err(err) = self
            .queue_client
            .delete_message_batch(&self.queue_url, entries)
            .await
        {
            // Not retried: the messages stay in the queue and are
            // redelivered once their visibility timeout expires.
            error!(error = %err, "failed while trying to delete messages");
        }
    }

    /// Invokes the handler for one message on its own task.
    ///
    /// Resolves to the message's receipt handle when the handler succeeds,
    /// `None` when it fails or exceeds the configured deadline.
    fn spawn_handler_call(&self, message: Message) -> JoinHandle<Option<String>> {
        let handler = Arc::clone(&self.handler);
        let handler_timeout = self.handler_timeout;

        tokio::spawn(async move {
            let message_id = message.message_id().map(str::to_owned);
            let receipt_handle = message.receipt_handle().map(str::to_owned);

            let outcome = match handler_timeout {
                Some(limit) => match tokio::time::timeout(limit, handler.handle(message)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(SqsConsumerError::HandlerTimeout(limit)),
                },
                None => handler.handle(message).await,
            };

            match outcome {
                Ok(()) => {
                    if receipt_handle.is_none() {
                        warn!(
                            message_id = message_id.as_deref(),
                            "handled message carries no receipt handle; skipping delete"
                        );
                    }
                    receipt_handle
                }
                Err(err) => {
                    warn!(
                        message_id = message_id.as_deref(),
                        error = %err,
                        "error while handling message"
                    );
                    None
                }
            }
        })
    }
}
