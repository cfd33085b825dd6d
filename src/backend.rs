use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, Message, MessageSystemAttributeName};
use tracing::warn;

use crate::errors::SqsConsumerError;

/// Receive-side parameters forwarded to every poll of the queue.
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// The maximum number of messages to receive in a single request (at most 10).
    pub max_number_of_messages: i32,

    /// The visibility timeout applied to every received message, in seconds.
    pub visibility_timeout_seconds: i32,

    /// The wait time for long polling, in seconds. Zero disables long polling.
    pub wait_time_seconds: i32,
}

/// Transport used by the consumer pipeline to talk to a message queue.
///
/// The production implementation is [`SqsQueueClient`]; tests substitute an
/// in-memory queue through [`SqsConsumer::with_queue_client`].
///
/// [`SqsConsumer::with_queue_client`]: crate::consumer::SqsConsumer::with_queue_client
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receives up to `options.max_number_of_messages` messages from the queue.
    ///
    /// An empty result is a normal outcome when no messages are available,
    /// not an error.
    async fn receive_messages(
        &self,
        queue_url: &str,
        options: &ReceiveOptions,
    ) -> Result<Vec<Message>, SqsConsumerError>;

    /// Deletes a set of previously received messages by receipt handle.
    ///
    /// Best-effort: the queue may reject individual entries while accepting
    /// the rest of the batch.
    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteMessageBatchRequestEntry>,
    ) -> Result<(), SqsConsumerError>;
}

/// [`QueueClient`] implementation backed by the AWS SQS service.
pub struct SqsQueueClient {
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    pub fn new(sqs_client: aws_sdk_sqs::Client) -> Self {
        SqsQueueClient { sqs_client }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive_messages(
        &self,
        queue_url: &str,
        options: &ReceiveOptions,
    ) -> Result<Vec<Message>, SqsConsumerError> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(options.max_number_of_messages)
            .visibility_timeout(options.visibility_timeout_seconds)
            .wait_time_seconds(options.wait_time_seconds)
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .message_system_attribute_names(
                MessageSystemAttributeName::ApproximateFirstReceiveTimestamp,
            )
            .send()
            .await
            .map_err(|err| SqsConsumerError::Receive(DisplayErrorContext(&err).to_string()))?;

        Ok(result.messages.unwrap_or_default())
    }

    async fn delete_message_batch(
        &self,
        queue_url: &str,
        entries: Vec<DeleteMessageBatchRequestEntry>,
    ) -> Result<(), SqsConsumerError> {
        let result = self
            .sqs_client
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|err| SqsConsumerError::Delete(DisplayErrorContext(&err).to_string()))?;

        // Per-entry rejections are tolerated; the affected messages become
        // visible again once their visibility timeout expires.
        for failed in result.failed() {
            warn!(
                id = failed.id(),
                code = failed.code(),
                message = failed.message(),
                sender_fault = failed.sender_fault(),
                "queue rejected one entry of a batched delete"
            );
        }

        Ok(())
    }
}
