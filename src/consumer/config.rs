use std::time::Duration;

/// Configuration for the AWS SQS consumer.
///
/// This struct defines the parameters for receiving and processing messages
/// from an SQS queue. Every field is fixed for the lifetime of a run except
/// the poll delay, which can be adjusted live through
/// [`SqsConsumer::set_poll_delay`](crate::consumer::SqsConsumer::set_poll_delay).
#[derive(Debug, Clone)]
pub struct SqsConsumerConfig {
    /// The maximum number of messages to receive in a single request.
    /// SQS caps this at 10 per call.
    pub max_number_of_messages: i32,

    /// The visibility timeout requested for every received message, in
    /// seconds. Messages not deleted within this window become visible to
    /// other receivers again.
    pub visibility_timeout_seconds: i32,

    /// The wait time for long polling, in seconds. Zero issues short polls.
    pub wait_time_seconds: i32,

    /// The number of receiver tasks polling the queue in parallel.
    pub receivers: usize,

    /// The pacing delay applied between polls of the queue.
    pub poll_delay: Duration,

    /// Optional distinct pacing delay applied after a poll that returned no
    /// messages. `None` applies `poll_delay` uniformly.
    pub idle_poll_delay: Option<Duration>,

    /// The maximum number of batches processed concurrently. Once this many
    /// batches are in flight the pipeline backpressures into the receivers.
    pub max_inflight_batches: usize,

    /// Optional deadline for a single handler invocation. A handler call
    /// that exceeds it counts as failed for that message, leaving the
    /// message in the queue for redelivery.
    pub handler_timeout: Option<Duration>,
}

impl Default for SqsConsumerConfig {
    fn default() -> Self {
        SqsConsumerConfig {
            max_number_of_messages: 10,
            visibility_timeout_seconds: 30,
            wait_time_seconds: 0,
            receivers: 1,
            poll_delay: Duration::from_millis(250),
            idle_poll_delay: None,
            max_inflight_batches: 16,
            handler_timeout: None,
        }
    }
}
