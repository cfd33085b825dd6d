use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Error types for AWS SQS consumer operations.
///
/// This enum represents all possible errors that can occur while receiving,
/// handling and deleting SQS messages. Every variant is recoverable from the
/// pipeline's point of view: faults are logged and the affected messages are
/// left in the queue for redelivery.
#[derive(Debug, Error)]
pub enum SqsConsumerError {
    /// Error returned by the queue when receiving a batch of messages.
    ///
    /// Treated as transient: the receiver logs it, waits a fixed delay and
    /// polls again.
    #[error("failed to receive messages from queue: {0}")]
    Receive(String),

    /// Error returned by the queue when deleting a batch of handled messages.
    ///
    /// The affected messages stay in the queue and become visible again once
    /// their visibility timeout expires.
    #[error("failed to delete messages from queue: {0}")]
    Delete(String),

    /// A message handler did not finish within the configured deadline.
    ///
    /// Counts as a handler failure for that message only.
    #[error("message handler timed out after {0:?}")]
    HandlerTimeout(Duration),

    #[error("{0}")]
    Handler(#[from] HandlerError),
}

/// Error type for failures raised by message handlers.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a new `HandlerError` with the provided message.
    pub fn new(message: String) -> Self {
        HandlerError(message)
    }
}

impl FromStr for HandlerError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HandlerError::new(s.to_string()))
    }
}

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        HandlerError::new(s)
    }
}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        HandlerError::new(s.to_string())
    }
}
