use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use aws_sdk_sqs::types::Message;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{QueueClient, ReceiveOptions};

/// Fixed delay before retrying after a failed receive call. Receive errors
/// are treated as transient; there is no backoff or error classification.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A single long-lived polling loop.
///
/// Several receivers run concurrently against the same queue, each publishing
/// its non-empty batches onto the shared channel. The awaited send on that
/// bounded channel is what keeps a receiver from polling further ahead than
/// the processing side can absorb.
pub(crate) struct BatchReceiver {
    id: usize,
    queue_url: String,
    queue_client: Arc<dyn QueueClient>,
    options: ReceiveOptions,
    idle_poll_delay: Option<Duration>,
    poll_delay_ms: Arc<AtomicU64>,
    batches: mpsc::Sender<Vec<Message>>,
    shutdown: CancellationToken,
}

impl BatchReceiver {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        queue_url: String,
        queue_client: Arc<dyn QueueClient>,
        options: ReceiveOptions,
        idle_poll_delay: Option<Duration>,
        poll_delay_ms: Arc<AtomicU64>,
        batches: mpsc::Sender<Vec<Message>>,
        shutdown: CancellationToken,
    ) -> Self {
        BatchReceiver {
            id,
            queue_url,
            queue_client,
            options,
            idle_poll_delay,
            poll_delay_ms,
            batches,
            shutdown,
        }
    }

    /// Polls the queue until shutdown is requested.
    ///
    /// Each iteration checks the shutdown token, receives up to the
    /// configured number of messages, publishes any non-empty batch and then
    /// applies the pacing delay. In-flight receive calls are never aborted;
    /// cancellation takes effect between iterations.
    pub(crate) async fn run(self) {
        debug!(receiver = self.id, queue_url = %self.queue_url, "receiver started");

        loop {
            if self.shutdown.is_cancelled() {
                info!(receiver = self.id, "shutting down message receiver");
                return;
            }

            let messages = match self
                .queue_client
                .receive_messages(&self.queue_url, &self.options)
                .await
            {
                Ok(messages) => messages,
                Err(err) => {
                    warn!(receiver = self.id, error = %err, "could not read from queue");
                    self.pause(RECEIVE_RETRY_DELAY).await;
                    continue;
                }
            };

            let received = messages.len();
            if received > 0 {
                debug!(receiver = self.id, count = received, "publishing batch");
                if self.batches.send(messages).await.is_err() {
                    // The consuming side is gone; nothing left to publish to.
                    return;
                }
            }

            self.pause(self.current_poll_delay(received == 0)).await;
        }
    }

    fn current_poll_delay(&self, idle: bool) -> Duration {
        if idle {
            if let Some(delay) = self.idle_poll_delay {
                return delay;
            }
        }
        Duration::from_millis(self.poll_delay_ms.load(Ordering::Relaxed))
    }

    /// Sleeps for `delay`, waking early when shutdown is requested.
    async fn pause(&self, delay: Duration) {
        tokio::select! {
            _ = sleep(delay) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}
