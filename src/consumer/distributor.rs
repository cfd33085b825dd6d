use std::sync::Arc;

use aws_sdk_sqs::types::Message;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::error;

use super::processor::BatchProcessor;

/// Reads batches off the shared channel and starts one processor task per
/// batch.
///
/// The number of in-flight processor tasks is capped by a semaphore; when
/// every permit is taken the distributor stops reading the channel, which in
/// turn blocks the receivers on publish.
pub(crate) struct Distributor {
    batches: mpsc::Receiver<Vec<Message>>,
    processor: Arc<BatchProcessor>,
    limiter: Arc<Semaphore>,
}

impl Distributor {
    pub(crate) fn new(
        batches: mpsc::Receiver<Vec<Message>>,
        processor: Arc<BatchProcessor>,
        max_inflight_batches: usize,
    ) -> Self {
        Distributor {
            batches,
            processor,
            limiter: Arc::new(Semaphore::new(max_inflight_batches.max(1))),
        }
    }

    /// Dispatches batches until the channel is closed and drained, then
    /// waits for every processor task that is still running.
    ///
    /// The channel only closes once all receivers have dropped their
    /// senders, so returning from here means the whole pipeline is done.
    pub(crate) async fn run(mut self) {
        let mut tasks = JoinSet::new();

        while let Some(batch) = self.batches.recv().await {
            // Reap tasks that already finished so the set does not grow
            // beyond the permit count.
            while let Some(finished) = tasks.try_join_next() {
                log_join_result(finished);
            }

            // The limiter is never closed, so acquisition only fails if the
            // semaphore is dropped, which cannot outlive this loop.
            let Ok(permit) = Arc::clone(&self.limiter).acquire_owned().await else {
                break;
            };

            let processor = Arc::clone(&self.processor);
            tasks.spawn(async move {
                processor.process_batch(batch).await;
                drop(permit);
            });
        }

        while let Some(finished) = tasks.join_next().await {
            log_join_result(finished);
        }
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "batch processor task failed");
    }
}
