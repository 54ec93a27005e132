//! Work-item producer
//!
//! Feeds items into the work channel in input order. The producer owns the
//! only sender for the work channel, so its exit - whether input was
//! exhausted or shutdown was requested - is the single close that tells
//! the workers no more work will arrive.

use crate::model::WorkItem;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns the producer task
pub fn spawn_producer(
    items: Vec<WorkItem>,
    work_tx: mpsc::Sender<WorkItem>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for item in items {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Producer stopping early: shutdown requested");
                    return;
                }
                sent = work_tx.send(item) => {
                    if sent.is_err() {
                        tracing::warn!("Producer stopping: work channel closed by receiver");
                        return;
                    }
                }
            }
        }
        tracing::info!("Producer finished sending all items");
    })
}
