//! Result aggregation
//!
//! Drains the result channel until it closes or shutdown fires, routing
//! each result into the ledger: successes into the completion-ordered
//! sequence, failures into the deduplicated failure map, carrying the
//! originating target URL and the attempts consumed.

use crate::ledger::HarvestLedger;
use crate::model::WorkResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns the aggregator task
pub fn spawn_aggregator(
    mut result_rx: mpsc::Receiver<WorkResult>,
    ledger: Arc<HarvestLedger>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Aggregator stopping: shutdown requested");
                    return;
                }
                result = result_rx.recv() => result,
            };

            match result {
                Some(result) if result.success => {
                    tracing::debug!(
                        "Item {} succeeded with {} images",
                        result.id,
                        result.images.len()
                    );
                    ledger.record_success(result);
                }
                Some(result) => {
                    let error = result.error.as_deref().unwrap_or("unknown error");
                    tracing::warn!("Item {} failed permanently: {}", result.id, error);
                    ledger.record_failure(&result.id, &result.target, error, result.attempts);
                }
                None => {
                    tracing::info!("Aggregator stopping: result channel closed");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkItem;

    fn create_test_item(id: &str) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            target: format!("https://shop.example.com/p/{}", id),
        }
    }

    #[tokio::test]
    async fn test_routes_successes_and_failures() {
        let (result_tx, result_rx) = mpsc::channel(4);
        let ledger = Arc::new(HarvestLedger::new());
        let handle = spawn_aggregator(result_rx, Arc::clone(&ledger), CancellationToken::new());

        result_tx
            .send(WorkResult::success(&create_test_item("a"), vec![], 1))
            .await
            .unwrap();
        result_tx
            .send(WorkResult::failure(&create_test_item("b"), "boom", 3))
            .await
            .unwrap();
        drop(result_tx);
        handle.await.unwrap();

        let (successes, failures) = ledger.snapshot();
        assert_eq!(successes.len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "b");
        assert_eq!(failures[0].url, "https://shop.example.com/p/b");
        assert_eq!(failures[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_stops_on_cancellation() {
        let (result_tx, result_rx) = mpsc::channel::<WorkResult>(4);
        let cancel = CancellationToken::new();
        let handle = spawn_aggregator(result_rx, Arc::new(HarvestLedger::new()), cancel.clone());

        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("aggregator must stop on cancellation")
            .unwrap();
        drop(result_tx);
    }
}
