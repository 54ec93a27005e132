//! Fixed-size worker pool
//!
//! Runs exactly `worker_count` worker loops, fanning work out from a
//! shared bounded channel and results back into another. The pool's core
//! ordering guarantee: the result channel closes exactly once, only after
//! every worker loop has permanently stopped. Closing early would starve
//! the aggregator of in-flight results; never closing would deadlock the
//! coordinator's drain wait.

use crate::config::PipelineConfig;
use crate::fetcher::PageFetcher;
use crate::model::{WorkItem, WorkResult};
use crate::pipeline::Worker;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the fixed set of worker loops for one run
pub struct WorkerPool {
    config: PipelineConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl WorkerPool {
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Spawns the worker loops and the pool manager
    ///
    /// The returned handle resolves only after every worker has stopped
    /// and the result channel has been closed by dropping the last sender.
    pub fn spawn(
        &self,
        work_rx: mpsc::Receiver<WorkItem>,
        result_tx: mpsc::Sender<WorkResult>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let worker = Arc::new(Worker::new(Arc::clone(&self.fetcher), &self.config));
        let shared_rx = Arc::new(Mutex::new(work_rx));
        let worker_count = self.config.worker_count;

        tokio::spawn(async move {
            tracing::info!("Starting {} workers", worker_count);

            let mut handles = Vec::with_capacity(worker_count);
            for worker_id in 0..worker_count {
                handles.push(tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&worker),
                    Arc::clone(&shared_rx),
                    result_tx.clone(),
                    cancel.clone(),
                )));
            }

            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!("Worker task panicked: {}", e);
                }
            }

            // The workers' sender clones are gone; dropping the original
            // here is the single close of the result channel, strictly
            // after every worker has stopped.
            drop(result_tx);
            tracing::info!("All workers finished, result channel closed");
        })
    }
}

/// One worker loop: pull items until the source closes or shutdown fires
async fn worker_loop(
    worker_id: usize,
    worker: Arc<Worker>,
    work_rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    result_tx: mpsc::Sender<WorkResult>,
    cancel: CancellationToken,
) {
    tracing::debug!("Worker {} started", worker_id);

    loop {
        // The lock is held only while waiting for one item, so idle
        // workers queue up on it rather than on the channel itself
        let item = {
            let mut rx = work_rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Worker {} stopping: shutdown requested", worker_id);
                    None
                }
                item = rx.recv() => {
                    if item.is_none() {
                        tracing::debug!("Worker {} stopping: work channel closed", worker_id);
                    }
                    item
                }
            }
        };

        let Some(item) = item else { break };

        let result = worker.process_item(&item, &cancel).await;
        let result_id = result.id.clone();

        // A worker must never block forever publishing after shutdown
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(
                    "Worker {} dropping result for {} after shutdown",
                    worker_id,
                    result_id
                );
                break;
            }
            sent = result_tx.send(result) => {
                if sent.is_err() {
                    tracing::debug!("Worker {} stopping: result channel closed", worker_id);
                    break;
                }
            }
        }
    }

    tracing::debug!("Worker {} stopped", worker_id);
}
