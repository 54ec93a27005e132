//! Pipeline coordinator - wires one full harvest run
//!
//! The coordinator connects producer, worker pool, and aggregator over two
//! bounded channels, waits for all three stages to fully terminate, then
//! cleans up the fetcher and finalizes the ledger. A run completes when
//! input is exhausted and every dispatched item produced exactly one
//! result, or when cancellation fired - in which case items that were
//! never started are absent from both outputs, by design.

use crate::config::Config;
use crate::fetcher::{HttpPageFetcher, PageFetcher};
use crate::input::load_work_items;
use crate::ledger::{HarvestLedger, LedgerSummary};
use crate::model::WorkItem;
use crate::pipeline::{spawn_aggregator, spawn_producer, WorkerPool};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Orchestrates one harvest run
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    ledger: Arc<HarvestLedger>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator with the given fetcher and cancellation token
    pub fn new(config: Config, fetcher: Arc<dyn PageFetcher>, cancel: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            ledger: Arc::new(HarvestLedger::new()),
            cancel,
        }
    }

    /// Shared handle to the run's ledger
    pub fn ledger(&self) -> Arc<HarvestLedger> {
        Arc::clone(&self.ledger)
    }

    /// Runs the pipeline to completion over the given items
    ///
    /// Returns the ledger summary for the run. A snapshot-write failure is
    /// logged rather than propagated: it does not undo the processing that
    /// already happened.
    pub async fn run(&self, items: Vec<WorkItem>) -> Result<LedgerSummary, HarvestError> {
        let total = items.len();
        let start = std::time::Instant::now();
        tracing::info!(
            "Starting harvest: {} items, {} workers, {} retries per item",
            total,
            self.config.pipeline.worker_count,
            self.config.pipeline.max_retries
        );

        let (work_tx, work_rx) = mpsc::channel(self.config.pipeline.buffer_size);
        let (result_tx, result_rx) = mpsc::channel(self.config.pipeline.buffer_size);

        let producer = spawn_producer(items, work_tx, self.cancel.clone());
        let pool = WorkerPool::new(self.config.pipeline.clone(), Arc::clone(&self.fetcher));
        let workers = pool.spawn(work_rx, result_tx, self.cancel.clone());
        let aggregator = spawn_aggregator(result_rx, Arc::clone(&self.ledger), self.cancel.clone());

        // Drain order matters only for the final snapshot: all three must
        // be down before cleanup and finalize
        producer.await?;
        workers.await?;
        aggregator.await?;

        self.fetcher.cleanup().await;

        let summary = self.ledger.summary();
        tracing::info!(
            "Pipeline drained in {:?}: {} succeeded, {} failed, of {} items",
            start.elapsed(),
            summary.succeeded,
            summary.failed,
            total
        );

        if let Err(e) = self.ledger.finalize(
            Path::new(&self.config.output.results_file),
            Path::new(&self.config.output.failures_file),
        ) {
            tracing::error!("Failed to write final snapshot: {}", e);
        }

        Ok(summary)
    }
}

/// Runs a full harvest from configuration
///
/// Loads the work items (fatal on input errors - the pipeline never
/// starts), builds the production fetcher, and runs the coordinator.
///
/// # Example
///
/// ```no_run
/// use tsumugi::config::load_config;
/// use tsumugi::pipeline::run_harvest;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config()?;
/// let summary = run_harvest(config, CancellationToken::new()).await?;
/// println!("{} items succeeded", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    cancel: CancellationToken,
) -> Result<LedgerSummary, HarvestError> {
    let items = load_work_items(Path::new(&config.input_file))?;
    tracing::info!("Loaded {} work items from {}", items.len(), config.input_file);

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(config.fetcher.clone()));
    let coordinator = Coordinator::new(config, fetcher, cancel);
    coordinator.run(items).await
}
