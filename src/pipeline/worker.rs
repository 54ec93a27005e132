//! Per-item processing with bounded retries
//!
//! A [`Worker`] converts one [`WorkItem`] into exactly one [`WorkResult`],
//! retrying failed fetch attempts up to the configured budget. Workers
//! touch no shared state: they are pure over their item apart from
//! fetching and sleeping.

use crate::config::PipelineConfig;
use crate::fetcher::PageFetcher;
use crate::model::{WorkItem, WorkResult};
use crate::pipeline::CANCELED_MESSAGE;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry-aware item processor shared by all worker loops
pub struct Worker {
    fetcher: Arc<dyn PageFetcher>,
    max_retries: u32,
    retry_delay: Duration,
}

impl Worker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &PipelineConfig) -> Self {
        Self {
            fetcher,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Processes a single work item, returning exactly one result
    ///
    /// Cancellation is checked before every attempt, not only at entry, so
    /// a long retry sequence cannot outlive a shutdown request; the delay
    /// between attempts also races against the token. An in-flight fetch
    /// is not aborted - it is bounded by the fetcher's own timeout.
    pub async fn process_item(&self, item: &WorkItem, cancel: &CancellationToken) -> WorkResult {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if cancel.is_cancelled() {
                return WorkResult::failure(item, CANCELED_MESSAGE, attempt);
            }

            if attempt > 0 {
                tracing::debug!(
                    "Retrying item {} (attempt {}/{})",
                    item.id,
                    attempt + 1,
                    self.max_retries
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return WorkResult::failure(item, CANCELED_MESSAGE, attempt);
                    }
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
            }

            match self.fetcher.fetch(&item.target).await {
                Ok(images) => {
                    tracing::debug!(
                        "Item {} succeeded on attempt {} with {} images",
                        item.id,
                        attempt + 1,
                        images.len()
                    );
                    return WorkResult::success(item, images, attempt + 1);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for item {}: {}",
                        attempt + 1,
                        self.max_retries,
                        item.id,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => WorkResult::failure(item, e.to_string(), self.max_retries),
            // Unreachable while max_retries >= 1 is enforced by validation
            None => WorkResult::failure(item, "failed after maximum retries", self.max_retries),
        }
    }
}
