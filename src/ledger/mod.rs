//! Shared result/failure ledger
//!
//! The ledger is the only state mutated by more than one concurrent unit.
//! It owns two disjoint collections: an append-only sequence of successful
//! results (insertion order = completion order) and a map of failure
//! records keyed by id, with at most one record per id. All mutation and
//! the finalize snapshot go through one exclusive lock, so concurrent
//! recording can never corrupt either collection or interleave with a
//! snapshot write.

use crate::model::{FailureRecord, WorkResult};
use crate::HarvestError;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    successes: Vec<WorkResult>,
    failures: HashMap<String, FailureRecord>,
}

/// Thread-safe accumulator of successes and deduplicated failures
#[derive(Debug, Default)]
pub struct HarvestLedger {
    state: Mutex<LedgerState>,
}

/// Counts reported after a run for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl HarvestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful result in completion order
    pub fn record_success(&self, result: WorkResult) {
        let mut state = self.state.lock().unwrap();
        state.successes.push(result);
        tracing::debug!("Stored result; total successes: {}", state.successes.len());
    }

    /// Records a permanent failure for an item
    ///
    /// If a record for this id already exists its error and timestamp are
    /// overwritten and the attempt count grows by `attempts`; otherwise a
    /// new record is inserted. `attempts` is the number of fetch attempts
    /// consumed by this report and is clamped to at least 1.
    pub fn record_failure(&self, id: &str, url: &str, error: &str, attempts: u32) {
        let attempts = attempts.max(1);
        let mut state = self.state.lock().unwrap();

        state
            .failures
            .entry(id.to_string())
            .and_modify(|record| {
                record.error = error.to_string();
                record.timestamp = Utc::now();
                record.attempts += attempts;
            })
            .or_insert_with(|| FailureRecord {
                id: id.to_string(),
                url: url.to_string(),
                error: error.to_string(),
                timestamp: Utc::now(),
                attempts,
            });
    }

    /// Writes both snapshots as pretty-printed JSON, fully overwriting the
    /// target files
    ///
    /// Failure records are sorted by id so the output is deterministic.
    /// Expected to run once, after the pipeline has drained; the shared
    /// lock still makes it safe against stray concurrent record calls.
    pub fn finalize(&self, results_path: &Path, failures_path: &Path) -> Result<(), HarvestError> {
        let state = self.state.lock().unwrap();

        let mut failures: Vec<&FailureRecord> = state.failures.values().collect();
        failures.sort_by(|a, b| a.id.cmp(&b.id));

        write_json(failures_path, &failures)?;
        write_json(results_path, &state.successes)?;

        tracing::info!(
            "Final snapshot written: {} results, {} failed items",
            state.successes.len(),
            failures.len()
        );
        Ok(())
    }

    /// Returns success/failure counts
    pub fn summary(&self) -> LedgerSummary {
        let state = self.state.lock().unwrap();
        LedgerSummary {
            succeeded: state.successes.len(),
            failed: state.failures.len(),
        }
    }

    /// Returns copies of both collections, for inspection in tests
    pub fn snapshot(&self) -> (Vec<WorkResult>, Vec<FailureRecord>) {
        let state = self.state.lock().unwrap();
        let mut failures: Vec<FailureRecord> = state.failures.values().cloned().collect();
        failures.sort_by(|a, b| a.id.cmp(&b.id));
        (state.successes.clone(), failures)
    }
}

/// Serializes a value as pretty-printed JSON to a file, overwriting it
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), HarvestError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| HarvestError::SnapshotWrite {
        path: path.display().to_string(),
        source,
    })
}
