//! Tsumugi: a concurrent product-page harvester
//!
//! This crate implements a batch extraction pipeline that reads product
//! work items from a tabular input file, fetches each target page through
//! an isolated HTTP session, extracts structured fields, and accumulates
//! results into durable JSON outputs while keeping per-item failures
//! isolated from the run as a whole.

pub mod config;
pub mod fetcher;
pub mod input;
pub mod ledger;
pub mod model;
pub mod pipeline;

use thiserror::Error;

/// Main error type for Tsumugi operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Failed to write snapshot {path}: {source}")]
    SnapshotWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Input-loading errors
///
/// All of these are fatal: a run never starts on a bad input file.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse input file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required columns (id and link) not found in input file")]
    MissingColumns,

    #[error("No valid work items found in input file")]
    NoValidItems,
}

/// Result type alias for Tsumugi operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use ledger::HarvestLedger;
pub use model::{FailureRecord, WorkItem, WorkResult};
pub use pipeline::{run_harvest, Coordinator};
