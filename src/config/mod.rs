//! Configuration module for Tsumugi
//!
//! Configuration is sourced from environment variables (optionally seeded
//! from a `.env` file), with a default for every value. The pipeline core
//! only ever sees already-validated values.
//!
//! # Example
//!
//! ```no_run
//! use tsumugi::config::load_config;
//!
//! let config = load_config().unwrap();
//! println!("Harvest will use {} workers", config.pipeline.worker_count);
//! ```

mod env;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, OutputConfig, PipelineConfig};

// Re-export loader functions
pub use env::load_config;
pub use validation::validate;
