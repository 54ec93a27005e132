//! Concurrent harvest pipeline
//!
//! The pipeline is a bounded producer/worker/aggregator graph:
//!
//! ```text
//! producer -> work channel -> N workers -> result channel -> aggregator -> ledger
//! ```
//!
//! Items are offered in input order; completion order is whatever the
//! workers produce. A single [`CancellationToken`] is observed by the
//! producer, every worker, and the aggregator, so shutdown propagates
//! within one blocking operation at every stage. The coordinator waits for
//! all three stages to terminate before finalizing the ledger, which is
//! what makes the final snapshot consistent no matter how the run ended.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod aggregator;
mod coordinator;
mod pool;
mod producer;
mod worker;

pub use aggregator::spawn_aggregator;
pub use coordinator::{run_harvest, Coordinator};
pub use pool::WorkerPool;
pub use producer::spawn_producer;
pub use worker::Worker;

/// Error message attached to results abandoned because of shutdown
pub const CANCELED_MESSAGE: &str = "canceled";
