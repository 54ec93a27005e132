//! Data exchanged between pipeline stages
//!
//! A [`WorkItem`] flows from the producer to exactly one worker; the worker
//! turns it into exactly one [`WorkResult`], which the aggregator routes
//! into the ledger. Permanently failed items end up as deduplicated
//! [`FailureRecord`]s keyed by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of input work: a product identifier paired with its page URL
///
/// Immutable once created. Items are produced in input order but may
/// complete in any order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,

    /// URL of the product page to harvest
    pub target: String,
}

/// Outcome of processing one work item
///
/// The originating target URL is carried through so failure records can be
/// written with the real URL rather than a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResult {
    pub id: String,

    pub target: String,

    /// Extracted image URLs, in page order; empty on failure
    #[serde(default)]
    pub images: Vec<String>,

    pub success: bool,

    /// Present iff `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Number of fetch attempts actually performed for this item
    pub attempts: u32,
}

impl WorkResult {
    /// Builds a successful result with the extracted images
    pub fn success(item: &WorkItem, images: Vec<String>, attempts: u32) -> Self {
        Self {
            id: item.id.clone(),
            target: item.target.clone(),
            images,
            success: true,
            error: None,
            attempts,
        }
    }

    /// Builds a failed result carrying the final error message
    pub fn failure(item: &WorkItem, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            id: item.id.clone(),
            target: item.target.clone(),
            images: Vec::new(),
            success: false,
            error: Some(error.into()),
            attempts,
        }
    }
}

/// Deduplicated record of a permanently failed item
///
/// The ledger keeps at most one record per id; repeated failures for the
/// same id overwrite the error and timestamp and add to `attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: String,

    pub url: String,

    pub error: String,

    pub timestamp: DateTime<Utc>,

    pub attempts: u32,
}
