//! Domain errors. Returned by calculators, ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DomainError {
    /// A numeric input violates a formula invariant (e.g. discount rate <= terminal growth).
    #[error("Invalid assumption: {0}")]
    InvalidAssumption(String),

    /// Fewer than two peers carry a usable EV/Revenue multiple.
    #[error("Insufficient comparables: {valid} usable peer(s), at least 2 required")]
    InsufficientComparables { valid: usize },

    /// Market-data source unreachable, timed out or returned garbage.
    #[error("Market data fetch failed: {0}")]
    ExternalFetchFailure(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidAssumption(msg.into())
    }
}
