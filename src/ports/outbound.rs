//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, MarketSnapshot};

/// Market data source. One call per comparable ticker.
#[async_trait::async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch enterprise value and trailing revenue (plus market cap and growth when known).
    ///
    /// Returns `DomainError::ExternalFetchFailure` when the ticker is unavailable,
    /// the source is unreachable or the request times out.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError>;

    /// Short name for logs and the UI ("yahoo", "reference", ...).
    fn source_name(&self) -> &'static str;

    /// Forget anything held between fetches so the next call goes to the source.
    /// Returns how many cached snapshots were dropped. Uncached sources hold nothing.
    async fn refresh(&self) -> usize {
        0
    }
}
