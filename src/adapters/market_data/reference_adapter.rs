//! Built-in reference multiples for offline use and as the degrade path.
//!
//! Returns fixed snapshots for the default comparable set without network
//! access. Figures are in millions and are only indicative.

use crate::domain::{DomainError, MarketSnapshot};
use crate::ports::MarketDataPort;
use std::collections::HashMap;
use tracing::debug;

/// ticker, enterprise value, TTM revenue, market cap, revenue growth.
const REFERENCE_SNAPSHOTS: &[(&str, f64, f64, f64, f64)] = &[
    ("TDOC", 1_900.0, 2_600.0, 1_500.0, -0.01),
    ("DOCS", 8_900.0, 520.0, 9_600.0, 0.15),
    ("VEEV", 31_000.0, 2_600.0, 35_000.0, 0.13),
    ("HIMS", 5_600.0, 1_300.0, 5_900.0, 0.65),
    ("AMWL", 40.0, 260.0, 150.0, -0.04),
    ("OSCR", 2_200.0, 8_000.0, 3_800.0, 0.55),
];

/// Static market data. Unknown tickers are reported as unavailable.
pub struct ReferenceMarketData {
    snapshots: HashMap<String, MarketSnapshot>,
}

impl ReferenceMarketData {
    pub fn new() -> Self {
        let snapshots = REFERENCE_SNAPSHOTS
            .iter()
            .map(|&(ticker, ev, revenue, cap, growth)| {
                (
                    ticker.to_string(),
                    MarketSnapshot {
                        enterprise_value: ev,
                        revenue_ttm: revenue,
                        market_cap: Some(cap),
                        revenue_growth: Some(growth),
                    },
                )
            })
            .collect();
        Self { snapshots }
    }
}

impl Default for ReferenceMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketDataPort for ReferenceMarketData {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError> {
        debug!(ticker, "serving reference snapshot");
        self.snapshots.get(ticker).cloned().ok_or_else(|| {
            DomainError::ExternalFetchFailure(format!("{}: no reference data", ticker))
        })
    }

    fn source_name(&self) -> &'static str {
        "reference"
    }
}
