//! Comparables use case: fetch peer data, then value the target on their multiples.
//!
//! - Fetches each ticker sequentially through `MarketDataPort`, bounded by a timeout
//! - Unavailable tickers stay in the peer list without a multiple
//! - Falls back to the reference source when fewer than two peers are usable
//! - Hands an immutable snapshot of peers to the pure calculator

use crate::domain::{
    ComparableCompany, DomainError, ValuationInputs, ValuationResult, comparables,
};
use crate::ports::MarketDataPort;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Output of one comparables run.
#[derive(Debug, Clone, Serialize)]
pub struct ComparablesRun {
    /// Source the peers in `comparables` came from.
    pub source: &'static str,
    /// True when live data was insufficient and reference data was used.
    pub fell_back: bool,
    pub comparables: Vec<ComparableCompany>,
    pub valuation: ValuationResult,
}

pub struct ComparablesService {
    live: Arc<dyn MarketDataPort>,
    fallback: Option<Arc<dyn MarketDataPort>>,
    peers: Vec<(String, String)>,
    fetch_timeout: Duration,
}

impl ComparablesService {
    /// # Arguments
    /// * `live` - Primary market data source (usually cached Yahoo)
    /// * `fallback` - Source used when live data yields fewer than two usable peers
    /// * `peers` - (ticker, name) pairs to fetch
    /// * `fetch_timeout` - Upper bound for a single ticker fetch
    pub fn new(
        live: Arc<dyn MarketDataPort>,
        fallback: Option<Arc<dyn MarketDataPort>>,
        peers: Vec<(String, String)>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            live,
            fallback,
            peers,
            fetch_timeout,
        }
    }

    /// Drop cached market data on both sources. Returns the number of snapshots dropped.
    pub async fn refresh(&self) -> usize {
        let mut dropped = self.live.refresh().await;
        if let Some(fallback) = &self.fallback {
            dropped += fallback.refresh().await;
        }
        info!(dropped, "market data refreshed");
        dropped
    }

    /// Fetch every peer from `source`. Never fails; failed tickers come back unavailable.
    pub async fn fetch_comparables(&self, source: &dyn MarketDataPort) -> Vec<ComparableCompany> {
        let mut out = Vec::with_capacity(self.peers.len());
        for (ticker, name) in &self.peers {
            let call = source.fetch_snapshot(ticker);
            let fetched = match tokio::time::timeout(self.fetch_timeout, call).await {
                Ok(res) => res,
                Err(_) => Err(DomainError::ExternalFetchFailure(format!(
                    "{}: timed out after {} ms",
                    ticker,
                    self.fetch_timeout.as_millis()
                ))),
            };
            match fetched {
                Ok(snap) => out.push(ComparableCompany::from_snapshot(ticker, name, &snap)),
                Err(e) => {
                    warn!(
                        ticker = %ticker,
                        source = source.source_name(),
                        error = %e,
                        "comparable unavailable"
                    );
                    out.push(ComparableCompany::unavailable(ticker, name));
                }
            }
        }
        let usable = out.iter().filter(|c| c.valid_multiple().is_some()).count();
        info!(
            source = source.source_name(),
            peers = out.len(),
            usable,
            "fetched comparables"
        );
        out
    }

    /// Fetch peers and value the target. Degrades to the fallback source when needed.
    ///
    /// Returns `InsufficientComparables` only when neither source yields two usable peers.
    pub async fn value(
        &self,
        inputs: &ValuationInputs,
        apply_growth_premium: bool,
    ) -> Result<ComparablesRun, DomainError> {
        let live_peers = self.fetch_comparables(self.live.as_ref()).await;
        match comparables::calculate(inputs, &live_peers, apply_growth_premium) {
            Ok(valuation) => Ok(ComparablesRun {
                source: self.live.source_name(),
                fell_back: false,
                comparables: live_peers,
                valuation,
            }),
            Err(DomainError::InsufficientComparables { valid }) => {
                let Some(fallback) = &self.fallback else {
                    return Err(DomainError::InsufficientComparables { valid });
                };
                warn!(
                    usable = valid,
                    fallback = fallback.source_name(),
                    "live comparables insufficient; falling back"
                );
                let peers = self.fetch_comparables(fallback.as_ref()).await;
                let valuation = comparables::calculate(inputs, &peers, apply_growth_premium)?;
                Ok(ComparablesRun {
                    source: fallback.source_name(),
                    fell_back: true,
                    comparables: peers,
                    valuation,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::market_data::ReferenceMarketData;
    use crate::domain::MarketSnapshot;

    /// Source that is down for every ticker.
    struct DownSource;

    #[async_trait::async_trait]
    impl MarketDataPort for DownSource {
        async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError> {
            Err(DomainError::ExternalFetchFailure(format!("{}: unreachable", ticker)))
        }

        fn source_name(&self) -> &'static str {
            "down"
        }
    }

    /// Source that never answers.
    struct HangingSource;

    #[async_trait::async_trait]
    impl MarketDataPort for HangingSource {
        async fn fetch_snapshot(&self, _ticker: &str) -> Result<MarketSnapshot, DomainError> {
            std::future::pending().await
        }

        fn source_name(&self) -> &'static str {
            "hanging"
        }
    }

    fn peers() -> Vec<(String, String)> {
        crate::shared::config::DEFAULT_COMPARABLES
            .iter()
            .map(|(t, n)| (t.to_string(), n.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_live_source_used_when_sufficient() {
        let svc = ComparablesService::new(
            Arc::new(ReferenceMarketData::new()),
            Some(Arc::new(DownSource)),
            peers(),
            Duration::from_secs(1),
        );
        let run = svc.value(&ValuationInputs::default(), true).await.unwrap();
        assert!(!run.fell_back);
        assert_eq!(run.source, "reference");
        assert_eq!(run.comparables.len(), 6);
        assert!(run.valuation.implied_valuation > 0.0);
    }

    #[tokio::test]
    async fn test_falls_back_when_live_is_down() {
        let svc = ComparablesService::new(
            Arc::new(DownSource),
            Some(Arc::new(ReferenceMarketData::new())),
            peers(),
            Duration::from_secs(1),
        );
        let run = svc.value(&ValuationInputs::default(), true).await.unwrap();
        assert!(run.fell_back);
        assert_eq!(run.source, "reference");
        assert!(run.valuation.implied_valuation > 0.0);
    }

    #[tokio::test]
    async fn test_surfaces_insufficient_without_fallback() {
        let svc =
            ComparablesService::new(Arc::new(DownSource), None, peers(), Duration::from_secs(1));
        let err = svc.value(&ValuationInputs::default(), true).await.unwrap_err();
        assert_eq!(err, DomainError::InsufficientComparables { valid: 0 });
    }

    #[tokio::test]
    async fn test_refresh_reaches_cached_live_source() {
        use crate::adapters::market_data::CachedMarketData;
        let cached = Arc::new(CachedMarketData::new(
            Arc::new(ReferenceMarketData::new()),
            600,
        ));
        let svc = ComparablesService::new(
            cached,
            Some(Arc::new(DownSource)),
            peers(),
            Duration::from_secs(1),
        );
        svc.value(&ValuationInputs::default(), true).await.unwrap();
        assert_eq!(svc.refresh().await, 6);
        assert_eq!(svc.refresh().await, 0);
    }

    #[tokio::test]
    async fn test_hanging_source_times_out() {
        let svc = ComparablesService::new(
            Arc::new(HangingSource),
            None,
            peers(),
            Duration::from_millis(50),
        );
        let fetched = svc.fetch_comparables(&HangingSource).await;
        assert_eq!(fetched.len(), 6);
        assert!(fetched.iter().all(|c| c.ev_revenue_multiple.is_none()));
    }
}
