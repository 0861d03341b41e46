//! Session cache in front of a market data source.
//!
//! Successful snapshots are kept for a fixed TTL and refreshed on the next
//! request after expiry. Failures are never cached. Calculators only ever see
//! the snapshot list handed to them, so nothing here is mutated mid-calculation.

use crate::domain::{DomainError, MarketSnapshot};
use crate::ports::MarketDataPort;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: MarketSnapshot,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// TTL cache decorator implementing `MarketDataPort`.
pub struct CachedMarketData {
    inner: Arc<dyn MarketDataPort>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CachedMarketData {
    pub fn new(inner: Arc<dyn MarketDataPort>, ttl_secs: i64) -> Self {
        Self {
            inner,
            ttl: Duration::seconds(ttl_secs),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every entry; the next fetch per ticker goes to the source.
    /// Returns the number of unexpired entries that were dropped.
    pub async fn invalidate_all(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let live = entries.values().filter(|e| !e.is_expired(now)).count();
        entries.clear();
        live
    }
}

#[async_trait::async_trait]
impl MarketDataPort for CachedMarketData {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError> {
        let now = Utc::now();
        if let Some(entry) = self.entries.read().await.get(ticker) {
            if !entry.is_expired(now) {
                debug!(ticker, "market data cache hit");
                return Ok(entry.snapshot.clone());
            }
        }

        let snapshot = self.inner.fetch_snapshot(ticker).await?;
        self.entries.write().await.insert(
            ticker.to_string(),
            CacheEntry {
                snapshot: snapshot.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(snapshot)
    }

    fn source_name(&self) -> &'static str {
        self.inner.source_name()
    }

    async fn refresh(&self) -> usize {
        let dropped = self.invalidate_all().await;
        debug!(dropped, "market data cache invalidated");
        dropped + self.inner.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; fails for tickers starting with "BAD".
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataPort for CountingSource {
        async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker.starts_with("BAD") {
                return Err(DomainError::ExternalFetchFailure(ticker.to_string()));
            }
            Ok(MarketSnapshot {
                enterprise_value: 100.0,
                revenue_ttm: 25.0,
                market_cap: None,
                revenue_growth: Some(0.1),
            })
        }

        fn source_name(&self) -> &'static str {
            "counting"
        }
    }

    fn source() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let inner = source();
        let cache = CachedMarketData::new(inner.clone(), 600);
        let a = cache.fetch_snapshot("DOCS").await.unwrap();
        let b = cache.fetch_snapshot("DOCS").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.source_name(), "counting");
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refreshes() {
        let inner = source();
        let cache = CachedMarketData::new(inner.clone(), 0);
        cache.fetch_snapshot("DOCS").await.unwrap();
        cache.fetch_snapshot("DOCS").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let inner = source();
        let cache = CachedMarketData::new(inner.clone(), 600);
        assert!(cache.fetch_snapshot("BADX").await.is_err());
        assert!(cache.fetch_snapshot("BADX").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.invalidate_all().await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let inner = source();
        let cache = CachedMarketData::new(inner.clone(), 600);
        cache.fetch_snapshot("VEEV").await.unwrap();
        assert_eq!(cache.invalidate_all().await, 1);
        cache.fetch_snapshot("VEEV").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_through_port() {
        let inner = source();
        let cache: Arc<dyn MarketDataPort> = Arc::new(CachedMarketData::new(inner.clone(), 600));
        cache.fetch_snapshot("DOCS").await.unwrap();
        cache.fetch_snapshot("HIMS").await.unwrap();
        assert_eq!(cache.refresh().await, 2);
        cache.fetch_snapshot("DOCS").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }
}
