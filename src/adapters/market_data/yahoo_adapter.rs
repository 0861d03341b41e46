//! Yahoo Finance quote-summary adapter.
//!
//! Implements `MarketDataPort` with one HTTP request per ticker. Quote-summary
//! requires a session cookie plus a matching crumb; both are obtained on first
//! use and the crumb is kept until the API rejects it or `refresh` drops it.
//! Every request is bounded by the client timeout; any failure surfaces as
//! `DomainError::ExternalFetchFailure` so the caller can degrade.

use crate::domain::{DomainError, MarketSnapshot};
use crate::ports::MarketDataPort;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Quote-summary modules holding EV, revenue, growth and market cap.
const MODULES: &str = "financialData,defaultKeyStatistics,price";

/// Raw figures are in currency units; the domain works in millions.
const MILLION: f64 = 1e6;

pub struct YahooMarketData {
    client: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooMarketData {
    /// Create a new adapter.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://query1.finance.yahoo.com")
    /// * `cookie_url` - Page whose response sets the session cookie (e.g., "https://fc.yahoo.com")
    /// * `timeout` - Upper bound for each request, connect included
    pub fn new(
        base_url: String,
        cookie_url: String,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(concat!("healthval/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::ExternalFetchFailure(format!("HTTP client init: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url,
            crumb: Mutex::new(None),
        })
    }

    fn crumb_url(&self) -> String {
        format!("{}/v1/test/getcrumb", self.base_url)
    }

    fn quote_url(&self, ticker: &str, crumb: &str) -> Result<Url, DomainError> {
        Url::parse_with_params(
            &format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker),
            &[("modules", MODULES), ("crumb", crumb)],
        )
        .map_err(|e| DomainError::ExternalFetchFailure(format!("{}: bad URL: {}", ticker, e)))
    }

    /// The crumb endpoint answers with the bare token; anything else is an error page.
    fn parse_crumb(body: &str) -> Result<String, DomainError> {
        let crumb = body.trim();
        if crumb.is_empty()
            || crumb.len() > 64
            || crumb.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '{' | '"'))
        {
            return Err(DomainError::ExternalFetchFailure(format!(
                "unexpected crumb response: {}",
                crumb.chars().take(80).collect::<String>()
            )));
        }
        Ok(crumb.to_string())
    }

    async fn fetch_crumb(&self) -> Result<String, DomainError> {
        // Only the Set-Cookie header matters here; the page itself is usually a 404.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            debug!(url = %self.cookie_url, error = %e, "cookie request failed");
        }

        let response = self
            .client
            .get(self.crumb_url())
            .send()
            .await
            .map_err(|e| DomainError::ExternalFetchFailure(format!("crumb request: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::ExternalFetchFailure(format!("crumb body: {}", e)))?;
        if !status.is_success() {
            return Err(DomainError::ExternalFetchFailure(format!(
                "crumb request returned {}",
                status
            )));
        }
        let crumb = Self::parse_crumb(&body)?;
        info!("market data session established");
        Ok(crumb)
    }

    /// Cached crumb, fetched on first use.
    async fn crumb(&self) -> Result<String, DomainError> {
        let mut slot = self.crumb.lock().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }
        let crumb = self.fetch_crumb().await?;
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    async fn request_quote(
        &self,
        ticker: &str,
        crumb: &str,
    ) -> Result<reqwest::Response, DomainError> {
        let url = self.quote_url(ticker, crumb)?;
        debug!(ticker, "fetching quote summary");
        self.client.get(url).send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "request failed" };
            DomainError::ExternalFetchFailure(format!("{}: {}: {}", ticker, reason, e))
        })
    }

    /// Parse a quote-summary body into a snapshot (millions).
    fn parse_quote_summary(ticker: &str, body: &str) -> Result<MarketSnapshot, DomainError> {
        let parsed: QuoteSummaryEnvelope = serde_json::from_str(body).map_err(|e| {
            DomainError::ExternalFetchFailure(format!("{}: malformed response: {}", ticker, e))
        })?;

        if let Some(err) = parsed.quote_summary.error {
            return Err(DomainError::ExternalFetchFailure(format!(
                "{}: {}",
                ticker,
                err.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        let module = parsed
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| {
                DomainError::ExternalFetchFailure(format!("{}: empty result", ticker))
            })?;

        let financial = module.financial_data.unwrap_or_default();
        let stats = module.default_key_statistics.unwrap_or_default();
        let price = module.price.unwrap_or_default();

        let enterprise_value = raw(&stats.enterprise_value).ok_or_else(|| {
            DomainError::ExternalFetchFailure(format!("{}: enterprise value unavailable", ticker))
        })?;
        let revenue = raw(&financial.total_revenue).ok_or_else(|| {
            DomainError::ExternalFetchFailure(format!("{}: revenue unavailable", ticker))
        })?;

        Ok(MarketSnapshot {
            enterprise_value: enterprise_value / MILLION,
            revenue_ttm: revenue / MILLION,
            market_cap: raw(&price.market_cap).map(|v| v / MILLION),
            revenue_growth: raw(&financial.revenue_growth),
        })
    }
}

/// `{"raw": 123.0, "fmt": "123"}` -> 123.0. Empty objects (`{}`) count as missing.
fn raw(field: &Option<RawValue>) -> Option<f64> {
    field.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[derive(Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteModules>>,
    error: Option<QuoteError>,
}

#[derive(Deserialize)]
struct QuoteError {
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteModules {
    financial_data: Option<FinancialData>,
    default_key_statistics: Option<KeyStatistics>,
    price: Option<PriceModule>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    total_revenue: Option<RawValue>,
    revenue_growth: Option<RawValue>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    enterprise_value: Option<RawValue>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    market_cap: Option<RawValue>,
}

#[derive(Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[async_trait::async_trait]
impl MarketDataPort for YahooMarketData {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DomainError> {
        let crumb = self.crumb().await?;
        let mut response = self.request_quote(ticker, &crumb).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!(ticker, status = %response.status(), "crumb rejected, renewing session");
            self.crumb.lock().await.take();
            let crumb = self.crumb().await?;
            response = self.request_quote(ticker, &crumb).await?;
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(ticker, status = %status, "market data API returned error");
            return Err(DomainError::ExternalFetchFailure(format!(
                "{}: API error {}: {}",
                ticker,
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await.map_err(|e| {
            DomainError::ExternalFetchFailure(format!("{}: failed to read body: {}", ticker, e))
        })?;

        Self::parse_quote_summary(ticker, &body)
    }

    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn refresh(&self) -> usize {
        self.crumb.lock().await.take();
        0
    }
}
