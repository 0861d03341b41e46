//! Application configuration. Market data source, timeouts, paths.

use serde::Deserialize;

/// Public healthcare technology peers: ticker, company name.
pub const DEFAULT_COMPARABLES: &[(&str, &str)] = &[
    ("TDOC", "Teladoc Health"),
    ("DOCS", "Doximity"),
    ("VEEV", "Veeva Systems"),
    ("HIMS", "Hims & Hers"),
    ("AMWL", "Amwell"),
    ("OSCR", "Oscar Health"),
];

/// Default per-request timeout for market data calls.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Default lifetime of cached market data (15 minutes).
pub const DEFAULT_CACHE_TTL_SECS: i64 = 900;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Market data API root. Read from HEALTHVAL_MARKET_DATA_URL.
    #[serde(default)]
    pub market_data_url: Option<String>,

    /// Page that sets the market data session cookie. Read from HEALTHVAL_COOKIE_URL.
    #[serde(default)]
    pub cookie_url: Option<String>,

    /// Timeout in ms for each market data request. Read from HEALTHVAL_FETCH_TIMEOUT_MS.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    /// Seconds a fetched snapshot stays valid. Read from HEALTHVAL_CACHE_TTL_SECS.
    #[serde(default)]
    pub cache_ttl_secs: Option<i64>,

    /// Directory for CSV exports. Read from HEALTHVAL_REPORTS_DIR.
    #[serde(default)]
    pub reports_dir: Option<String>,

    /// Comma-separated tickers replacing the default peer set. Read from HEALTHVAL_TICKERS.
    #[serde(default)]
    pub tickers: Option<String>,

    /// Skip live market data and use the reference multiples. Read from HEALTHVAL_OFFLINE.
    #[serde(default)]
    pub offline: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("HEALTHVAL").try_parsing(true));
        if let Ok(path) = std::env::var("HEALTHVAL_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn market_data_url_or_default(&self) -> String {
        self.market_data_url
            .clone()
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string())
    }

    pub fn cookie_url_or_default(&self) -> String {
        self.cookie_url
            .clone()
            .unwrap_or_else(|| "https://fc.yahoo.com".to_string())
    }

    pub fn fetch_timeout_ms_or_default(&self) -> u64 {
        self.fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS)
    }

    /// Negative values are treated as zero (no caching).
    pub fn cache_ttl_secs_or_default(&self) -> i64 {
        self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS).max(0)
    }

    pub fn reports_dir_or_default(&self) -> String {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| "./reports".to_string())
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    /// Peer set: HEALTHVAL_TICKERS when set (name = ticker unless it is a default peer),
    /// otherwise [`DEFAULT_COMPARABLES`].
    pub fn comparables(&self) -> Vec<(String, String)> {
        let custom: Vec<String> = self
            .tickers
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        if custom.is_empty() {
            return DEFAULT_COMPARABLES
                .iter()
                .map(|(t, n)| (t.to_string(), n.to_string()))
                .collect();
        }

        custom
            .into_iter()
            .map(|ticker| {
                let name = DEFAULT_COMPARABLES
                    .iter()
                    .find(|(t, _)| *t == ticker)
                    .map(|(_, n)| n.to_string())
                    .unwrap_or_else(|| ticker.clone());
                (ticker, name)
            })
            .collect()
    }
}
