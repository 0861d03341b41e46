//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; valuation is delegated to ValuationService.

use dotenv::dotenv;
use healthval::adapters::export::CsvExporter;
use healthval::adapters::market_data::{CachedMarketData, ReferenceMarketData, YahooMarketData};
use healthval::adapters::ui::batch::BatchInputPort;
use healthval::adapters::ui::tui::TuiInputPort;
use healthval::ports::{InputPort, MarketDataPort};
use healthval::shared::config::AppConfig;
use healthval::usecases::{ComparablesService, ValuationService};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    // stderr keeps stdout clean for batch JSON responses.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });

    // --- Market data: live source behind a TTL cache, reference multiples as fallback ---
    let reference: Arc<dyn MarketDataPort> = Arc::new(ReferenceMarketData::new());
    let fetch_timeout = Duration::from_millis(cfg.fetch_timeout_ms_or_default());
    let (live, fallback): (Arc<dyn MarketDataPort>, Option<Arc<dyn MarketDataPort>>) =
        if cfg.is_offline() {
            info!("offline mode: using reference multiples only");
            (Arc::clone(&reference), None)
        } else {
            let url = cfg.market_data_url_or_default();
            let yahoo =
                YahooMarketData::new(url.clone(), cfg.cookie_url_or_default(), fetch_timeout)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
            let ttl = cfg.cache_ttl_secs_or_default();
            info!(url = %url, cache_ttl_secs = ttl, "live market data enabled");
            (
                Arc::new(CachedMarketData::new(Arc::new(yahoo), ttl)),
                Some(reference),
            )
        };

    // --- Services ---
    let peers = cfg.comparables();
    info!(peers = peers.len(), "comparable peer set loaded");
    let comparables = Arc::new(ComparablesService::new(
        live,
        fallback,
        peers,
        fetch_timeout,
    ));
    let service = Arc::new(ValuationService::new(comparables));

    // --- Run: interactive menu on a terminal, JSON request/response otherwise ---
    let input_port: Arc<dyn InputPort> = if std::io::stdin().is_terminal() {
        healthval::adapters::ui::init_ui();
        let exporter = CsvExporter::new(cfg.reports_dir_or_default());
        Arc::new(TuiInputPort::new(Arc::clone(&service), exporter))
    } else {
        Arc::new(BatchInputPort::new(Arc::clone(&service)))
    };

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
