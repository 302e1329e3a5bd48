//! KHAZNA — CBE T-Bill auction yield tracker and return calculator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the yield store, wires the chosen page fetcher into the
//! orchestrator, and serves the dashboard until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use khazna::config;
use khazna::dashboard::routes::AppContext;
use khazna::engine::FetchOrchestrator;
use khazna::fetch::browser::BrowserFetcher;
use khazna::fetch::http::HttpFetcher;
use khazna::fetch::PageFetcher;
use khazna::store::Repository;

const BANNER: &str = r#"
 _  ___   _   _    _______   _   _
| |/ / | | | / \  |__  / \ | | / \
| ' /| |_| |/ _ \   / /|  \| |/ _ \
| . \|  _  / ___ \ / /_| |\  / ___ \
|_|\_\_| |_/_/   \_\____|_| \_/_/   \_\

  CBE T-Bill Auction Yield Tracker
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        url = %cfg.source.url,
        strategy = %cfg.source.strategy,
        cache_ttl_secs = cfg.cache.ttl_secs,
        database = %cfg.storage.database_path,
        "KHAZNA starting up"
    );

    // -- Open the yield store --------------------------------------------

    let repo = Repository::connect(&cfg.storage.database_path).await?;
    let startup = repo.read_latest().await?;
    info!(
        auction_date = %startup.auction_date,
        tenors = startup.quotes.len(),
        "Loaded stored yield curve"
    );

    // -- Wire the fetcher ------------------------------------------------

    let fetcher: Box<dyn PageFetcher> = match cfg.source.strategy.as_str() {
        "http" => Box::new(HttpFetcher::new(
            cfg.source.url.clone(),
            Duration::from_secs(cfg.source.timeout_secs),
        )?),
        "browser" => {
            let Some(webdriver_url) = cfg.source.webdriver_url.clone() else {
                bail!("source.webdriver_url is required for the browser strategy");
            };
            Box::new(
                BrowserFetcher::new(webdriver_url, cfg.source.url.clone())
                    .with_anchor_wait(Duration::from_secs(cfg.source.wait_secs)),
            )
        }
        other => bail!("unknown source.strategy {other:?} (expected \"http\" or \"browser\")"),
    };
    info!(fetcher = fetcher.name(), "Fetcher ready");

    let orchestrator = FetchOrchestrator::new(
        fetcher,
        repo.clone(),
        Duration::from_secs(cfg.cache.ttl_secs),
    );

    // -- Serve -----------------------------------------------------------

    let state = Arc::new(AppContext {
        orchestrator,
        repo,
        tax_rate_percent: cfg.tax.rate_percent,
    });

    if cfg.dashboard.enabled {
        tokio::select! {
            result = khazna::dashboard::serve(state, cfg.dashboard.port) => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received.");
            }
        }
    } else {
        // Headless mode: do one refresh, report, and exit.
        let outcome = state.orchestrator.refresh().await;
        info!(status = %outcome.status, message = %outcome.message, "Refresh complete");
    }

    info!("KHAZNA shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("khazna=info"));

    let json_logging = std::env::var("KHAZNA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
