//! # NewsNexus — Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, shared services, and the
//! tool surface.
//!
//! ## Endpoints
//! - `GET /api/articles?domain=...` — per-domain articles via the fallback ladder
//! - `GET /api/top-news` — aggregated top news across priority sites
//! - `GET /api/health` — status, configured domains, cache stats
//! - `GET /api/metrics` — counters and latency histograms
//!
//! Configuration comes from `NEWSNEXUS_*` environment variables and
//! `sites.json`.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use newsnexus::config::{Settings, SiteRegistry};
use newsnexus::engine::AppState;
use newsnexus::fetch::HttpFetcher;
use newsnexus::metrics::Metrics;

#[derive(Debug, Parser)]
#[command(name = "newsnexus", about = "Four-layer news aggregation service")]
struct Cli {
    /// Host to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Path to sites.json (overrides NEWSNEXUS_CONFIG_PATH).
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("NEWSNEXUS_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt().with_env_filter(filter).with_target(true).init();

    let args = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(path) = args.config {
        settings.config_path = path;
    }

    let registry = match SiteRegistry::load(&settings.config_path) {
        Ok(registry) => registry,
        Err(e) => {
            warn!(error = %e, "site config unavailable, starting with an empty registry");
            SiteRegistry::default()
        }
    };

    let metrics = Arc::new(Metrics::new());
    let fetcher = Arc::new(HttpFetcher::new(&settings, Arc::clone(&metrics)));
    let state = Arc::new(AppState::new(
        settings,
        registry,
        fetcher.clone(),
        fetcher,
        metrics,
    ));

    info!(
        sites = state.registry.len(),
        cache_ttl = state.settings.cache_ttl_secs,
        rate_limit = state.settings.rate_limit,
        rate_window = state.settings.rate_window_secs,
        "newsnexus starting"
    );

    let app = newsnexus::router(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .await
        .context("serving HTTP")?;
    Ok(())
}
