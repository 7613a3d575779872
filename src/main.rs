//! Fubon FX Rate Monitor — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the rate watcher, the polling
//! scheduler, and the routes.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fubon_rate_monitor::api::{self, AppState};
use fubon_rate_monitor::config::{AppConfig, DEFAULT_CONFIG_PATH};
use fubon_rate_monitor::extract::{DynRateSource, GeminiSource};
use fubon_rate_monitor::metrics::Metrics;
use fubon_rate_monitor::watch::{spawn_scheduler, RateWatcher};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fubon_rate_monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the variables come from the host.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load(DEFAULT_CONFIG_PATH)?;
    // Safe diagnostics: never the key itself, only its length.
    tracing::info!(
        bind = %cfg.bind,
        poll_interval_secs = cfg.poll_interval_secs,
        model = %cfg.model,
        key_len = cfg.api_key.len(),
        "config loaded"
    );

    let metrics = Metrics::init(cfg.poll_interval_secs)?;

    let source: DynRateSource = Arc::new(GeminiSource::from_config(&cfg));
    let watcher = Arc::new(RateWatcher::new(source));
    let _scheduler = spawn_scheduler(watcher.clone(), cfg.poll_interval_secs);

    let router = api::create_router(AppState { watcher }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind).await?;
    tracing::info!(addr = %cfg.bind, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
