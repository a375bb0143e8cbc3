//! Predict Insight Server - per-ticker price-move inference over HTTP
//!
//! Serves `GET /health` and `POST /predict`. Model bundles are read lazily
//! from `BUNDLE_DIR` on the first request for each ticker.
//!
//! # Usage
//! ```sh
//! BUNDLE_DIR=./bundles ML_API_KEY=change-me cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `ML_API_KEY` - Bearer token for `/predict` (default: empty, auth disabled)
//! - `BUNDLE_DIR` - Directory of `{TICKER}_*` artifacts (default: ./bundles)
//! - `MIN_TH_PCT` / `MAX_TH_PCT` - Decision threshold clamp (default: 0.8 / 2.0)
//! - `VOL_WINDOW` - Realized volatility window (default: 14)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listener (default: 0.0.0.0:8001)

use anyhow::{Context, Result};
use predict_insight::application::decision_engine::DecisionEngine;
use predict_insight::application::market_data::HistoryFetcher;
use predict_insight::application::ml::BundleCache;
use predict_insight::application::prediction_service::PredictionService;
use predict_insight::config::Config;
use predict_insight::infrastructure::core::HttpClientFactory;
use predict_insight::infrastructure::ml::FsBundleLoader;
use predict_insight::infrastructure::yahoo::YahooMarketDataService;
use predict_insight::interfaces::http::{AppState, build_router};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(stdout_layer)
        .init();

    info!("Predict Insight Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: BundleDir={:?}, Threshold=[{}, {}]%, VolWindow={}, Auth={}",
        config.model.bundle_dir,
        config.model.min_threshold_pct,
        config.model.max_threshold_pct,
        config.model.vol_window,
        if config.server.auth_enabled() { "on" } else { "off" }
    );
    if !config.model.bundle_dir.is_dir() {
        warn!(
            "Bundle directory {:?} does not exist; every prediction will return 503 until it is provisioned",
            config.model.bundle_dir
        );
    }

    let client = HttpClientFactory::create_client(
        config.market_data.timeout,
        config.market_data.connect_timeout,
    )?;
    let market_data = Arc::new(YahooMarketDataService::new(
        client,
        config.market_data.base_url.clone(),
    ));
    let fetcher = HistoryFetcher::new(market_data, config.market_data.fallback_start);

    let loader = Arc::new(FsBundleLoader::new(config.model.bundle_dir.clone()));
    let bundles = Arc::new(BundleCache::new(loader));
    let decision = DecisionEngine::new(config.model.decision_config());

    let service = Arc::new(PredictionService::new(bundles, fetcher, decision));
    let state = Arc::new(AppState::new(service, config.model.bundle_dir.clone()));
    let app = build_router(state, config.server.api_key.clone());

    let addr = config.server.socket_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}. Press Ctrl+C to shutdown.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received. Draining connections...");
}
