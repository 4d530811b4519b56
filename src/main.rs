// =============================================================================
// Candle Dashboard: Main Entry Point
// =============================================================================
//
// Serves the chart pipeline (catalog → series → overlays → chart config) over
// a small JSON API. One session owns the provider client and the memo caches
// for the lifetime of the process.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod catalog;
mod chart;
mod error;
mod indicators;
mod memo;
mod provider;
mod runtime_config;
mod series;
mod session;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::provider::HttpProvider;
use crate::runtime_config::DashboardConfig;
use crate::session::DashboardSession;

const DEFAULT_CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Candle Dashboard starting up");

    let config_path =
        std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = DashboardConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DashboardConfig::default()
    });
    config.apply_env();

    info!(
        bind_addr = %config.bind_addr,
        default_mavs = ?config.default_mavs,
        min_bars = config.min_bars,
        "Configuration ready"
    );

    // ── 2. Provider & session ────────────────────────────────────────────
    let provider = Arc::new(HttpProvider::new(config.provider.clone())?);
    let bind_addr = config.bind_addr.clone();
    let session = Arc::new(DashboardSession::new(provider, config));

    // ── 3. API server ────────────────────────────────────────────────────
    let app = api::rest::router(session);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Candle Dashboard shut down complete.");
    Ok(())
}
