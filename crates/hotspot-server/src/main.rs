//! # hotspot-server
//!
//! HTTP server for the local-only hotspot controller.
//!
//! This binary provides:
//! - REST API to start, stop and inspect the hotspot
//! - Server-sent events of the tether state
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package hotspot-server
//!
//! # Production
//! HOTSPOT__SERVER__PRODUCTION=true ./hotspot-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::sync::Arc;

use anyhow::Context;
use hotspot_core::{HotspotRadio, Settings};
use hotspot_server::api::create_router;
use hotspot_server::logging;
use hotspot_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    logging::init(settings.server.production)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting hotspot-server");

    let addr = settings.bind_addr()?;
    let state = AppState::new(settings, radio()?)?;
    let app = create_router(Arc::clone(&state));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close any live session before exiting.
    state.controller.shutdown().await;
    info!("hotspot-server stopped");

    Ok(())
}

#[cfg(feature = "simulated-radio")]
fn radio() -> anyhow::Result<Arc<dyn HotspotRadio>> {
    info!("Using the simulated radio");
    Ok(Arc::new(hotspot_core::SimulatedRadio::new()))
}

#[cfg(not(feature = "simulated-radio"))]
fn radio() -> anyhow::Result<Arc<dyn HotspotRadio>> {
    anyhow::bail!("No radio binding available; build with the `simulated-radio` feature")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
