//! Housing Sentinel Server - prediction API with drift monitoring
//!
//! Serves `POST /predict` and the monitoring endpoints over HTTP. Health is
//! also pushed via structured JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=models PORT=8000 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `MODE` - Event store backend, `sqlite` or `memory` (default: sqlite)
//! - `DATABASE_URL` - SQLite event store (default: sqlite://logs/predictions.db)
//! - `MODEL_DIR` - Directory holding the published model (default: models)
//! - `OBSERVABILITY_ENABLED` - Enable health reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between health outputs (default: 60)

use anyhow::{Context, Result};
use housing_sentinel::application::system::Application;
use housing_sentinel::config::Config;
use housing_sentinel::interfaces::{AppState, router};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Housing Sentinel {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Storage={:?}, Window={:?}, Drift={}",
        config.server.mode,
        config.monitoring.window_spec(),
        config.monitoring.policy.drift_method
    );

    let app = Application::build(config.clone()).await?;

    // Start health reporter if enabled
    match app.reporter() {
        Some(reporter) => {
            tokio::spawn(async move {
                reporter.run().await;
            });
            info!(
                "Health reporter started (interval: {}s)",
                config.observability.interval_seconds
            );
        }
        None => info!("Health reporting disabled."),
    }

    let state = AppState::new(app.service(), app.monitor());
    let address = config.server.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}. Press Ctrl+C to shutdown.", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
