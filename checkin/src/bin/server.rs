//! EchoPass check-in server
//!
//! Serves the validation endpoint, the operator feed and ticket endpoints,
//! and exports Prometheus metrics on a separate port.
//!
//! # Usage
//!
//! ```bash
//! KIOSK_PASSPHRASE=door-7 cargo run --bin echopass-server
//! ```

use echopass_checkin::{metrics::register_checkin_metrics, CheckInApp, Config, InMemoryTicketLedger};
use echopass_core::environment::SystemClock;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},echopass_checkin=debug", config.server.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting EchoPass check-in server...");

    let metrics_addr: SocketAddr = config.metrics_address().parse()?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    register_checkin_metrics();
    tracing::info!(%metrics_addr, "Metrics exporter listening");

    let app = CheckInApp::new(
        config.clone(),
        Arc::new(SystemClock),
        Arc::new(InMemoryTicketLedger::new()),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "HTTP server listening");

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Draining in-flight validations...");
    if let Err(error) = app.shutdown().await {
        tracing::error!(%error, "Shutdown incomplete");
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
