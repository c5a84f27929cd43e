//! Carat Server
//!
//! Serves diamond price predictions from the model registered in MLflow.

use anyhow::Result;
use carat_server::{create_router, telemetry, AppState, Cli, ServiceConfig};
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing(cli.verbose, cli.log_format);
    info!("Starting Carat Server");

    let config = ServiceConfig::load(&cli)?;
    info!("Configuration loaded successfully");
    match &config.model.local_dir {
        Some(dir) => info!("Model directory: {}", dir.display()),
        None => info!("Tracking URI: {}", config.model.tracking_uri),
    }

    let metrics_handle = telemetry::init_metrics()?;

    let addr: SocketAddr = config.listen_addr().parse()?;
    let state = AppState::initialize(config, metrics_handle).await?;
    info!("Model status: {}", state.model.status().as_str());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
