//! Logging and metrics setup

use crate::cli::LogFormat;
use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("carat=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carat=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Install the Prometheus recorder and return the handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    describe_metrics();
    info!("Metrics exporter initialized");
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(
        "carat_predict_requests_total",
        "Total number of prediction requests received"
    );
    metrics::describe_counter!(
        "carat_predictions_total",
        "Total number of diamond records priced"
    );
    metrics::describe_counter!("carat_errors_total", "Total number of errors by kind");
    metrics::describe_histogram!(
        "carat_inference_latency_us",
        metrics::Unit::Microseconds,
        "Preprocessing and inference latency in microseconds"
    );
    metrics::describe_gauge!("carat_model_ready", "1 when a model is loaded, else 0");
}
