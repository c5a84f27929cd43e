//! HTTP routes and handlers

use axum::{
    body::{Body, Bytes},
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Request, Uri},
    routing::{get, post},
    BoxError, Json, Router,
};
use carat_core::{Error, PredictionResult};
use carat_model::{parse_records, ModelMetadata, ModelStatus};
use serde::Serialize;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{debug, info_span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %req.method(),
            uri = %req.uri(),
        )
    });

    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(state.config.request_timeout()),
        )
        .layer(trace)
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelMetadata>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.model.status();
    // The slot is write-once, so a Ready status always has a model behind it
    let model = state.model.get().filter(|_| status == ModelStatus::Ready);

    Json(HealthResponse {
        status: "running",
        model_status: status.as_str(),
        message: "Diamond Price Prediction API is running",
        model: model.map(|m| m.metadata().clone()),
    })
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictionResult>, ApiError> {
    metrics::counter!("carat_predict_requests_total").increment(1);

    let model = state.model.require()?;
    let records = parse_records(&body, state.config.server.max_batch_size)?;
    let n_records = records.len();

    // Inference is CPU-bound; a panic surfaces as a JoinError
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || model.predict(&records))
        .await
        .map_err(|e| Error::inference(format!("inference task failed: {}", e)))??;
    let elapsed = start.elapsed();

    metrics::histogram!("carat_inference_latency_us").record(elapsed.as_micros() as f64);
    metrics::counter!("carat_predictions_total").increment(n_records as u64);
    debug!(records = n_records, latency_us = elapsed.as_micros() as u64, "Prediction served");

    Ok(Json(result))
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}
