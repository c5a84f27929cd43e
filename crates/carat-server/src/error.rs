//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carat_core::ErrorKind;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] carat_core::Error),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("request timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(e) => match e.kind() {
                ErrorKind::Schema => StatusCode::BAD_REQUEST,
                ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => match e.kind() {
                ErrorKind::Schema => "SCHEMA_ERROR",
                ErrorKind::ModelUnavailable => "MODEL_UNAVAILABLE",
                ErrorKind::Inference => "INFERENCE_ERROR",
                _ => "INTERNAL_ERROR",
            },
            Self::NotFound(_) => "NOT_FOUND",
            Self::Timeout => "REQUEST_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn kind_label(&self) -> &'static str {
        match self {
            Self::Core(e) => e.kind().as_str(),
            Self::NotFound(_) => "not_found",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(code = self.code(), "Request failed: {}", self);
        } else {
            warn!(code = self.code(), "Request rejected: {}", self);
        }
        metrics::counter!("carat_errors_total", "kind" => self.kind_label()).increment(1);

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}
