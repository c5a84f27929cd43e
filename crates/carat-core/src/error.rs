//! Error types for Carat

/// Result type alias using Carat's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Carat operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body does not match the diamond record schema
    #[error("schema error: {0}")]
    Schema(String),

    /// No model has been published to the service
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The registry has no model version matching the query
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// A model artifact could not be fetched, parsed or validated
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Model evaluation failed
    #[error("inference error: {0}")]
    Inference(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`], used for status mapping and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    ModelUnavailable,
    ModelNotFound,
    ModelLoad,
    Inference,
    Config,
}

impl ErrorKind {
    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelNotFound => "model_not_found",
            Self::ModelLoad => "model_load",
            Self::Inference => "inference",
            Self::Config => "config",
        }
    }
}

impl Error {
    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new model-unavailable error
    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new model-not-found error
    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Self::ModelNotFound(msg.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) => ErrorKind::Schema,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::ModelNotFound(_) => ErrorKind::ModelNotFound,
            Self::ModelLoad(_) => ErrorKind::ModelLoad,
            Self::Inference(_) => ErrorKind::Inference,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the caller (not the service) is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}
