//! Carat Server
//!
//! HTTP front end for the diamond price model: `/health`, `/predict` and
//! `/metrics` over a model loaded once at startup.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use cli::{Cli, LogFormat};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::{create_router, HealthResponse};
pub use state::AppState;
