//! Carat Core
//!
//! Core types and errors shared across the Carat components.
//!
//! This crate provides:
//! - The diamond record and its categorical grades
//! - Prediction results
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::{Clarity, Color, Cut, DiamondRecord, PredictionResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Clarity, Color, Cut, DiamondRecord, PredictionResult};
}
