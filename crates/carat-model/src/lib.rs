//! Carat Model
//!
//! Everything between a raw request body and a predicted price.
//!
//! - [`schema`]: the ordered training columns and reindex-and-zero-fill
//! - [`preprocess`]: request parsing and one-hot encoding
//! - [`regressor`]: the [`Regressor`] trait with tree-ensemble and linear models
//! - [`artifact`]: the portable JSON model format exported by training
//! - [`model_loader`]: [`LoadedModel`], a regressor bound to its schema
//! - [`provider`], [`mlflow`], [`local`]: where models come from
//! - [`slot`]: the once-published model shared by request handlers
//! - [`loader`]: startup resolution with stage fallback

pub mod artifact;
pub mod loader;
pub mod local;
pub mod mlflow;
pub mod model_loader;
pub mod preprocess;
pub mod provider;
pub mod regressor;
pub mod schema;
pub mod slot;

pub use artifact::{EstimatorSpec, ModelArtifact, TreeSpec, FORMAT_VERSION};
pub use loader::{load_into, load_latest, ModelQuery};
pub use local::LocalProvider;
pub use mlflow::{MlflowConfig, MlflowProvider};
pub use model_loader::{LoadedModel, ModelHandle, ModelMetadata};
pub use preprocess::{encode, parse_records, EncodedRow, FeatureBatch, Preprocessor};
pub use provider::{Credentials, ModelProvider};
pub use regressor::{DecisionTree, ForestRegressor, LinearRegressor, Regressor, TreeNode};
pub use schema::{reindex, FeatureSchema, DIAMOND_TRAINING_COLUMNS};
pub use slot::{ModelSlot, ModelStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::model_loader::{LoadedModel, ModelHandle};
    pub use crate::provider::ModelProvider;
    pub use crate::regressor::Regressor;
    pub use crate::schema::FeatureSchema;
    pub use crate::slot::{ModelSlot, ModelStatus};
}
