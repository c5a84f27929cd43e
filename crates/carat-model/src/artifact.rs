//! Portable JSON model artifact exported by the training job

use crate::regressor::{DecisionTree, ForestRegressor, LinearRegressor, Regressor, TreeNode};
use carat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Artifact format version this build understands
pub const FORMAT_VERSION: u32 = 1;

/// A fitted estimator plus the input shape it was fit on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,

    /// Width of the training feature matrix
    pub n_features: usize,

    /// Training column names, when the exporter recorded them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    pub estimator: EstimatorSpec,
}

/// Estimator families
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest { trees: Vec<TreeSpec> },
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<TreeNode>,
}

impl ModelArtifact {
    /// Parse an artifact from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = serde_json::from_slice(bytes)
            .map_err(|e| Error::model_load(format!("invalid model artifact: {}", e)))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(Error::model_load(format!(
                "unsupported model artifact version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }

        Ok(artifact)
    }

    /// Estimator family name
    pub fn estimator_name(&self) -> &'static str {
        match self.estimator {
            EstimatorSpec::RandomForest { .. } => "random_forest",
            EstimatorSpec::Linear { .. } => "linear",
        }
    }

    /// Validate the estimator and build the regressor
    pub fn build_regressor(&self) -> Result<Arc<dyn Regressor>> {
        match &self.estimator {
            EstimatorSpec::RandomForest { trees } => {
                let trees = trees
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        DecisionTree::new(t.nodes.clone(), self.n_features).map_err(|e| {
                            Error::model_load(format!("tree {}: {}", i, strip(&e)))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(ForestRegressor::new(trees, self.n_features)?))
            }
            EstimatorSpec::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != self.n_features {
                    return Err(Error::model_load(format!(
                        "linear model has {} coefficients for {} features",
                        coefficients.len(),
                        self.n_features
                    )));
                }
                Ok(Arc::new(LinearRegressor::new(
                    coefficients.clone(),
                    *intercept,
                )?))
            }
        }
    }
}

fn strip(err: &Error) -> String {
    match err {
        Error::ModelLoad(msg) => msg.clone(),
        other => other.to_string(),
    }
}
