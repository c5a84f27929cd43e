//! Loaded models: a regressor bound to the schema it was fit on

use crate::artifact::ModelArtifact;
use crate::preprocess::Preprocessor;
use crate::regressor::Regressor;
use crate::schema::FeatureSchema;
use carat_core::{DiamondRecord, Error, PredictionResult, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A model version resolved by a provider, not yet loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    /// Registered model name
    pub name: String,

    /// Registry version (`"local"` for directory models)
    pub version: String,

    /// Stage the version is currently in, if any
    pub stage: Option<String>,

    /// Training run that produced the version
    pub run_id: Option<String>,

    /// Where the artifacts live
    pub source: String,
}

/// Descriptive information about a loaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub source: String,
    pub estimator: String,
    pub n_features: usize,
}

impl ModelMetadata {
    /// Metadata for a model loaded from `handle`
    pub fn from_handle(handle: &ModelHandle, estimator: &str, n_features: usize) -> Self {
        Self {
            name: handle.name.clone(),
            version: handle.version.clone(),
            stage: handle.stage.clone(),
            run_id: handle.run_id.clone(),
            source: handle.source.clone(),
            estimator: estimator.to_string(),
            n_features,
        }
    }
}

/// A ready-to-serve model. Immutable once built.
pub struct LoadedModel {
    regressor: Arc<dyn Regressor>,
    preprocessor: Preprocessor,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl LoadedModel {
    /// Bind a regressor to its schema. The widths must agree.
    pub fn new(
        regressor: Arc<dyn Regressor>,
        schema: FeatureSchema,
        metadata: ModelMetadata,
    ) -> Result<Self> {
        if schema.len() != regressor.n_features() {
            return Err(Error::model_load(format!(
                "feature schema has {} columns but the model expects {}",
                schema.len(),
                regressor.n_features()
            )));
        }

        Ok(Self {
            regressor,
            preprocessor: Preprocessor::new(Arc::new(schema)),
            metadata,
        })
    }

    /// Build from raw artifacts.
    ///
    /// Schema precedence: the training columns artifact, then the names
    /// embedded in the model artifact, then the built-in diamond schema.
    pub fn from_artifacts(
        handle: &ModelHandle,
        model_bytes: &[u8],
        columns_bytes: Option<&[u8]>,
    ) -> Result<Self> {
        let artifact = ModelArtifact::from_slice(model_bytes)?;
        let regressor = artifact.build_regressor()?;

        let schema = match (columns_bytes, &artifact.feature_names) {
            (Some(bytes), _) => {
                debug!("Using training columns artifact");
                FeatureSchema::from_json(bytes)?
            }
            (None, Some(names)) => {
                debug!("Using feature names embedded in the model artifact");
                FeatureSchema::new(names.clone())?
            }
            (None, None) => {
                debug!("Using built-in diamond schema");
                FeatureSchema::diamonds()
            }
        };

        let metadata =
            ModelMetadata::from_handle(handle, artifact.estimator_name(), artifact.n_features);
        Self::new(regressor, schema, metadata)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.preprocessor.schema()
    }

    /// Price a batch of records, one value per record in input order
    pub fn predict(&self, records: &[DiamondRecord]) -> Result<PredictionResult> {
        let batch = self.preprocessor.transform(records);
        let prices = self.regressor.predict(&batch)?;

        if prices.len() != records.len() {
            return Err(Error::inference(format!(
                "model returned {} predictions for {} records",
                prices.len(),
                records.len()
            )));
        }
        if let Some(i) = prices.iter().position(|p| !p.is_finite()) {
            return Err(Error::inference(format!(
                "model returned a non-finite prediction for record {}",
                i
            )));
        }

        Ok(PredictionResult::new(prices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::LinearRegressor;
    use crate::schema::DIAMOND_TRAINING_COLUMNS;
    use carat_core::{Clarity, Color, Cut};
    use serde_json::json;

    fn handle() -> ModelHandle {
        ModelHandle {
            name: "diamond-price-regressor".into(),
            version: "3".into(),
            stage: Some("Production".into()),
            run_id: Some("abc123".into()),
            source: "models:/diamond-price-regressor/3".into(),
        }
    }

    fn record(carat: f64) -> DiamondRecord {
        DiamondRecord {
            carat,
            cut: Cut::Ideal,
            color: Color::H,
            clarity: Clarity::Si1,
            depth: 61.5,
            table: 55.0,
            x: 6.3,
            y: 6.54,
            z: 4.0,
        }
    }

    fn linear_bytes(n_features: usize, names: Option<Vec<&str>>) -> Vec<u8> {
        let mut coefficients = vec![0.0; n_features];
        coefficients[0] = 1000.0;
        let mut artifact = json!({
            "format_version": 1,
            "n_features": n_features,
            "estimator": { "type": "linear", "coefficients": coefficients, "intercept": 500.0 }
        });
        if let Some(names) = names {
            artifact["feature_names"] = json!(names);
        }
        serde_json::to_vec(&artifact).unwrap()
    }

    #[test]
    fn test_defaults_to_diamond_schema() {
        let model = LoadedModel::from_artifacts(&handle(), &linear_bytes(23, None), None).unwrap();
        assert_eq!(model.schema().len(), 23);
        assert_eq!(model.metadata().estimator, "linear");
        assert_eq!(model.metadata().version, "3");

        let result = model.predict(&[record(1.0), record(2.0)]).unwrap();
        assert_eq!(result.predicted_price, vec![1500.0, 2500.0]);
    }

    #[test]
    fn test_columns_artifact_takes_precedence() {
        let bytes = linear_bytes(2, Some(vec!["x", "y"]));
        let columns = br#"["carat", "cut_Ideal"]"#;
        let model = LoadedModel::from_artifacts(&handle(), &bytes, Some(&columns[..])).unwrap();
        assert_eq!(model.schema().columns()[0], "carat");

        let result = model.predict(&[record(2.0)]).unwrap();
        assert_eq!(result.predicted_price, vec![2500.0]);
    }

    #[test]
    fn test_embedded_feature_names() {
        let bytes = linear_bytes(2, Some(vec!["carat", "depth"]));
        let model = LoadedModel::from_artifacts(&handle(), &bytes, None).unwrap();
        assert_eq!(model.schema().columns()[1], "depth");
    }

    #[test]
    fn test_schema_width_mismatch_fails_load() {
        let err = LoadedModel::from_artifacts(&handle(), &linear_bytes(5, None), None).unwrap_err();
        assert!(err
            .to_string()
            .contains("feature schema has 23 columns but the model expects 5"));
    }

    #[test]
    fn test_non_finite_prediction_is_inference_error() {
        let regressor = Arc::new(LinearRegressor::new(vec![f64::MAX; 23], 0.0).unwrap());
        let schema = FeatureSchema::new(
            DIAMOND_TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        )
        .unwrap();
        let metadata = ModelMetadata::from_handle(&handle(), "linear", 23);
        let model = LoadedModel::new(regressor, schema, metadata).unwrap();

        let err = model.predict(&[record(10.0)]).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
