//! The model shared by request handlers

use crate::model_loader::LoadedModel;
use carat_core::{Error, Result};
use std::sync::{Arc, OnceLock};

/// Whether a model has been published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Unloaded,
    Ready,
}

impl ModelStatus {
    /// Label reported by the health endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "not loaded",
            Self::Ready => "loaded",
        }
    }
}

/// Write-once holder for the serving model.
///
/// Readers either see nothing or a complete model; once published the
/// model stays until the process exits.
#[derive(Debug, Default)]
pub struct ModelSlot {
    model: OnceLock<Arc<LoadedModel>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that starts out ready
    pub fn with_model(model: LoadedModel) -> Self {
        let slot = Self::new();
        let _ = slot.model.set(Arc::new(model));
        slot
    }

    /// Publish `model`. Fails if a model is already published.
    pub fn publish(&self, model: LoadedModel) -> Result<Arc<LoadedModel>> {
        let model = Arc::new(model);
        self.model
            .set(Arc::clone(&model))
            .map_err(|_| Error::config("a model has already been published"))?;
        Ok(model)
    }

    /// The published model, if any
    pub fn get(&self) -> Option<Arc<LoadedModel>> {
        self.model.get().cloned()
    }

    /// The published model, or `ModelUnavailable`
    pub fn require(&self) -> Result<Arc<LoadedModel>> {
        self.get().ok_or_else(|| {
            Error::model_unavailable(
                "model not loaded; ensure it is registered in MLflow and promoted to the Production stage",
            )
        })
    }

    pub fn status(&self) -> ModelStatus {
        if self.model.get().is_some() {
            ModelStatus::Ready
        } else {
            ModelStatus::Unloaded
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ModelStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_loader::ModelMetadata;
    use crate::regressor::LinearRegressor;
    use crate::schema::FeatureSchema;

    fn model(version: &str) -> LoadedModel {
        let schema = FeatureSchema::new(vec!["carat".into()]).unwrap();
        let regressor = Arc::new(LinearRegressor::new(vec![1.0], 0.0).unwrap());
        let metadata = ModelMetadata {
            name: "m".into(),
            version: version.into(),
            stage: None,
            run_id: None,
            source: "test".into(),
            estimator: "linear".into(),
            n_features: 1,
        };
        LoadedModel::new(regressor, schema, metadata).unwrap()
    }

    #[test]
    fn test_starts_unloaded() {
        let slot = ModelSlot::new();
        assert_eq!(slot.status(), ModelStatus::Unloaded);
        assert_eq!(slot.status().as_str(), "not loaded");
        assert!(slot.get().is_none());
        assert!(matches!(slot.require(), Err(Error::ModelUnavailable(_))));
    }

    #[test]
    fn test_publish_once() {
        let slot = ModelSlot::new();
        slot.publish(model("1")).unwrap();
        assert!(slot.is_ready());
        assert_eq!(slot.status().as_str(), "loaded");

        assert!(slot.publish(model("2")).is_err());
        assert_eq!(slot.require().unwrap().metadata().version, "1");
    }

    #[test]
    fn test_concurrent_readers_see_whole_model() {
        let slot = Arc::new(ModelSlot::new());

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(m) = slot.get() {
                            assert_eq!(m.metadata().version, "7");
                            assert_eq!(m.schema().len(), 1);
                        }
                    }
                })
            })
            .collect();

        slot.publish(model("7")).unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert!(slot.is_ready());
    }
}
