//! Local directory model provider

use crate::model_loader::{LoadedModel, ModelHandle};
use crate::provider::ModelProvider;
use async_trait::async_trait;
use carat_core::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

/// Serves the model stored in a single directory.
///
/// The directory holds `model.json` and, optionally,
/// `training_columns.json`. Stages are not tracked: whatever the
/// directory contains is the latest version at every stage.
pub struct LocalProvider {
    dir: PathBuf,
}

impl LocalProvider {
    pub const MODEL_FILE: &'static str = "model.json";
    pub const COLUMNS_FILE: &'static str = "training_columns.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ModelProvider for LocalProvider {
    async fn fetch_latest(&self, model_name: &str, stage: Option<&str>) -> Result<ModelHandle> {
        let model_path = self.dir.join(Self::MODEL_FILE);
        if !tokio::fs::try_exists(&model_path).await.unwrap_or(false) {
            return Err(Error::model_not_found(format!(
                "no {} in {}",
                Self::MODEL_FILE,
                self.dir.display()
            )));
        }

        Ok(ModelHandle {
            name: model_name.to_string(),
            version: "local".to_string(),
            stage: stage.map(str::to_string),
            run_id: None,
            source: self.dir.display().to_string(),
        })
    }

    async fn load(&self, handle: &ModelHandle) -> Result<LoadedModel> {
        let model_path = self.dir.join(Self::MODEL_FILE);
        debug!("Reading model from {}", model_path.display());
        let model_bytes = tokio::fs::read(&model_path).await.map_err(|e| {
            Error::model_load(format!("failed to read {}: {}", model_path.display(), e))
        })?;

        let columns_path = self.dir.join(Self::COLUMNS_FILE);
        let columns_bytes = match tokio::fs::read(&columns_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(Error::model_load(format!(
                    "failed to read {}: {}",
                    columns_path.display(),
                    e
                )))
            }
        };

        LoadedModel::from_artifacts(handle, &model_bytes, columns_bytes.as_deref())
    }

    fn name(&self) -> &str {
        "local"
    }
}
