//! Startup model resolution

use crate::model_loader::LoadedModel;
use crate::provider::ModelProvider;
use crate::slot::{ModelSlot, ModelStatus};
use carat_core::{Error, Result};
use tracing::{error, info, warn};

/// Which model to serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelQuery {
    /// Registered model name
    pub name: String,

    /// Preferred stage
    pub stage: String,

    /// Take the newest non-archived version of any stage when `stage` has none
    pub fallback_to_latest: bool,
}

impl Default for ModelQuery {
    fn default() -> Self {
        Self {
            name: "diamond-price-regressor".to_string(),
            stage: "Production".to_string(),
            fallback_to_latest: false,
        }
    }
}

/// Resolve and load the model described by `query`. One attempt, no retries.
pub async fn load_latest(provider: &dyn ModelProvider, query: &ModelQuery) -> Result<LoadedModel> {
    info!(
        "Resolving model '{}' at stage {} via {}",
        query.name,
        query.stage,
        provider.name()
    );

    let handle = match provider.fetch_latest(&query.name, Some(&query.stage)).await {
        Ok(handle) => handle,
        Err(Error::ModelNotFound(reason)) if query.fallback_to_latest => {
            warn!(
                "No {} version found ({}); trying the latest non-archived version",
                query.stage, reason
            );
            provider.fetch_latest(&query.name, None).await?
        }
        Err(e) => return Err(e),
    };

    info!("Loading model from {}", handle.source);
    let model = provider.load(&handle).await?;

    let meta = model.metadata();
    info!(
        "Model '{}' version {} loaded ({}, {} features)",
        meta.name, meta.version, meta.estimator, meta.n_features
    );
    Ok(model)
}

/// Load once and publish into `slot`.
///
/// Failures are logged with a remediation hint and leave the slot
/// unloaded; the caller keeps serving.
pub async fn load_into(
    slot: &ModelSlot,
    provider: &dyn ModelProvider,
    query: &ModelQuery,
) -> ModelStatus {
    match load_latest(provider, query).await {
        Ok(model) => match slot.publish(model) {
            Ok(_) => {
                info!("Ready to serve predictions");
                ModelStatus::Ready
            }
            Err(e) => {
                warn!("Model not published: {}", e);
                slot.status()
            }
        },
        Err(e) => {
            error!("Error loading model: {}", e);
            error!(
                "Service will start but predictions will fail until a model is available. \
                 Register '{}' in MLflow, promote a version to the {} stage and restart the service.",
                query.name, query.stage
            );
            ModelStatus::Unloaded
        }
    }
}
