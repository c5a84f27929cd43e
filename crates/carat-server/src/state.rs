//! Shared application state

use crate::config::ServiceConfig;
use carat_model::{
    load_into, Credentials, LocalProvider, MlflowProvider, ModelProvider, ModelSlot, ModelStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub model: Arc<ModelSlot>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: ServiceConfig, model: Arc<ModelSlot>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            model,
            metrics_handle,
        }
    }

    /// Resolve and load the configured model once.
    ///
    /// A failed load still yields a serving state; `/predict` answers 503
    /// until the process is restarted with a reachable model.
    pub async fn initialize(
        config: ServiceConfig,
        metrics_handle: PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let provider = build_provider(&config)?;
        info!(
            provider = provider.name(),
            model = %config.model.name,
            stage = %config.model.stage,
            "Loading model"
        );

        let slot = Arc::new(ModelSlot::new());
        let status = load_into(&slot, provider.as_ref(), &config.model_query()).await;
        metrics::gauge!("carat_model_ready").set(match status {
            ModelStatus::Ready => 1.0,
            ModelStatus::Unloaded => 0.0,
        });

        Ok(Self::new(config, slot, metrics_handle))
    }
}

pub fn build_provider(config: &ServiceConfig) -> anyhow::Result<Box<dyn ModelProvider>> {
    if let Some(dir) = &config.model.local_dir {
        return Ok(Box::new(LocalProvider::new(dir)));
    }

    let provider = MlflowProvider::new(config.mlflow_config(), Credentials::from_env())?;
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[tokio::test]
    async fn test_initialize_with_empty_model_dir_stays_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        config.model.local_dir = Some(dir.path().to_path_buf());
        let handle = PrometheusBuilder::new().build_recorder().handle();

        let state = AppState::initialize(config, handle).await.unwrap();

        assert!(!state.model.is_ready());
    }

    #[test]
    fn test_local_dir_selects_local_provider() {
        let mut config = ServiceConfig::default();
        config.model.local_dir = Some("/tmp".into());
        assert_eq!(build_provider(&config).unwrap().name(), "local");

        let config = ServiceConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "mlflow");
    }
}
