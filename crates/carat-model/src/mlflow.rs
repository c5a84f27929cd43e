//! MLflow model registry provider (REST API)

use crate::model_loader::{LoadedModel, ModelHandle};
use crate::provider::{Credentials, ModelProvider};
use async_trait::async_trait;
use carat_core::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Stage of versions that were retired and must never be served
const ARCHIVED_STAGE: &str = "Archived";

/// Registry connection settings
#[derive(Debug, Clone)]
pub struct MlflowConfig {
    /// Tracking server base URL, e.g. `https://dagshub.com/<owner>/<repo>.mlflow`
    pub tracking_uri: String,

    /// Run-relative path of the exported model
    pub model_artifact_path: String,

    /// Run-relative path of the training columns
    pub columns_artifact_path: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for MlflowConfig {
    fn default() -> Self {
        Self {
            tracking_uri: "https://dagshub.com/barnabet/projet_devops.mlflow".to_string(),
            model_artifact_path: "model_meta/model.json".to_string(),
            columns_artifact_path: "model_meta/training_columns.json".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct LatestVersionsRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stages: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<RegisteredVersion>,
}

#[derive(Debug, Clone, Deserialize)]
struct RegisteredVersion {
    name: String,
    version: String,
    #[serde(default)]
    current_stage: Option<String>,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl RegisteredVersion {
    fn version_number(&self) -> Option<u64> {
        self.version.parse().ok()
    }

    fn is_archived(&self) -> bool {
        self.current_stage
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(ARCHIVED_STAGE))
    }
}

/// Resolves and downloads models from an MLflow tracking server
pub struct MlflowProvider {
    client: reqwest::Client,
    config: MlflowConfig,
    credentials: Option<Credentials>,
}

impl MlflowProvider {
    pub fn new(config: MlflowConfig, credentials: Option<Credentials>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build registry client: {}", e)))?;

        if credentials.is_none() {
            warn!("No registry credentials configured; requests will be anonymous");
        }

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.tracking_uri.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.password)),
            None => request,
        }
    }

    /// Download a run artifact; `Ok(None)` when the server has no such file
    async fn download_artifact(&self, run_id: &str, path: &str) -> Result<Option<Vec<u8>>> {
        debug!("Downloading artifact '{}' from run {}", path, run_id);

        let request = self
            .client
            .get(self.url("/get-artifact"))
            .query(&[("path", path), ("run_uuid", run_id)]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::model_load(format!("registry unreachable: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(|e| {
                    Error::model_load(format!("failed to read artifact '{}': {}", path, e))
                })?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(Error::model_load(format!(
                "artifact '{}' download failed with status {}",
                path, status
            ))),
        }
    }
}

#[async_trait]
impl ModelProvider for MlflowProvider {
    async fn fetch_latest(&self, model_name: &str, stage: Option<&str>) -> Result<ModelHandle> {
        let body = LatestVersionsRequest {
            name: model_name,
            stages: stage.into_iter().collect(),
        };

        let request = self
            .client
            .post(self.url("/api/2.0/mlflow/registered-models/get-latest-versions"))
            .json(&body);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::model_load(format!("registry unreachable: {}", e)))?;

        let describe = || match stage {
            Some(s) => format!("'{}' at stage {}", model_name, s),
            None => format!("'{}'", model_name),
        };

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(Error::model_not_found(format!(
                    "no registered model {}",
                    describe()
                )))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::model_load(format!(
                    "registry rejected credentials ({})",
                    response.status()
                )))
            }
            status if !status.is_success() => {
                return Err(Error::model_load(format!(
                    "registry query failed with status {}",
                    status
                )))
            }
            _ => {}
        }

        let parsed: LatestVersionsResponse = response
            .json()
            .await
            .map_err(|e| Error::model_load(format!("invalid registry response: {}", e)))?;

        // Stage-less lookups never return retired versions
        let latest = parsed
            .model_versions
            .into_iter()
            .filter(|v| stage.is_some() || !v.is_archived())
            .max_by(|a, b| {
                a.version_number()
                    .cmp(&b.version_number())
                    .then_with(|| a.version.cmp(&b.version))
            })
            .ok_or_else(|| Error::model_not_found(format!("no version of {}", describe())))?;

        info!(
            "Resolved {} version {} (stage: {})",
            latest.name,
            latest.version,
            latest.current_stage.as_deref().unwrap_or("None")
        );

        let source = latest
            .source
            .clone()
            .unwrap_or_else(|| format!("models:/{}/{}", latest.name, latest.version));

        Ok(ModelHandle {
            name: latest.name,
            version: latest.version,
            stage: latest.current_stage,
            run_id: latest.run_id,
            source,
        })
    }

    async fn load(&self, handle: &ModelHandle) -> Result<LoadedModel> {
        let run_id = handle.run_id.as_deref().ok_or_else(|| {
            Error::model_load(format!(
                "version {} of '{}' has no run id",
                handle.version, handle.name
            ))
        })?;

        let model_bytes = self
            .download_artifact(run_id, &self.config.model_artifact_path)
            .await?
            .ok_or_else(|| {
                Error::model_load(format!(
                    "run {} has no artifact '{}'",
                    run_id, self.config.model_artifact_path
                ))
            })?;

        let columns_bytes = self
            .download_artifact(run_id, &self.config.columns_artifact_path)
            .await?;
        if columns_bytes.is_none() {
            warn!(
                "Run {} has no '{}' artifact; falling back to the model's own schema",
                run_id, self.config.columns_artifact_path
            );
        }

        LoadedModel::from_artifacts(handle, &model_bytes, columns_bytes.as_deref())
    }

    fn name(&self) -> &str {
        "mlflow"
    }
}
