//! Service configuration

use crate::cli::Cli;
use carat_model::{MlflowConfig, ModelQuery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Which model to serve and where to get it
    #[serde(default)]
    pub model: ModelSettings,

    /// HTTP limits
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Registered model name
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Stage to serve
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Take the newest non-archived version of any stage when `stage` has none
    #[serde(default)]
    pub fallback_to_latest: bool,

    /// MLflow tracking server URL
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,

    /// Serve this directory through the local provider instead of MLflow
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// Run-relative path of the exported model
    #[serde(default = "default_model_artifact")]
    pub model_artifact_path: String,

    /// Run-relative path of the training columns
    #[serde(default = "default_columns_artifact")]
    pub columns_artifact_path: String,

    /// Registry request timeout in seconds
    #[serde(default = "default_registry_timeout")]
    pub registry_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            stage: default_stage(),
            fallback_to_latest: false,
            tracking_uri: default_tracking_uri(),
            local_dir: None,
            model_artifact_path: default_model_artifact(),
            columns_artifact_path: default_columns_artifact(),
            registry_timeout_secs: default_registry_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Maximum records per prediction request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file and CLI/environment overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(&cli.config).exists() {
            let content = std::fs::read_to_string(&cli.config)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// CLI flags and environment variables win over the file
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(name) = &cli.model_name {
            self.model.name = name.clone();
        }
        if let Some(stage) = &cli.model_stage {
            self.model.stage = stage.clone();
        }
        if let Some(uri) = &cli.tracking_uri {
            self.model.tracking_uri = uri.clone();
        }
        if let Some(dir) = &cli.model_dir {
            self.model.local_dir = Some(dir.clone());
        }
        if cli.allow_fallback {
            self.model.fallback_to_latest = true;
        }
    }

    pub fn validate(&self) -> carat_core::Result<()> {
        use carat_core::Error;

        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }
        if self.model.name.trim().is_empty() {
            return Err(Error::config("model name must not be empty"));
        }
        if self.model.stage.trim().is_empty() {
            return Err(Error::config("model stage must not be empty"));
        }
        if self.server.max_batch_size == 0 {
            return Err(Error::config("max_batch_size must be greater than zero"));
        }
        if self.server.max_body_bytes == 0 {
            return Err(Error::config("max_body_bytes must be greater than zero"));
        }
        if let Some(dir) = &self.model.local_dir {
            if !dir.is_dir() {
                return Err(Error::config(format!(
                    "model directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_query(&self) -> ModelQuery {
        ModelQuery {
            name: self.model.name.clone(),
            stage: self.model.stage.clone(),
            fallback_to_latest: self.model.fallback_to_latest,
        }
    }

    pub fn mlflow_config(&self) -> MlflowConfig {
        MlflowConfig {
            tracking_uri: self.model.tracking_uri.clone(),
            model_artifact_path: self.model.model_artifact_path.clone(),
            columns_artifact_path: self.model.columns_artifact_path.clone(),
            timeout: Duration::from_secs(self.model.registry_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: ModelSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model_name() -> String {
    "diamond-price-regressor".to_string()
}

fn default_stage() -> String {
    "Production".to_string()
}

fn default_tracking_uri() -> String {
    MlflowConfig::default().tracking_uri
}

fn default_model_artifact() -> String {
    MlflowConfig::default().model_artifact_path
}

fn default_columns_artifact() -> String {
    MlflowConfig::default().columns_artifact_path
}

fn default_registry_timeout() -> u64 {
    30
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model.name, "diamond-price-regressor");
        assert_eq!(config.model.stage, "Production");
        assert!(!config.model.fallback_to_latest);
        assert_eq!(
            config.model.tracking_uri,
            "https://dagshub.com/barnabet/projet_devops.mlflow"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServiceConfig::from_yaml(
            r#"
port: 8080
model:
  stage: Staging
server:
  max_batch_size: 10
"#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model.stage, "Staging");
        assert_eq!(config.model.name, "diamond-price-regressor");
        assert_eq!(config.server.max_batch_size, 10);
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = ServiceConfig::from_yaml("port: 8080\n").unwrap();
        let cli = Cli {
            port: Some(9000),
            model_stage: Some("Staging".into()),
            tracking_uri: Some("http://localhost:5001".into()),
            allow_fallback: true,
            ..Default::default()
        };

        config.apply_overrides(&cli);

        assert_eq!(config.port, 9000);
        assert_eq!(config.model_query().stage, "Staging");
        assert!(config.model_query().fallback_to_latest);
        assert_eq!(config.mlflow_config().tracking_uri, "http://localhost:5001");
    }

    #[test]
    fn test_validation() {
        let mut config = ServiceConfig::default();
        config.server.max_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.model.stage = " ".into();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.model.local_dir = Some(PathBuf::from("/definitely/not/a/model/dir"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carat.yaml");
        std::fs::write(&path, "host: 127.0.0.1\nport: 5055\n").unwrap();

        let cli = Cli {
            config: path.display().to_string(),
            ..Default::default()
        };
        let config = ServiceConfig::load(&cli).unwrap();

        assert_eq!(config.listen_addr(), "127.0.0.1:5055");
    }
}
