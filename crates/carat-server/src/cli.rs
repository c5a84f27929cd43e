use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "carat-server")]
#[command(author, version, about = "Diamond price prediction service", long_about = None)]
pub struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, env = "CARAT_CONFIG", default_value = "carat.yaml")]
    pub config: String,

    /// Listen address
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Registered model name
    #[arg(long, env = "CARAT_MODEL_NAME")]
    pub model_name: Option<String>,

    /// Registry stage to serve
    #[arg(long, env = "CARAT_MODEL_STAGE")]
    pub model_stage: Option<String>,

    /// MLflow tracking server URL
    #[arg(long, env = "MLFLOW_TRACKING_URI")]
    pub tracking_uri: Option<String>,

    /// Serve the model in this directory instead of querying the registry
    #[arg(long, env = "CARAT_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Serve the newest non-archived version when the stage has none
    #[arg(long, env = "CARAT_ALLOW_FALLBACK")]
    pub allow_fallback: bool,

    /// Log output format
    #[arg(long, env = "CARAT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
