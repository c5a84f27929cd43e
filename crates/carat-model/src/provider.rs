//! Model provider trait and registry credentials

use crate::model_loader::{LoadedModel, ModelHandle};
use async_trait::async_trait;
use carat_core::Result;
use std::fmt;

/// Source of registered models
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Resolve the newest version of `model_name` in `stage`.
    ///
    /// `None` means the newest version regardless of stage. Returns
    /// `Error::ModelNotFound` when nothing matches.
    async fn fetch_latest(&self, model_name: &str, stage: Option<&str>) -> Result<ModelHandle>;

    /// Fetch and validate the artifacts behind `handle`
    async fn load(&self, handle: &ModelHandle) -> Result<LoadedModel>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Basic-auth credentials for the model registry.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Variable pairs checked in order; DagsHub names win over MLflow ones
    pub const ENV_PAIRS: [(&'static str, &'static str); 2] = [
        ("DAGSHUB_USERNAME", "DAGSHUB_TOKEN"),
        ("MLFLOW_TRACKING_USERNAME", "MLFLOW_TRACKING_PASSWORD"),
    ];

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; the first complete pair wins
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self::ENV_PAIRS.iter().find_map(|(user_key, pass_key)| {
            match (non_empty(user_key), non_empty(pass_key)) {
                (Some(username), Some(password)) => Some(Self::new(username, password)),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_dagshub_credentials_take_precedence() {
        let creds = Credentials::from_lookup(lookup(&[
            ("DAGSHUB_USERNAME", "dag"),
            ("DAGSHUB_TOKEN", "tok"),
            ("MLFLOW_TRACKING_USERNAME", "ml"),
            ("MLFLOW_TRACKING_PASSWORD", "pw"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("dag", "tok"));
    }

    #[test]
    fn test_falls_back_to_mlflow_names() {
        let creds = Credentials::from_lookup(lookup(&[
            ("DAGSHUB_USERNAME", "dag"),
            ("MLFLOW_TRACKING_USERNAME", "ml"),
            ("MLFLOW_TRACKING_PASSWORD", "pw"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("ml", "pw"));
    }

    #[test]
    fn test_incomplete_or_blank_pairs_are_ignored() {
        assert!(Credentials::from_lookup(lookup(&[("DAGSHUB_USERNAME", "dag")])).is_none());
        assert!(Credentials::from_lookup(lookup(&[
            ("DAGSHUB_USERNAME", "dag"),
            ("DAGSHUB_TOKEN", "  "),
        ]))
        .is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("user", "s3cret"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("s3cret"));
    }
}
