pub mod http;
pub mod local;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

use self::http::HttpBackend;
use self::local::LocalBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("backend configuration error: {0}")]
    Configuration(String),

    #[error("{backend} backend does not support workspaces (requested '{workspace}')")]
    WorkspacesUnsupported { backend: String, workspace: String },

    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error ({status}) from {url}")]
    Http { status: u16, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// The `backend` block of a state file: where the real state lives.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub backend_type: String,
    #[serde(default, deserialize_with = "deserialize_config")]
    pub config: HashMap<String, Option<String>>,
}

impl BackendConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_deref())
    }

    pub fn require(&self, key: &str) -> Result<&str, BackendError> {
        self.get(key).ok_or_else(|| {
            BackendError::Configuration(format!(
                "{} backend requires '{key}'",
                self.backend_type
            ))
        })
    }
}

// Scalars other than strings keep their JSON text; `null` means unset.
fn deserialize_config<'de, D>(deserializer: D) -> Result<HashMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            (key, value)
        })
        .collect())
}

/// Fetches the raw bytes of a remote state for a workspace.
#[async_trait]
pub trait StateFetcher: Send + Sync {
    async fn fetch(&self, backend: &BackendConfig, workspace: &str)
    -> Result<Vec<u8>, BackendError>;
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;
    async fn read_state(
        &self,
        config: &BackendConfig,
        workspace: &str,
    ) -> Result<Vec<u8>, BackendError>;
}

/// Resolves backend blocks through the built-in backends.
///
/// `base_dir` anchors relative paths of the `local` backend. The http client
/// is built on first use and shared by later fetches.
#[derive(Debug)]
pub struct BackendRegistry {
    local: LocalBackend,
    http: OnceCell<HttpBackend>,
}

impl BackendRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            local: LocalBackend::new(base_dir),
            http: OnceCell::new(),
        }
    }

    pub async fn get_backend(&self, name: &str) -> Result<&dyn Backend, BackendError> {
        match name {
            "local" => Ok(&self.local),
            "http" => {
                let http = self
                    .http
                    .get_or_try_init(|| async { HttpBackend::new() })
                    .await?;
                Ok(http as &dyn Backend)
            }
            other => Err(BackendError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl StateFetcher for BackendRegistry {
    async fn fetch(
        &self,
        backend: &BackendConfig,
        workspace: &str,
    ) -> Result<Vec<u8>, BackendError> {
        let reader = self.get_backend(&backend.backend_type).await?;
        tracing::info!(backend = reader.name(), workspace, "fetching remote state");
        reader.read_state(backend, workspace).await
    }
}
