//! Terraform state documents.
//!
//! Decodes tfstate v4 documents, follows `backend` blocks to the remote state
//! they point at, and resolves resource addresses against the result.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::Address;
use crate::backends::{BackendConfig, StateFetcher};
use crate::error::{Result, TfstateError};
use crate::object::Object;

pub const DEFAULT_WORKSPACE: &str = "default";

/// Sibling of the state file naming the active workspace.
pub const ENVIRONMENT_FILE: &str = "environment";

pub const MAX_BACKEND_REDIRECTS: usize = 8;

#[derive(Debug, Deserialize)]
struct StateDocument {
    #[serde(default)]
    resources: Option<Vec<Value>>,
    #[serde(default)]
    backend: Option<BackendConfig>,
}

impl StateDocument {
    fn decode(src: &[u8]) -> Result<Self> {
        serde_json::from_slice(src)
            .map_err(|e| TfstateError::InvalidFormat(format!("invalid json: {e}")))
    }
}

// The fields of a resource record needed to name its instances.
#[derive(Debug, Deserialize)]
struct ResourceHeader {
    #[serde(default)]
    mode: String,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    instances: Vec<InstanceHeader>,
}

#[derive(Debug, Deserialize)]
struct InstanceHeader {
    #[serde(default)]
    index_key: Option<Value>,
}

/// A state whose resources are held locally.
#[derive(Debug, Clone, PartialEq)]
pub struct TfState {
    resources: Value,
}

impl TfState {
    /// Decode a state that does not declare a backend.
    pub fn from_slice(src: &[u8]) -> Result<Self> {
        let document = StateDocument::decode(src)?;
        match document.backend {
            Some(backend) => Err(TfstateError::UnresolvedBackend(backend.backend_type)),
            None => Ok(Self::from_resources(document.resources.unwrap_or_default())),
        }
    }

    pub fn from_resources(resources: Vec<Value>) -> Self {
        Self {
            resources: Value::Array(resources),
        }
    }

    /// Decode a state, fetching the remote state through `fetcher` while
    /// the document declares a backend.
    ///
    /// The first fetch uses `workspace` (or `"default"`); remote states that
    /// redirect again are read with the default workspace.
    pub async fn read(
        src: &[u8],
        workspace: Option<&str>,
        fetcher: &dyn StateFetcher,
    ) -> Result<Self> {
        let mut workspace = workspace
            .map(str::trim)
            .filter(|ws| !ws.is_empty())
            .unwrap_or(DEFAULT_WORKSPACE);
        let mut document = StateDocument::decode(src)?;
        let mut redirects = 0;

        while let Some(backend) = document.backend.take() {
            if redirects == MAX_BACKEND_REDIRECTS {
                return Err(TfstateError::RedirectLimit(MAX_BACKEND_REDIRECTS));
            }
            redirects += 1;

            tracing::info!(
                backend = %backend.backend_type,
                workspace,
                "state is stored in a backend"
            );
            let remote = fetcher.fetch(&backend, workspace).await?;
            document = StateDocument::decode(&remote)?;
            workspace = DEFAULT_WORKSPACE;
        }

        Ok(Self::from_resources(document.resources.unwrap_or_default()))
    }

    /// Read a state file; the workspace comes from the sibling
    /// `environment` file when present.
    pub async fn read_file(path: impl AsRef<Path>, fetcher: &dyn StateFetcher) -> Result<Self> {
        Self::read_file_with_workspace(path, None, fetcher).await
    }

    /// Like [`TfState::read_file`], with an explicit workspace taking
    /// precedence over the `environment` file.
    pub async fn read_file_with_workspace(
        path: impl AsRef<Path>,
        workspace: Option<&str>,
        fetcher: &dyn StateFetcher,
    ) -> Result<Self> {
        let path = path.as_ref();
        let src = tokio::fs::read(path)
            .await
            .map_err(|source| TfstateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let workspace = match workspace {
            Some(ws) => Some(ws.to_string()),
            None => read_environment(path).await,
        };
        Self::read(&src, workspace.as_deref(), fetcher).await
    }

    pub fn resources(&self) -> &[Value] {
        self.resources
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Address of every resource instance, in document order.
    ///
    /// Managed instances with an `index_key` are listed as `type.name[key]`;
    /// data resources are listed once, as `data.type.name`.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for resource in self.resources() {
            let header = ResourceHeader::deserialize(resource)
                .map_err(|e| TfstateError::InvalidFormat(format!("malformed resource: {e}")))?;
            let prefix = header
                .module
                .as_deref()
                .map(|module| format!("{module}."))
                .unwrap_or_default();

            if header.mode == "data" {
                if !header.instances.is_empty() {
                    names.push(format!("{prefix}data.{}.{}", header.kind, header.name));
                }
                continue;
            }

            for instance in &header.instances {
                let name = match &instance.index_key {
                    Some(key) => format!("{prefix}{}.{}[{key}]", header.kind, header.name),
                    None => format!("{prefix}{}.{}", header.kind, header.name),
                };
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Resolve an address to the attributes of the instance it names, or to
    /// one attribute of it.
    ///
    /// Fails with `NotFound` when no instance matches. A missing attribute
    /// inside a matched instance resolves to `null`.
    pub fn lookup(&self, address: &str) -> Result<Object> {
        let parsed = Address::parse(address)?;
        tracing::debug!(
            address,
            resource_selector = %parsed.resource_selector,
            attribute_selector = %parsed.attribute_selector,
            "resolving address"
        );

        let attributes = parsed
            .resource_selector
            .first(&self.resources)?
            .ok_or_else(|| TfstateError::NotFound(address.to_string()))?;
        let value = parsed.attribute_selector.first(&attributes)?;
        Ok(Object::new(value.unwrap_or(Value::Null)))
    }
}

async fn read_environment(state_file: &Path) -> Option<String> {
    let file = state_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(ENVIRONMENT_FILE);
    let contents = tokio::fs::read_to_string(&file).await.ok()?;
    let workspace = contents.trim();
    if workspace.is_empty() {
        return None;
    }
    tracing::info!(file = %file.display(), workspace, "workspace from environment file");
    Some(workspace.to_string())
}
