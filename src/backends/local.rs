use std::path::PathBuf;

use async_trait::async_trait;

use super::{Backend, BackendConfig, BackendError};
use crate::terraform::DEFAULT_WORKSPACE;

const DEFAULT_STATE_PATH: &str = "terraform.tfstate";
const DEFAULT_WORKSPACE_DIR: &str = "terraform.tfstate.d";

/// Terraform's `local` backend: state files on disk.
///
/// The default workspace lives at `path`; other workspaces live at
/// `<workspace_dir>/<name>/terraform.tfstate`.
#[derive(Debug)]
pub struct LocalBackend {
    base_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn state_path(&self, config: &BackendConfig, workspace: &str) -> PathBuf {
        if workspace == DEFAULT_WORKSPACE {
            return self
                .base_dir
                .join(config.get("path").unwrap_or(DEFAULT_STATE_PATH));
        }
        self.base_dir
            .join(config.get("workspace_dir").unwrap_or(DEFAULT_WORKSPACE_DIR))
            .join(workspace)
            .join(DEFAULT_STATE_PATH)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn read_state(
        &self,
        config: &BackendConfig,
        workspace: &str,
    ) -> Result<Vec<u8>, BackendError> {
        let path = self.state_path(config, workspace);
        tracing::debug!(path = %path.display(), "reading local state");
        tokio::fs::read(&path)
            .await
            .map_err(|source| BackendError::Io { path, source })
    }
}
