use async_trait::async_trait;

use super::{Backend, BackendConfig, BackendError};
use crate::terraform::DEFAULT_WORKSPACE;

/// Terraform's `http` backend: the state is a document served at `address`.
///
/// Optional `username`/`password` are sent as basic auth. The http backend
/// has no workspaces, so only the default workspace can be read.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tfstate-lookup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn read_state(
        &self,
        config: &BackendConfig,
        workspace: &str,
    ) -> Result<Vec<u8>, BackendError> {
        if workspace != DEFAULT_WORKSPACE {
            return Err(BackendError::WorkspacesUnsupported {
                backend: self.name().to_string(),
                workspace: workspace.to_string(),
            });
        }

        let address = config.require("address")?;
        let mut request = self.client.get(address);
        if let Some(username) = config.get("username") {
            request = request.basic_auth(username, config.get("password"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                url: address.to_string(),
            });
        }

        tracing::debug!(%status, "http state fetched");
        Ok(response.bytes().await?.to_vec())
    }
}
