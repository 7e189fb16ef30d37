use std::path::PathBuf;

use thiserror::Error;

use crate::backends::BackendError;
use crate::query::QueryError;

#[derive(Debug, Error)]
pub enum TfstateError {
    #[error("invalid state format: {0}")]
    InvalidFormat(String),

    #[error("invalid address: {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("state declares a {0} backend and must be read with a state fetcher")]
    UnresolvedBackend(String),

    #[error("remote state redirected more than {0} times")]
    RedirectLimit(usize),

    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TfstateError {
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TfstateError>;
