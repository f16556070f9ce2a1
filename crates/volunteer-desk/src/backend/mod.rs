//! HTTP adapter to the study administration REST backend.

pub mod rest;
pub mod wire;

pub use rest::RestBackend;

use crate::workflows::matching::directory::{ContactError, DirectoryError};
use crate::workflows::scheduling::RepositoryError;
use wire::WireError;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("BACKEND_BASE_URL is not configured")]
    MissingBaseUrl,
    #[error("request to {path} failed")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered {status}")]
    Status { path: String, status: u16 },
    #[error("unexpected payload from {path}")]
    Decode {
        path: String,
        #[source]
        source: WireError,
    },
}

impl BackendError {
    fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<BackendError> for DirectoryError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Decode { .. } => DirectoryError::Malformed(error.to_string()),
            other => DirectoryError::Unavailable(other.to_string()),
        }
    }
}

impl From<BackendError> for RepositoryError {
    fn from(error: BackendError) -> Self {
        match error.status() {
            Some(404) => RepositoryError::NotFound(error.to_string()),
            Some(400 | 409 | 422) => RepositoryError::Conflict(error.to_string()),
            _ => RepositoryError::Unavailable(error.to_string()),
        }
    }
}

impl From<BackendError> for ContactError {
    fn from(error: BackendError) -> Self {
        ContactError::Transport(error.to_string())
    }
}
