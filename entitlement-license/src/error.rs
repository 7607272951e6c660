//! Error types for the license module.

use entitlement_model::{FieldError, ModelError};
use thiserror::Error;

/// License-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The remote payload carried an error marker or failed a consistency check.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Some fields of a transition batch were rejected.
    #[error("license data rejected: {}", join_failures(.0))]
    Persistence(Vec<FieldError>),

    /// Network error talking to the entitlement API.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ModelError> for LicenseError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Persistence(failures) => Self::Persistence(failures),
            ModelError::Serialization(e) => Self::Serialization(e),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<FieldError> for LicenseError {
    fn from(err: FieldError) -> Self {
        Self::Persistence(vec![err])
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

fn join_failures(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
