//! Error types for the storage layer.

use entitlement_model::ModelError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl From<StorageError> for ModelError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => ModelError::Serialization(e),
            other => ModelError::Store(other.to_string()),
        }
    }
}
