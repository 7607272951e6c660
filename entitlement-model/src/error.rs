//! Error types for the record model.

use std::fmt;

use thiserror::Error;

/// Result type for record operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// A single field write that was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the field the write targeted.
    pub field: &'static str,
    /// Why the value was rejected.
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldError {}

/// Errors that can occur while mutating or persisting a record.
#[derive(Debug, Error)]
pub enum ModelError {
    /// One or more fields of a batch write were rejected.
    #[error("{} field(s) rejected: {}", .0.len(), join_failures(.0))]
    Persistence(Vec<FieldError>),

    /// The record has no identity and cannot be keyed in a store.
    #[error("identity is required to persist a {0} record")]
    MissingIdentity(&'static str),

    /// A save tried to give an identified record another identity.
    #[error("identity {current} cannot change to {requested}")]
    IdentityChange { current: String, requested: String },

    /// The persisted value under a key is not a record object.
    #[error("corrupt record under key {0}")]
    Corrupt(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Returns the per-field failures of a rejected batch, if any.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Persistence(errors) => errors,
            _ => &[],
        }
    }
}

fn join_failures(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
