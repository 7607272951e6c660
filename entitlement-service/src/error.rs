//! Structured outcomes of orchestration operations.

use std::fmt;

use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// What kind of operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ActivationFailed,
    DeactivationFailed,
    ValidationFailed,
    RefreshFailed,
    RevocationFailed,
    LicenseNotRegistered,
    LicenseNotActivated,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::ActivationFailed => "activation_failed",
            Self::DeactivationFailed => "deactivation_failed",
            Self::ValidationFailed => "validation_failed",
            Self::RefreshFailed => "refresh_failed",
            Self::RevocationFailed => "revocation_failed",
            Self::LicenseNotRegistered => "license_not_registered",
            Self::LicenseNotActivated => "license_not_activated",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::ActivationFailed => "Activation failed",
            Self::DeactivationFailed => "Deactivation failed",
            Self::ValidationFailed => "Validation failed",
            Self::RefreshFailed => "Refresh failed",
            Self::RevocationFailed => "Revocation failed",
            Self::LicenseNotRegistered | Self::LicenseNotActivated => "",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failed operation: a tag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    /// Wraps a lower-level failure, e.g. `Activation failed: network error: …`.
    pub fn failed(kind: ErrorKind, cause: impl fmt::Display) -> Self {
        let message = match kind.prefix() {
            "" => cause.to_string(),
            prefix => format!("{prefix}: {cause}"),
        };
        Self { kind, message }
    }

    pub fn not_registered() -> Self {
        Self {
            kind: ErrorKind::LicenseNotRegistered,
            message: "License not registered.".to_string(),
        }
    }

    pub fn not_activated() -> Self {
        Self {
            kind: ErrorKind::LicenseNotActivated,
            message: "License not activated.".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}
