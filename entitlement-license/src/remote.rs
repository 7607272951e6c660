//! Wire types of the remote entitlement API.
//!
//! Every endpoint answers either with the requested object or with an error
//! record. Error records are recognized by their markers (`code` or
//! `message`), not by HTTP status.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LicenseError, LicenseResult};

/// An error object returned in place of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorRecord {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(Value::String(code.into())),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Returns true if `value` carries an error marker.
    pub fn is_marked(value: &Value) -> bool {
        value.as_object().is_some_and(|object| {
            ["code", "message"]
                .iter()
                .any(|marker| object.get(*marker).is_some_and(|v| !v.is_null()))
        })
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(Value::String(code)), Some(message)) => write!(f, "{message} ({code})"),
            (Some(code), Some(message)) => write!(f, "{message} ({code})"),
            (None, Some(message)) => f.write_str(message),
            (Some(code), None) => write!(f, "error {code}"),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

/// A remote answer: the requested record or an error record.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse<T> {
    Record(T),
    Error(ErrorRecord),
}

impl<T: DeserializeOwned> RemoteResponse<T> {
    /// Classifies a raw response body.
    pub fn from_value(value: Value) -> LicenseResult<Self> {
        if ErrorRecord::is_marked(&value) {
            Ok(Self::Error(serde_json::from_value(value)?))
        } else {
            Ok(Self::Record(serde_json::from_value(value)?))
        }
    }
}

impl<T> RemoteResponse<T> {
    /// The record, or `InvalidResponse` for an error record.
    pub fn record(&self) -> LicenseResult<&T> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Error(error) => Err(LicenseError::InvalidResponse(error.to_string())),
        }
    }

    pub fn into_record(self) -> LicenseResult<T> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Error(error) => Err(LicenseError::InvalidResponse(error.to_string())),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl<T> From<T> for RemoteResponse<T> {
    fn from(record: T) -> Self {
        Self::Record(record)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RemoteResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

/// A license as returned by `GET /licenses/{key}`.
///
/// Every field is optional; absent and null fields are not applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteLicense {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub activations_count: Option<i64>,
    #[serde(default)]
    pub activation_limit: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub revokes_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    /// Kept as a string so an unknown status is rejected by the field check.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An activation as returned by the activation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteActivation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub counted: Option<bool>,
    /// Id of the license the activation belongs to.
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /activations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub fingerprint: String,
    pub name: String,
    pub license: String,
}

/// An exposed release: a time-limited download URL plus release metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub release_json: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
