use std::fmt;
use std::str::FromStr;

use entitlement_model::{schema_fields, FieldType};
use serde::{Deserialize, Serialize};

/// The all-zero UUID used as "not assigned" for ids and the default key.
pub const SENTINEL_ID: &str = "00000000-0000-0000-0000-000000000000";

schema_fields! {
    /// Persisted fields of a license record.
    pub enum LicenseField {
        ActivationId("activation_id"): FieldType::Text,
        /// Site URL sent as the activation fingerprint.
        ActivationUrl("activation_url"): FieldType::Text,
        /// Resolved site address, filled on first use.
        ActivationIp("activation_ip", nullable): FieldType::Text,
        LicenseId("license_id"): FieldType::Text,
        LicenseKey("license_key"): FieldType::Text,
        Registered("registered"): FieldType::Bool,
        Activated("activated"): FieldType::Bool,
        Counted("counted"): FieldType::Bool,
        Status("status"): FieldType::Enum(LicenseStatus::NAMES),
        UsageCount("usage_count"): FieldType::Integer,
        /// Zero means unlimited.
        UsageLimit("usage_limit"): FieldType::Integer,
        CreatedAt("created_at", nullable): FieldType::Timestamp,
        RevokesAt("revokes_at", nullable): FieldType::Timestamp,
        UpdatedAt("updated_at", nullable): FieldType::Timestamp,
        ValidatedAt("validated_at", nullable): FieldType::Timestamp,
    }
}

/// Remote-side status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Revoked,
}

impl LicenseStatus {
    pub const NAMES: &'static [&'static str] = &["active", "inactive", "revoked"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!("unknown license status: {other}")),
        }
    }
}
