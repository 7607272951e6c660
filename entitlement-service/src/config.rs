//! Package configuration.

use std::path::Path;

use entitlement_license::{ClientConfig, SiteInfo, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration of one licensed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Package identity; the license record is stored under it.
    pub id: String,
    /// Display name used in operator notices.
    pub name: String,
    /// Package slug; update requests for files under it are handled.
    pub slug: String,
    /// The installation the license is bound to.
    pub site: SiteInfo,
    /// Entitlement API base URL.
    pub api_base_url: String,
    /// Public API token.
    pub public_token: String,
    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
    /// Prefix of trigger and notice ids.
    pub hook_prefix: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            slug: String::new(),
            site: SiteInfo::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            public_token: String::new(),
            http_timeout_secs: 30,
            hook_prefix: "surecart".to_string(),
        }
    }
}

impl SdkConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.id.is_empty() {
            return Err(ConfigError::Invalid("id is required".to_string()));
        }
        if self.site.url.is_empty() {
            return Err(ConfigError::Invalid("site.url is required".to_string()));
        }
        if self.hook_prefix.is_empty() {
            return Err(ConfigError::Invalid("hook_prefix is required".to_string()));
        }
        Ok(())
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Slug, falling back to the id.
    pub fn package_slug(&self) -> &str {
        if self.slug.is_empty() {
            &self.id
        } else {
            &self.slug
        }
    }

    /// `{prefix}_{id}_{suffix}`: the naming scheme of triggers and notices.
    pub fn hook_name(&self, suffix: &str) -> String {
        format!("{}_{}_{suffix}", self.hook_prefix, self.id)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            public_token: self.public_token.clone(),
            timeout_secs: self.http_timeout_secs,
        }
    }
}
