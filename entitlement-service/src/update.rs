//! Release updates for an activated license.

use std::sync::Arc;
use std::time::Duration;

use entitlement_license::{License, LicenseResult, RemoteResponse, SiteInfo};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::SdkConfig;
use crate::registration::RegistrationService;

/// How long an exposed release download stays valid.
pub const EXPOSE_WINDOW: Duration = Duration::from_secs(3 * 60 * 60);

/// Answers update checks for the package's files.
#[derive(Debug)]
pub struct UpdateService {
    service: Arc<RegistrationService>,
    site: SiteInfo,
    id: String,
    slug: String,
}

impl UpdateService {
    pub fn new(config: &SdkConfig, service: Arc<RegistrationService>) -> Self {
        Self {
            service,
            site: config.site.clone(),
            id: config.id.clone(),
            slug: config.package_slug().to_string(),
        }
    }

    /// True if `package_file` belongs to this package.
    pub fn can_update(&self, package_file: &str) -> bool {
        package_file.starts_with(&self.slug)
    }

    /// Release metadata for `package_file`, with `download_link` and
    /// `package` pointing at an exposed download.
    ///
    /// `None` if the file is not ours, the license is not activated, or the
    /// remote has no release to offer.
    pub async fn update_data(
        &self,
        package_file: &str,
    ) -> LicenseResult<Option<Map<String, Value>>> {
        if !self.can_update(package_file) {
            return Ok(None);
        }
        let license = License::load(
            self.site.clone(),
            self.id.as_str(),
            self.service.store().as_ref(),
        )?;
        if !license.is_activated() {
            return Ok(None);
        }

        let response = self
            .service
            .client()
            .expose_release(license.license_key(), license.activation_id(), EXPOSE_WINDOW)
            .await?;
        let release = match response {
            RemoteResponse::Record(release) => release,
            RemoteResponse::Error(e) => {
                debug!(license = %self.id, error = %e, "no release exposed");
                return Ok(None);
            }
        };
        let Some(Value::Object(mut data)) = release.release_json else {
            return Ok(None);
        };

        let url = release.url.map(Value::String).unwrap_or(Value::Null);
        data.insert("download_link".to_string(), url.clone());
        data.insert("package".to_string(), url);
        Ok(Some(data))
    }
}
