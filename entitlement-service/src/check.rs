//! Reactions to license operations and scheduled validations.

use std::sync::Arc;

use entitlement_license::{License, SiteInfo};
use entitlement_model::RecordStore;
use tracing::{info, warn};

use crate::config::SdkConfig;
use crate::error::{ErrorKind, ServiceError, ServiceResult};
use crate::notice::{Notice, NoticeBoard};
use crate::registration::RegistrationService;
use crate::scheduler::ValidationScheduler;

/// Keeps the validation schedule and invalid-license notices in step with
/// the outcome of license operations.
#[derive(Debug)]
pub struct LicenseCheck {
    service: Arc<RegistrationService>,
    scheduler: Arc<ValidationScheduler>,
    notices: Arc<NoticeBoard>,
    site: SiteInfo,
    product: String,
    notice_id: String,
}

impl LicenseCheck {
    pub fn new(
        config: &SdkConfig,
        service: Arc<RegistrationService>,
        scheduler: Arc<ValidationScheduler>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            service,
            scheduler,
            notices,
            site: config.site.clone(),
            product: config.display_name().to_string(),
            notice_id: config.hook_name("license_invalid"),
        }
    }

    /// Id of the persistent notice raised when the license turns invalid.
    pub fn notice_id(&self) -> &str {
        &self.notice_id
    }

    fn store(&self) -> &dyn RecordStore {
        self.service.store().as_ref()
    }

    /// After an activation attempt: validate on a schedule if it succeeded,
    /// stop validating if it failed.
    pub fn on_activate(&self, license: &License, result: &ServiceResult<()>) {
        if result.is_err() {
            self.scheduler.disable(license.id());
        } else {
            self.scheduler.enable(license.id());
        }
    }

    /// After a deactivation attempt: stop validating if it succeeded.
    pub fn on_deactivate(&self, license: &License, result: &ServiceResult<()>) {
        if result.is_ok() {
            self.scheduler.disable(license.id());
        }
    }

    /// Validates the license stored under `id`.
    ///
    /// On failure the license is revoked and persisted and a notice is
    /// raised. The schedule is left in place so a later run can recover.
    pub async fn run_validation(&self, id: &str) -> ServiceResult<()> {
        let mut license = License::load(self.site.clone(), id, self.store())
            .map_err(|e| ServiceError::failed(ErrorKind::ValidationFailed, e))?;

        let Err(err) = self.service.validate(&mut license).await else {
            return Ok(());
        };

        warn!(license = %id, code = err.code(), "scheduled validation failed");
        if let Err(revoke_err) = self.service.revoke(&mut license).await {
            warn!(license = %id, error = %revoke_err, "could not persist revocation");
        }
        self.notices
            .raise(&Notice::license_invalid(&self.notice_id, &self.product, &err));
        Err(err)
    }

    /// Activates the license under `id` with a key from an older install,
    /// then drops the record under `legacy_option`.
    ///
    /// On failure the license is revoked and a notice is raised; the legacy
    /// record is kept.
    pub async fn migrate(
        &self,
        id: &str,
        legacy_key: &str,
        legacy_option: &str,
    ) -> ServiceResult<()> {
        let mut license = License::from_data(self.site.clone(), id, legacy_key, self.store())
            .map_err(|e| ServiceError::failed(ErrorKind::ActivationFailed, e))?;

        let result = self.service.activate(&mut license).await;
        self.on_activate(&license, &result);

        match result {
            Ok(()) => {
                if let Err(e) = self.store().delete(legacy_option) {
                    warn!(
                        license = %id,
                        legacy_option,
                        error = %e,
                        "could not drop legacy license record"
                    );
                }
                info!(license = %id, "legacy license migrated");
                Ok(())
            }
            Err(err) => {
                self.notices
                    .raise(&Notice::license_invalid(&self.notice_id, &self.product, &err));
                if let Err(revoke_err) = self.service.revoke(&mut license).await {
                    warn!(license = %id, error = %revoke_err, "could not persist revocation");
                }
                Err(err)
            }
        }
    }
}
