//! Processing of submitted license settings.

use std::sync::Arc;

use entitlement_license::{License, LicenseResult, SiteInfo};
use tracing::warn;

use crate::check::LicenseCheck;
use crate::config::SdkConfig;
use crate::error::{ErrorKind, ServiceError, ServiceResult};
use crate::notice::Notice;
use crate::registration::{Operation, RegistrationService};

/// Runs operations submitted from a settings form and reports a notice.
#[derive(Debug)]
pub struct LicenseController {
    service: Arc<RegistrationService>,
    check: Arc<LicenseCheck>,
    site: SiteInfo,
    id: String,
    notice_code: String,
}

impl LicenseController {
    pub fn new(
        config: &SdkConfig,
        service: Arc<RegistrationService>,
        check: Arc<LicenseCheck>,
    ) -> Self {
        Self {
            service,
            check,
            site: config.site.clone(),
            id: config.id.clone(),
            notice_code: config.hook_prefix.clone(),
        }
    }

    /// The persisted license of this package.
    pub fn license(&self) -> LicenseResult<License> {
        License::load(self.site.clone(), self.id.as_str(), self.service.store().as_ref())
    }

    /// The operation the form should offer next.
    pub fn current_operation(&self) -> Operation {
        match self.license() {
            Ok(license) if license.is_activated() => Operation::Deactivate,
            Ok(_) => Operation::Activate,
            Err(e) => {
                warn!(license = %self.id, error = %e, "could not load license");
                Operation::Activate
            }
        }
    }

    /// Runs `operation` with the submitted `key` and returns the notice to show.
    ///
    /// Validation checks the stored license and ignores `key`; a failed
    /// validation revokes the license like a scheduled one.
    pub async fn submit(&self, operation: Operation, key: &str) -> Notice {
        let (license, result) = self.execute(operation, key).await;
        if let Some(license) = &license {
            match operation {
                Operation::Activate => self.check.on_activate(license, &result),
                Operation::Deactivate => self.check.on_deactivate(license, &result),
                Operation::Validate | Operation::Refresh => {}
            }
        }

        match result {
            Ok(()) => Notice::success(&self.notice_code, success_message(operation)),
            Err(err) => Notice::error(err.code(), err.message),
        }
    }

    async fn execute(
        &self,
        operation: Operation,
        key: &str,
    ) -> (Option<License>, ServiceResult<()>) {
        if operation == Operation::Validate {
            return (None, self.check.run_validation(&self.id).await);
        }
        let store = self.service.store().as_ref();
        let mut license = match License::from_data(self.site.clone(), &self.id, key, store) {
            Ok(license) => license,
            Err(e) => return (None, Err(ServiceError::failed(failure_kind(operation), e))),
        };
        let result = self.service.run(operation, &mut license).await;
        (Some(license), result)
    }
}

fn success_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Activate => "License activated successfully.",
        Operation::Deactivate => "License deactivated successfully.",
        Operation::Validate => "License validated successfully.",
        Operation::Refresh => "License refreshed successfully.",
    }
}

fn failure_kind(operation: Operation) -> ErrorKind {
    match operation {
        Operation::Activate => ErrorKind::ActivationFailed,
        Operation::Deactivate => ErrorKind::DeactivationFailed,
        Operation::Validate => ErrorKind::ValidationFailed,
        Operation::Refresh => ErrorKind::RefreshFailed,
    }
}
