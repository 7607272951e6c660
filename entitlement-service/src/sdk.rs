use std::sync::Arc;

use entitlement_license::{Clock, EntitlementClient, License, LicenseResult};
use entitlement_model::RecordStore;

use crate::check::LicenseCheck;
use crate::config::SdkConfig;
use crate::controller::LicenseController;
use crate::notice::NoticeBoard;
use crate::registration::RegistrationService;
use crate::scheduler::{SchedulerHost, ValidationScheduler};
use crate::update::UpdateService;

/// The components of one licensed package, wired together.
#[derive(Debug, Clone)]
pub struct Sdk {
    config: Arc<SdkConfig>,
    service: Arc<RegistrationService>,
    scheduler: Arc<ValidationScheduler>,
    notices: Arc<NoticeBoard>,
    check: Arc<LicenseCheck>,
    controller: Arc<LicenseController>,
    updates: Arc<UpdateService>,
}

impl Sdk {
    pub fn new(
        config: SdkConfig,
        client: Arc<dyn EntitlementClient>,
        store: Arc<dyn RecordStore>,
        host: Arc<dyn SchedulerHost>,
    ) -> Self {
        Self::with_scheduler(
            config.clone(),
            client,
            store,
            ValidationScheduler::new(host, config.hook_prefix),
        )
    }

    /// Like [`new`](Self::new), with a scheduler driven by `clock`.
    pub fn with_clock(
        config: SdkConfig,
        client: Arc<dyn EntitlementClient>,
        store: Arc<dyn RecordStore>,
        host: Arc<dyn SchedulerHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scheduler =
            ValidationScheduler::new(host, config.hook_prefix.clone()).with_clock(clock);
        Self::with_scheduler(config, client, store, scheduler)
    }

    fn with_scheduler(
        config: SdkConfig,
        client: Arc<dyn EntitlementClient>,
        store: Arc<dyn RecordStore>,
        scheduler: ValidationScheduler,
    ) -> Self {
        let service = Arc::new(RegistrationService::new(client, store.clone()));
        let scheduler = Arc::new(scheduler);
        let notices = Arc::new(NoticeBoard::new(store));
        let check = Arc::new(LicenseCheck::new(
            &config,
            service.clone(),
            scheduler.clone(),
            notices.clone(),
        ));
        let controller = Arc::new(LicenseController::new(&config, service.clone(), check.clone()));
        let updates = Arc::new(UpdateService::new(&config, service.clone()));
        Self {
            config: Arc::new(config),
            service,
            scheduler,
            notices,
            check,
            controller,
            updates,
        }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The persisted license of this package.
    pub fn license(&self) -> LicenseResult<License> {
        License::load(
            self.config.site.clone(),
            self.config.id.as_str(),
            self.service.store().as_ref(),
        )
    }

    pub fn service(&self) -> &Arc<RegistrationService> {
        &self.service
    }

    pub fn scheduler(&self) -> &Arc<ValidationScheduler> {
        &self.scheduler
    }

    pub fn notices(&self) -> &Arc<NoticeBoard> {
        &self.notices
    }

    pub fn check(&self) -> &Arc<LicenseCheck> {
        &self.check
    }

    pub fn controller(&self) -> &Arc<LicenseController> {
        &self.controller
    }

    pub fn updates(&self) -> &Arc<UpdateService> {
        &self.updates
    }
}
