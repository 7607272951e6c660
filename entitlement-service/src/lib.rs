//! License orchestration for one licensed package.
//!
//! Builds on [`entitlement_license`] to run license operations against the
//! remote entitlement API and keep the surrounding state in step:
//! - [`RegistrationService`]: activate, deactivate, validate, refresh, each
//!   serialized per license and reported as a tagged [`ServiceError`]
//! - [`ValidationScheduler`]: recurring validation through a [`SchedulerHost`]
//! - [`LicenseCheck`]: schedule and notice reactions to operation outcomes
//! - [`LicenseController`]: settings-form submissions
//! - [`UpdateService`]: release downloads for an activated license
//!
//! [`Sdk`] wires these together from an [`SdkConfig`].

mod check;
mod config;
mod controller;
mod error;
mod notice;
mod registration;
mod scheduler;
mod sdk;
mod update;

pub use check::LicenseCheck;
pub use config::{ConfigError, ConfigResult, SdkConfig};
pub use controller::LicenseController;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use registration::{Operation, RegistrationService};
pub use scheduler::{
    next_midnight, MemorySchedulerHost, ScheduledJob, SchedulerHost, ValidationScheduler,
    VALIDATION_INTERVAL_HOURS,
};
pub use sdk::Sdk;
pub use update::{UpdateService, EXPOSE_WINDOW};
