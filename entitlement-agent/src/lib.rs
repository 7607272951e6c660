//! Host process for one licensed package.
//!
//! Wires the license components over a SQLite store and the HTTP client,
//! runs operator commands, and fires scheduled validations from an
//! in-process scheduler.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use entitlement_license::{EntitlementClient, HttpClient, LicenseStatus};
use entitlement_service::{
    MemorySchedulerHost, Notice, Operation, Sdk, SdkConfig, ServiceResult,
};
use entitlement_storage::SqliteStore;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Summary of the stored license, printed by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub id: String,
    pub state: String,
    pub status: LicenseStatus,
    pub license_id: String,
    pub activation_id: String,
    pub usage_count: i64,
    pub usage_limit: i64,
    pub validated_at: Option<i64>,
    pub revokes_at: Option<i64>,
    pub next_validation: Option<DateTime<Utc>>,
    /// Message of the outstanding invalid-license notice, if any.
    pub notice: Option<String>,
}

pub struct Agent {
    sdk: Sdk,
    host: Arc<MemorySchedulerHost>,
}

impl Agent {
    /// An agent talking to the configured entitlement API.
    pub fn new(config: SdkConfig, store: SqliteStore) -> Result<Self> {
        let client =
            HttpClient::new(config.client_config()).context("failed to build HTTP client")?;
        Ok(Self::with_client(config, store, Arc::new(client)))
    }

    pub fn with_client(
        config: SdkConfig,
        store: SqliteStore,
        client: Arc<dyn EntitlementClient>,
    ) -> Self {
        let host = Arc::new(MemorySchedulerHost::new());
        let sdk = Sdk::new(config, client, Arc::new(store), host.clone());
        Self { sdk, host }
    }

    pub fn sdk(&self) -> &Sdk {
        &self.sdk
    }

    pub fn status(&self) -> Result<StatusReport> {
        let license = self.sdk.license()?;
        let notice = self.sdk.notices().get(self.sdk.check().notice_id())?;
        Ok(StatusReport {
            id: license.id().to_string(),
            state: format!("{:?}", license.state()).to_lowercase(),
            status: license.status(),
            license_id: license.license_id().to_string(),
            activation_id: license.activation_id().to_string(),
            usage_count: license.usage_count(),
            usage_limit: license.usage_limit(),
            validated_at: license.validated_at(),
            revokes_at: license.revokes_at(),
            next_validation: self.sdk.scheduler().next_validation(license.id()),
            notice: notice.map(|n| n.message),
        })
    }

    /// Runs an operator command. Without `key`, the stored license key is used.
    pub async fn execute(&self, operation: Operation, key: Option<&str>) -> Result<Notice> {
        let key = match key {
            Some(key) => key.to_string(),
            None => self.sdk.license()?.license_key().to_string(),
        };
        let notice = self.sdk.controller().submit(operation, &key).await;
        if notice.is_error() {
            warn!(operation = %operation, code = %notice.id, "{}", notice.message);
        } else {
            info!(operation = %operation, "{}", notice.message);
        }
        Ok(notice)
    }

    /// Re-enables scheduled validation for an activated license.
    ///
    /// The in-process scheduler starts empty on every run.
    pub fn resume(&self) -> Result<bool> {
        let license = self.sdk.license()?;
        if !license.is_activated() {
            debug!(license = %license.id(), "license not activated, nothing to schedule");
            return Ok(false);
        }
        self.sdk.scheduler().enable(license.id());
        Ok(true)
    }

    /// Fires the validations due at `now`.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<(String, ServiceResult<()>)> {
        let mut results = Vec::new();
        for job in self.host.due(now) {
            let Some(id) = self.sdk.scheduler().license_of(&job) else {
                debug!(trigger = %job.trigger, "ignoring unknown trigger");
                continue;
            };
            let result = self.sdk.check().run_validation(id).await;
            match &result {
                Ok(()) => info!(license = %id, "scheduled validation passed"),
                Err(e) => warn!(
                    license = %id,
                    code = e.code(),
                    "scheduled validation failed: {}",
                    e.message
                ),
            }
            results.push((id.to_string(), result));
        }
        results
    }

    /// Checks for due validations every `period` until `shutdown` resolves.
    pub async fn run(&self, period: Duration, shutdown: impl Future<Output = ()>) -> Result<()> {
        if self.resume()? {
            info!("validation scheduled");
        }
        let mut ticker = tokio::time::interval(period);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
                _ = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
            }
        }
    }
}
