//! Remote-call-backed license operations.
//!
//! Each operation runs under a lock keyed by the license identity and starts
//! by re-reading the persisted license, so concurrent callers holding stale
//! copies of the same license serialize instead of repeating remote calls.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use entitlement_license::{EntitlementClient, License, LicenseResult};
use entitlement_model::RecordStore;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, ServiceError, ServiceResult};

/// An operation a caller can request on a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Activate,
    Deactivate,
    Validate,
    Refresh,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Validate => "validate",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "validate" => Ok(Self::Validate),
            "refresh" => Ok(Self::Refresh),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// One async lock per license identity. An entry lives while some caller
/// holds or waits on it.
#[derive(Debug, Default)]
struct IdentityLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl IdentityLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire(&self, id: &str) -> IdentityGuard<'_> {
        let lock = self.map().entry(id.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        IdentityGuard {
            locks: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    fn release(&self, id: &str) {
        let mut locks = self.map();
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    fn len(&self) -> usize {
        self.map().len()
    }
}

/// Holds an identity lock; drops the map entry once nobody else needs it.
struct IdentityGuard<'a> {
    locks: &'a IdentityLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for IdentityGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(&self.id);
    }
}

/// Drives licenses through register/activate/validate/deactivate/refresh.
pub struct RegistrationService {
    client: Arc<dyn EntitlementClient>,
    store: Arc<dyn RecordStore>,
    locks: IdentityLocks,
}

impl fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationService").finish_non_exhaustive()
    }
}

impl RegistrationService {
    pub fn new(client: Arc<dyn EntitlementClient>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            client,
            store,
            locks: IdentityLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<dyn EntitlementClient> {
        &self.client
    }

    /// Number of identities with a live lock.
    pub fn locked_identities(&self) -> usize {
        self.locks.len()
    }

    /// Runs `operation` on `license`.
    pub async fn run(&self, operation: Operation, license: &mut License) -> ServiceResult<()> {
        match operation {
            Operation::Activate => self.activate(license).await,
            Operation::Deactivate => self.deactivate(license).await,
            Operation::Validate => self.validate(license).await,
            Operation::Refresh => self.refresh(license).await,
        }
    }

    /// Registration is performed as the first step of [`activate`](Self::activate).
    pub async fn register(&self, _license: &mut License) -> ServiceResult<()> {
        Ok(())
    }

    /// Registers the license if needed, then activates it if needed.
    ///
    /// A successful registration is persisted even if the activation that
    /// follows fails.
    pub async fn activate(&self, license: &mut License) -> ServiceResult<()> {
        let _guard = self.locks.acquire(license.id()).await;
        self.sync(ErrorKind::ActivationFailed, license)?;
        let result = self.do_activate(license).await;
        self.finish(ErrorKind::ActivationFailed, license.id(), result)
    }

    /// Deletes the remote activation and resets the license. A license that
    /// is not activated is left alone.
    pub async fn deactivate(&self, license: &mut License) -> ServiceResult<()> {
        let _guard = self.locks.acquire(license.id()).await;
        self.sync(ErrorKind::DeactivationFailed, license)?;
        let result = self.do_deactivate(license).await;
        self.finish(ErrorKind::DeactivationFailed, license.id(), result)
    }

    /// Checks the activation against the remote record.
    pub async fn validate(&self, license: &mut License) -> ServiceResult<()> {
        let _guard = self.locks.acquire(license.id()).await;
        self.sync(ErrorKind::ValidationFailed, license)?;

        if !license.is_registered() {
            return Err(ServiceError::not_registered());
        }
        if !license.is_activated() {
            return Err(ServiceError::not_activated());
        }

        let result = self.do_validate(license).await;
        self.finish(ErrorKind::ValidationFailed, license.id(), result)
    }

    /// Re-applies the remote license data, keeping the local status.
    pub async fn refresh(&self, license: &mut License) -> ServiceResult<()> {
        let _guard = self.locks.acquire(license.id()).await;
        self.sync(ErrorKind::RefreshFailed, license)?;
        let result = self.do_refresh(license).await;
        self.finish(ErrorKind::RefreshFailed, license.id(), result)
    }

    /// Marks the license revoked and persists it.
    pub async fn revoke(&self, license: &mut License) -> ServiceResult<()> {
        let _guard = self.locks.acquire(license.id()).await;
        self.sync(ErrorKind::RevocationFailed, license)?;
        let result = license
            .revoke()
            .and_then(|()| license.save(self.store.as_ref()));
        self.finish(ErrorKind::RevocationFailed, license.id(), result)
    }

    /// Replaces the license baseline with the persisted record.
    fn sync(&self, kind: ErrorKind, license: &mut License) -> ServiceResult<()> {
        match license.sync(self.store.as_ref()) {
            Ok(found) => {
                debug!(license = %license.id(), found, "synced license baseline");
                Ok(())
            }
            Err(e) => Err(ServiceError::failed(kind, e)),
        }
    }

    fn finish(&self, kind: ErrorKind, id: &str, result: LicenseResult<()>) -> ServiceResult<()> {
        match result {
            Ok(()) => {
                info!(license = %id, operation = %kind, "license operation succeeded");
                Ok(())
            }
            Err(e) => {
                let err = ServiceError::failed(kind, e);
                warn!(license = %id, code = err.code(), "{}", err.message);
                Err(err)
            }
        }
    }

    async fn do_activate(&self, license: &mut License) -> LicenseResult<()> {
        if !license.is_registered() {
            let response = self.client.show_license(license.license_key()).await?;
            license.register(&response)?;
            license.save(self.store.as_ref())?;
        }
        if !license.is_activated() {
            let response = self
                .client
                .create_activation(&license.activation_payload())
                .await?;
            license.activate(&response)?;
            license.save(self.store.as_ref())?;
        }
        Ok(())
    }

    async fn do_deactivate(&self, license: &mut License) -> LicenseResult<()> {
        if !license.is_activated() {
            return Ok(());
        }
        self.client.delete_activation(license.activation_id()).await?;
        license.delete(self.store.as_ref())
    }

    async fn do_validate(&self, license: &mut License) -> LicenseResult<()> {
        let response = self.client.show_activation(license.activation_id()).await?;
        license.validate(&response)?;
        license.save(self.store.as_ref())
    }

    async fn do_refresh(&self, license: &mut License) -> LicenseResult<()> {
        let response = self.client.show_license(license.license_key()).await?;
        license.refresh(&response)?;
        license.save(self.store.as_ref())
    }
}
