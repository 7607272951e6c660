use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use entitlement_model::{FieldError, FieldKey, Record, RecordStore, Schema};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{LicenseError, LicenseResult};
use crate::fields::{LicenseField, LicenseStatus, SENTINEL_ID};
use crate::remote::{ActivationRequest, RemoteActivation, RemoteLicense, RemoteResponse};
use crate::site::{is_public_ip, SiteInfo};

/// How long a successful validation keeps a license in the `Validated` state.
pub const VALIDATION_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Schema of the license record. Carries the site, which the
/// `activation_url` default depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseSchema {
    site: SiteInfo,
}

impl LicenseSchema {
    pub fn new(site: SiteInfo) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteInfo {
        &self.site
    }
}

impl Schema for LicenseSchema {
    type Field = LicenseField;

    const OBJECT_TYPE: &'static str = "license";

    fn default_value(&self, field: LicenseField) -> Value {
        use LicenseField::*;
        match field {
            ActivationId | LicenseId | LicenseKey => Value::from(SENTINEL_ID),
            ActivationUrl => Value::from(self.site.url.clone()),
            Registered | Activated | Counted => Value::Bool(false),
            Status => Value::from(LicenseStatus::Revoked.as_str()),
            UsageCount | UsageLimit => Value::from(0),
            ActivationIp | CreatedAt | RevokesAt | UpdatedAt | ValidatedAt => Value::Null,
        }
    }
}

/// Position of a license in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    Unregistered,
    Registered,
    Activated,
    /// Activated and validated within [`VALIDATION_WINDOW_SECS`].
    Validated,
    Revoked,
}

/// The license entitlement of one installation.
///
/// Transitions stage their field changes on the underlying record; the
/// changes reach the store on [`save`](Self::save). A transition that fails
/// leaves the license untouched.
pub struct License {
    record: Record<LicenseSchema>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("License")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl License {
    /// A license with defaults and no identity.
    pub fn new(site: SiteInfo) -> Self {
        Self::with_id(site, "")
    }

    /// A license with defaults under `id`.
    pub fn with_id(site: SiteInfo, id: impl Into<String>) -> Self {
        Self {
            record: Record::with_identity(LicenseSchema::new(site), id),
            clock: Arc::new(SystemClock),
        }
    }

    /// Loads the license persisted under `id`, or defaults if none is stored.
    pub fn load(
        site: SiteInfo,
        id: impl Into<String>,
        store: &dyn RecordStore,
    ) -> LicenseResult<Self> {
        Ok(Self {
            record: Record::load(LicenseSchema::new(site), id, store)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Builds the license a submitted key applies to: the persisted license
    /// under `id` (empty for none) with `key` staged as its license key.
    pub fn from_data(
        site: SiteInfo,
        id: &str,
        key: &str,
        store: &dyn RecordStore,
    ) -> LicenseResult<Self> {
        let mut license = Self::load(site, id, store)?;
        license.record.stage(LicenseField::LicenseKey, key)?;
        Ok(license)
    }

    /// Replaces the time source used for `validated_at` and [`state`](Self::state).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn site(&self) -> &SiteInfo {
        self.record.schema().site()
    }

    pub fn record(&self) -> &Record<LicenseSchema> {
        &self.record
    }

    // ── Fields ───────────────────────────────────────────────────────

    pub fn activation_id(&self) -> &str {
        self.text(LicenseField::ActivationId)
    }

    pub fn activation_url(&self) -> &str {
        self.text(LicenseField::ActivationUrl)
    }

    pub fn license_id(&self) -> &str {
        self.text(LicenseField::LicenseId)
    }

    pub fn license_key(&self) -> &str {
        self.text(LicenseField::LicenseKey)
    }

    pub fn set_license_key(&mut self, key: &str) -> LicenseResult<&mut Self> {
        self.record.set(LicenseField::LicenseKey, key)?;
        Ok(self)
    }

    pub fn status(&self) -> LicenseStatus {
        self.text(LicenseField::Status)
            .parse()
            .unwrap_or(LicenseStatus::Revoked)
    }

    pub fn usage_count(&self) -> i64 {
        self.record.get(LicenseField::UsageCount).as_i64().unwrap_or(0)
    }

    pub fn usage_limit(&self) -> i64 {
        self.record.get(LicenseField::UsageLimit).as_i64().unwrap_or(0)
    }

    pub fn created_at(&self) -> Option<i64> {
        self.record.get(LicenseField::CreatedAt).as_i64()
    }

    pub fn revokes_at(&self) -> Option<i64> {
        self.record.get(LicenseField::RevokesAt).as_i64()
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.record.get(LicenseField::UpdatedAt).as_i64()
    }

    pub fn validated_at(&self) -> Option<i64> {
        self.record.get(LicenseField::ValidatedAt).as_i64()
    }

    /// The activation fingerprint: the site URL.
    pub fn fingerprint(&self) -> &str {
        &self.site().url
    }

    pub fn name(&self) -> &str {
        &self.site().name
    }

    /// The resolved site address, resolving and caching it on first use.
    pub fn activation_ip(&mut self) -> String {
        if let Some(ip) = self.record.get(LicenseField::ActivationIp).as_str() {
            return ip.to_string();
        }
        let ip = self.site().resolve_ip();
        if let Err(e) = self.record.set(LicenseField::ActivationIp, ip.as_str()) {
            warn!(license = %self.id(), error = %e, "could not cache activation ip");
        }
        ip
    }

    /// Body for creating an activation of this license on this site.
    pub fn activation_payload(&self) -> ActivationRequest {
        ActivationRequest {
            fingerprint: self.fingerprint().to_string(),
            name: self.name().to_string(),
            license: self.license_id().to_string(),
        }
    }

    // ── Predicates ───────────────────────────────────────────────────

    pub fn is_registered(&self) -> bool {
        self.flag(LicenseField::Registered)
    }

    /// Activated, with a real activation id assigned.
    pub fn is_activated(&self) -> bool {
        self.flag(LicenseField::Activated) && self.activation_id() != SENTINEL_ID
    }

    pub fn is_counted(&self) -> bool {
        self.flag(LicenseField::Counted)
    }

    /// True if the site address is private, reserved or unparseable, or if
    /// the activation does not consume a usage slot.
    pub fn is_local(&mut self) -> bool {
        let public = self
            .activation_ip()
            .parse::<IpAddr>()
            .is_ok_and(is_public_ip);
        !public || !self.is_counted()
    }

    /// True if the license has no identity yet or its identity is `id`.
    pub fn is_valid(&self, id: &str) -> bool {
        self.id().is_empty() || self.id() == id
    }

    /// True if the license carries a revocation time that has passed.
    pub fn is_expired(&self) -> bool {
        self.revokes_at()
            .is_some_and(|at| at <= self.clock.now().timestamp())
    }

    pub fn state(&self) -> LicenseState {
        if !self.is_registered() {
            return LicenseState::Unregistered;
        }
        if self.status() == LicenseStatus::Revoked {
            return LicenseState::Revoked;
        }
        if !self.is_activated() {
            return LicenseState::Registered;
        }
        let now = self.clock.now().timestamp();
        match self.validated_at() {
            Some(at) if now - at < VALIDATION_WINDOW_SECS => LicenseState::Validated,
            _ => LicenseState::Activated,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Binds the license to a remote license. An absent status defaults to active.
    pub fn register(&mut self, response: &RemoteResponse<RemoteLicense>) -> LicenseResult<()> {
        let remote = response.record()?;
        let status = remote
            .status
            .clone()
            .unwrap_or_else(|| LicenseStatus::Active.as_str().to_string());
        let mut batch = license_batch(remote);
        batch.push((LicenseField::Status, Value::from(status)));
        self.stage(batch)?;
        debug!(license = %self.id(), license_id = %self.license_id(), "license registered");
        Ok(())
    }

    /// Applies re-fetched license data without touching the status.
    pub fn refresh(&mut self, response: &RemoteResponse<RemoteLicense>) -> LicenseResult<()> {
        let remote = response.record()?;
        self.stage(license_batch(remote))?;
        debug!(license = %self.id(), "license refreshed");
        Ok(())
    }

    /// Records a created activation. A counted activation takes one usage slot.
    pub fn activate(&mut self, response: &RemoteResponse<RemoteActivation>) -> LicenseResult<()> {
        let remote = response.record()?;
        let activation_id = remote
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LicenseError::InvalidResponse("activation has no id".to_string()))?;
        let counted = remote.counted.unwrap_or(false);
        let usage_count = self.usage_count() + i64::from(counted);

        self.stage(vec![
            (LicenseField::Activated, Value::Bool(true)),
            (LicenseField::ActivationId, Value::from(activation_id)),
            (LicenseField::Counted, Value::Bool(counted)),
            (LicenseField::ValidatedAt, Value::from(self.clock.now().timestamp())),
            (LicenseField::Status, Value::from(LicenseStatus::Active.as_str())),
            (LicenseField::UsageCount, Value::from(usage_count)),
        ])?;
        debug!(license = %self.id(), activation_id, counted, "license activated");
        Ok(())
    }

    /// Confirms that a fetched activation still belongs to this site and license.
    pub fn validate(&mut self, response: &RemoteResponse<RemoteActivation>) -> LicenseResult<()> {
        let remote = response.record()?;
        if remote.fingerprint.as_deref() != Some(self.fingerprint()) {
            return Err(LicenseError::InvalidResponse(
                "activation fingerprint does not match this site".to_string(),
            ));
        }
        if remote.license.as_deref() != Some(self.license_id()) {
            return Err(LicenseError::InvalidResponse(
                "activation belongs to another license".to_string(),
            ));
        }

        self.stage(vec![
            (LicenseField::ValidatedAt, Value::from(self.clock.now().timestamp())),
            (LicenseField::Status, Value::from(LicenseStatus::Active.as_str())),
        ])?;
        debug!(license = %self.id(), "license validated");
        Ok(())
    }

    /// Marks the license as no longer entitled.
    pub fn revoke(&mut self) -> LicenseResult<()> {
        self.stage(vec![
            (LicenseField::Activated, Value::Bool(false)),
            (LicenseField::Status, Value::from(LicenseStatus::Revoked.as_str())),
        ])
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Commits staged changes and persists the license.
    pub fn save(&mut self, store: &dyn RecordStore) -> LicenseResult<()> {
        self.record.save(store)?;
        Ok(())
    }

    /// Resets the license to defaults and removes it from the store.
    pub fn delete(&mut self, store: &dyn RecordStore) -> LicenseResult<()> {
        self.record.delete(store)?;
        Ok(())
    }

    /// Re-reads the persisted state, keeping staged changes.
    pub fn sync(&mut self, store: &dyn RecordStore) -> LicenseResult<bool> {
        Ok(self.record.sync_baseline(store)?)
    }

    pub fn is_dirty(&self) -> bool {
        self.record.is_dirty()
    }

    /// Committed state as stored, with the identity under `id`.
    pub fn materialize(&self) -> Map<String, Value> {
        self.record.materialize()
    }

    fn stage(&mut self, batch: Vec<(LicenseField, Value)>) -> LicenseResult<()> {
        let failures: Vec<FieldError> = batch
            .iter()
            .filter_map(|(field, value)| field.check(value).err())
            .collect();
        if !failures.is_empty() {
            return Err(LicenseError::Persistence(failures));
        }
        self.record.apply(batch)?;
        Ok(())
    }

    fn text(&self, field: LicenseField) -> &str {
        self.record.get(field).as_str().unwrap_or_default()
    }

    fn flag(&self, field: LicenseField) -> bool {
        self.record.get(field).as_bool() == Some(true)
    }
}

/// Fields taken from a remote license; absent values are left out.
fn license_batch(remote: &RemoteLicense) -> Vec<(LicenseField, Value)> {
    let optional = [
        (LicenseField::LicenseId, remote.id.clone().map(Value::from)),
        (LicenseField::UsageCount, remote.activations_count.map(Value::from)),
        (LicenseField::UsageLimit, remote.activation_limit.map(Value::from)),
        (LicenseField::CreatedAt, remote.created_at.map(Value::from)),
        (LicenseField::RevokesAt, remote.revokes_at.map(Value::from)),
        (LicenseField::UpdatedAt, remote.updated_at.map(Value::from)),
    ];
    optional
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .chain(std::iter::once((LicenseField::Registered, Value::Bool(true))))
        .collect()
}
