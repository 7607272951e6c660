//! Shared fakes and fixtures for service tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use entitlement_license::{
    ActivationRequest, EntitlementClient, ErrorRecord, License, LicenseError, LicenseResult,
    ReleaseInfo, RemoteActivation, RemoteLicense, RemoteResponse, SiteInfo,
};
use entitlement_model::MemoryStore;
use entitlement_service::{MemorySchedulerHost, SdkConfig, Sdk};
use serde_json::json;

pub const ID: &str = "acme-plugin";
pub const KEY: &str = "KEY-123";

pub fn site() -> SiteInfo {
    SiteInfo::new("https://shop.example.com", "Example Shop")
}

pub fn config() -> SdkConfig {
    SdkConfig {
        id: ID.to_string(),
        name: "Acme Plugin".to_string(),
        slug: "acme-plugin".to_string(),
        site: site(),
        ..SdkConfig::default()
    }
}

pub fn remote_license() -> RemoteLicense {
    RemoteLicense {
        id: Some("L1".to_string()),
        key: Some(KEY.to_string()),
        activations_count: Some(0),
        activation_limit: Some(5),
        created_at: Some(100),
        status: Some("active".to_string()),
        ..Default::default()
    }
}

pub fn remote_activation() -> RemoteActivation {
    RemoteActivation {
        id: Some("A1".to_string()),
        counted: Some(true),
        license: Some("L1".to_string()),
        fingerprint: Some(site().url),
        name: Some(site().name),
        created_at: Some(200),
        ..Default::default()
    }
}

pub fn not_found<T>() -> RemoteResponse<T> {
    RemoteResponse::Error(ErrorRecord::new("license.not_found", "License not found."))
}

/// An [`EntitlementClient`] answering from canned responses and counting calls.
pub struct FakeClient {
    pub license: Mutex<RemoteResponse<RemoteLicense>>,
    pub activation: Mutex<RemoteResponse<RemoteActivation>>,
    pub release: Mutex<RemoteResponse<ReleaseInfo>>,
    pub offline: AtomicBool,
    pub delay: Duration,
    pub show_license_calls: AtomicUsize,
    pub create_activation_calls: AtomicUsize,
    pub show_activation_calls: AtomicUsize,
    pub delete_activation_calls: AtomicUsize,
    pub expose_calls: AtomicUsize,
    pub last_request: Mutex<Option<ActivationRequest>>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            license: Mutex::new(RemoteResponse::Record(remote_license())),
            activation: Mutex::new(RemoteResponse::Record(remote_activation())),
            release: Mutex::new(RemoteResponse::Record(ReleaseInfo {
                url: Some("https://cdn.example.com/acme-plugin.zip".to_string()),
                release_json: Some(json!({"version": "2.0.0", "slug": "acme-plugin"})),
                ..Default::default()
            })),
            offline: AtomicBool::new(false),
            delay: Duration::ZERO,
            show_license_calls: AtomicUsize::new(0),
            create_activation_calls: AtomicUsize::new(0),
            show_activation_calls: AtomicUsize::new(0),
            delete_activation_calls: AtomicUsize::new(0),
            expose_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A client whose calls each take `delay`.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn set_license(&self, response: RemoteResponse<RemoteLicense>) {
        *self.license.lock().unwrap() = response;
    }

    pub fn set_activation(&self, response: RemoteResponse<RemoteActivation>) {
        *self.activation.lock().unwrap() = response;
    }

    pub fn set_release(&self, response: RemoteResponse<ReleaseInfo>) {
        *self.release.lock().unwrap() = response;
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.show_license_calls.load(Ordering::SeqCst)
            + self.create_activation_calls.load(Ordering::SeqCst)
            + self.show_activation_calls.load(Ordering::SeqCst)
            + self.delete_activation_calls.load(Ordering::SeqCst)
            + self.expose_calls.load(Ordering::SeqCst)
    }

    async fn answer<T: Clone>(
        &self,
        counter: &AtomicUsize,
        response: &Mutex<RemoteResponse<T>>,
    ) -> LicenseResult<RemoteResponse<T>> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(LicenseError::Network("connection refused".to_string()));
        }
        Ok(response.lock().unwrap().clone())
    }
}

#[async_trait]
impl EntitlementClient for FakeClient {
    async fn show_license(&self, _key: &str) -> LicenseResult<RemoteResponse<RemoteLicense>> {
        self.answer(&self.show_license_calls, &self.license).await
    }

    async fn create_activation(
        &self,
        request: &ActivationRequest,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.answer(&self.create_activation_calls, &self.activation).await
    }

    async fn show_activation(
        &self,
        _activation_id: &str,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>> {
        self.answer(&self.show_activation_calls, &self.activation).await
    }

    async fn delete_activation(&self, _activation_id: &str) -> LicenseResult<()> {
        self.answer(&self.delete_activation_calls, &self.activation)
            .await
            .map(|_| ())
    }

    async fn expose_release(
        &self,
        _key: &str,
        _activation_id: &str,
        _expose_for: Duration,
    ) -> LicenseResult<RemoteResponse<ReleaseInfo>> {
        self.answer(&self.expose_calls, &self.release).await
    }
}

/// A wired package over in-memory backends.
pub struct Harness {
    pub sdk: Sdk,
    pub client: Arc<FakeClient>,
    pub store: Arc<MemoryStore>,
    pub host: Arc<MemorySchedulerHost>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_client(FakeClient::new())
    }

    pub fn with_client(client: Arc<FakeClient>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let host = Arc::new(MemorySchedulerHost::new());
        let sdk = Sdk::new(config(), client.clone(), store.clone(), host.clone());
        Self {
            sdk,
            client,
            store,
            host,
        }
    }

    /// The license as a caller would submit it: persisted state plus `KEY`.
    pub fn submitted(&self) -> License {
        License::from_data(site(), ID, KEY, self.store.as_ref()).unwrap()
    }

    pub fn stored(&self) -> License {
        License::load(site(), ID, self.store.as_ref()).unwrap()
    }

    /// Runs a successful activation and returns the stored license.
    pub async fn activated(&self) -> License {
        let mut license = self.submitted();
        self.sdk.service().activate(&mut license).await.unwrap();
        self.stored()
    }
}
