//! Shared test helpers for license tests.

#![allow(dead_code)]

use std::sync::Arc;

use entitlement_license::{
    License, MockClock, RemoteActivation, RemoteLicense, RemoteResponse, SiteInfo,
};

pub const NOW: i64 = 1_700_000_000;

pub fn site() -> SiteInfo {
    SiteInfo::new("https://shop.example.com", "Example Shop")
}

pub fn clock() -> Arc<MockClock> {
    Arc::new(MockClock::at_timestamp(NOW))
}

/// A fresh license under `acme-plugin` driven by `clock`.
pub fn license(clock: &Arc<MockClock>) -> License {
    License::with_id(site(), "acme-plugin").with_clock(clock.clone())
}

pub fn remote_license() -> RemoteLicense {
    RemoteLicense {
        id: Some("L1".to_string()),
        key: Some("KEY-123".to_string()),
        activations_count: Some(0),
        activation_limit: Some(5),
        created_at: Some(100),
        revokes_at: None,
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

/// A license that went through register and activate.
pub fn activated_license(clock: &Arc<MockClock>) -> License {
    let mut license = license(clock);
    license
        .register(&RemoteResponse::Record(remote_license()))
        .unwrap();
    license
        .activate(&RemoteResponse::Record(remote_activation()))
        .unwrap();
    license
}
