//! License entitlement state for an installation.
//!
//! This crate handles:
//! - The persisted license record and its field schema
//! - The register → activate → validate state machine
//! - The wire types of the remote entitlement API, including error records
//! - An HTTP client for that API
//!
//! # State Machine
//!
//! A license starts `Unregistered`. Registering binds it to a remote license
//! (usage counts, limits, expiry). Activating claims a usage slot for this
//! site. Validation re-checks the activation periodically. Any failed remote
//! check can revoke the license; a later successful activation recovers it.
//!
//! Transitions validate the remote payload before touching any field, so a
//! rejected transition leaves the license unchanged.
//!
//! # Fingerprint
//!
//! An activation is tied to the site URL (the fingerprint). Validation fails
//! when the remote activation's fingerprint or license id no longer match.

mod client;
mod clock;
mod error;
mod fields;
mod license;
mod remote;
mod site;

pub use client::{ClientConfig, EntitlementClient, HttpClient, DEFAULT_API_BASE_URL};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{LicenseError, LicenseResult};
pub use fields::{LicenseField, LicenseStatus, SENTINEL_ID};
pub use license::{License, LicenseSchema, LicenseState, VALIDATION_WINDOW_SECS};
pub use remote::{
    ActivationRequest, ErrorRecord, ReleaseInfo, RemoteActivation, RemoteLicense, RemoteResponse,
};
pub use site::{is_public_ip, SiteInfo};
