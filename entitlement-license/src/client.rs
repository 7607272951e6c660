//! Client for the remote entitlement API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{LicenseError, LicenseResult};
use crate::remote::{
    ActivationRequest, ReleaseInfo, RemoteActivation, RemoteLicense, RemoteResponse,
};

/// Base URL of the hosted entitlement API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.surecart.com";

/// Remote license and activation calls.
///
/// Calls return the remote answer as-is, error records included; only
/// transport and decoding failures are errors.
#[async_trait]
pub trait EntitlementClient: Send + Sync {
    /// Fetches a license by its key.
    async fn show_license(&self, key: &str) -> LicenseResult<RemoteResponse<RemoteLicense>>;

    /// Creates an activation of a license for a site.
    async fn create_activation(
        &self,
        request: &ActivationRequest,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>>;

    /// Fetches an activation by id.
    async fn show_activation(
        &self,
        activation_id: &str,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>>;

    /// Deletes an activation. The answer body is not inspected.
    async fn delete_activation(&self, activation_id: &str) -> LicenseResult<()>;

    /// Exposes the current release of a license for `expose_for`.
    async fn expose_release(
        &self,
        key: &str,
        activation_id: &str,
        expose_for: Duration,
    ) -> LicenseResult<RemoteResponse<ReleaseInfo>>;
}

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL, without the `/v1` prefix.
    pub base_url: String,
    /// Public token sent as a bearer credential.
    pub public_token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            public_token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// [`EntitlementClient`] over the public HTTP API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: ClientConfig,
    client: Client,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> LicenseResult<Self> {
        if config.base_url.is_empty() {
            return Err(LicenseError::Config("base_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/public{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> LicenseResult<Response> {
        let url = self.url(path);
        debug!(%method, %url, "entitlement request");

        let mut request = self.client.request(method, &url);
        if !self.config.public_token.is_empty() {
            request = request.bearer_auth(&self.config.public_token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| LicenseError::Network(format!("request to {url} failed: {e}")))
    }

    /// Sends a request and classifies its JSON body, whatever the status.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> LicenseResult<RemoteResponse<T>> {
        let response = self.send(method, path, body).await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            LicenseError::InvalidResponse(format!("unreadable response (HTTP {status}): {e}"))
        })?;
        RemoteResponse::from_value(value)
    }
}

#[async_trait]
impl EntitlementClient for HttpClient {
    async fn show_license(&self, key: &str) -> LicenseResult<RemoteResponse<RemoteLicense>> {
        let path = format!("/licenses/{}", urlencoding::encode(key));
        self.call(Method::GET, &path, None).await
    }

    async fn create_activation(
        &self,
        request: &ActivationRequest,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>> {
        let body = serde_json::json!({ "activation": request });
        self.call(Method::POST, "/activations", Some(&body)).await
    }

    async fn show_activation(
        &self,
        activation_id: &str,
    ) -> LicenseResult<RemoteResponse<RemoteActivation>> {
        let path = format!("/activations/{}", urlencoding::encode(activation_id));
        self.call(Method::GET, &path, None).await
    }

    async fn delete_activation(&self, activation_id: &str) -> LicenseResult<()> {
        let path = format!("/activations/{}", urlencoding::encode(activation_id));
        let response = self.send(Method::DELETE, &path, None).await?;
        debug!(activation_id, status = %response.status(), "activation deleted");
        Ok(())
    }

    async fn expose_release(
        &self,
        key: &str,
        activation_id: &str,
        expose_for: Duration,
    ) -> LicenseResult<RemoteResponse<ReleaseInfo>> {
        let path = format!(
            "/licenses/{}/expose/{}?expose_for={}",
            urlencoding::encode(key),
            urlencoding::encode(activation_id),
            expose_for.as_secs()
        );
        self.call(Method::GET, &path, None).await
    }
}
