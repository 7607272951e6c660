use std::time::Duration;

use entitlement_license::{
    ActivationRequest, ClientConfig, EntitlementClient, HttpClient, LicenseError, RemoteResponse,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpClient {
    HttpClient::new(ClientConfig {
        base_url: server.uri(),
        public_token: "pt_test".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

// ── Licenses ─────────────────────────────────────────────────────

#[tokio::test]
async fn show_license_sends_token_and_parses_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/public/licenses/KEY-123"))
        .and(header("authorization", "Bearer pt_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "L1",
            "activations_count": 0,
            "activation_limit": 5,
            "status": "active"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let license = client(&server)
        .show_license("KEY-123")
        .await
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(license.id.as_deref(), Some("L1"));
    assert_eq!(license.activation_limit, Some(5));
}

#[tokio::test]
async fn error_status_with_error_body_is_an_error_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/public/licenses/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "license.not_found",
            "message": "License not found."
        })))
        .mount(&server)
        .await;

    let response = client(&server).show_license("missing").await.unwrap();
    assert!(matches!(response, RemoteResponse::Error(_)));
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).show_license("KEY").await.unwrap_err();
    assert!(matches!(err, LicenseError::InvalidResponse(_)));
}

// ── Activations ──────────────────────────────────────────────────

#[tokio::test]
async fn create_activation_posts_wrapped_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/public/activations"))
        .and(body_json(json!({
            "activation": {
                "fingerprint": "https://shop.example.com",
                "name": "Example Shop",
                "license": "L1"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "A1",
            "counted": true,
            "license": "L1",
            "fingerprint": "https://shop.example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ActivationRequest {
        fingerprint: "https://shop.example.com".to_string(),
        name: "Example Shop".to_string(),
        license: "L1".to_string(),
    };
    let activation = client(&server)
        .create_activation(&request)
        .await
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(activation.id.as_deref(), Some("A1"));
}

#[tokio::test]
async fn show_activation_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/public/activations/A1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "A1", "license": "L1"})),
        )
        .mount(&server)
        .await;

    let activation = client(&server)
        .show_activation("A1")
        .await
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(activation.license.as_deref(), Some("L1"));
}

#[tokio::test]
async fn delete_activation_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/public/activations/A1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_activation("A1").await.unwrap();
}

// ── Releases ─────────────────────────────────────────────────────

#[tokio::test]
async fn expose_release_passes_window_in_seconds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/public/licenses/KEY-123/expose/A1"))
        .and(query_param("expose_for", "10800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://cdn.example.com/acme.zip",
            "release_json": {"version": "2.0.0"}
        })))
        .mount(&server)
        .await;

    let release = client(&server)
        .expose_release("KEY-123", "A1", Duration::from_secs(3 * 3600))
        .await
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(release.url.as_deref(), Some("https://cdn.example.com/acme.zip"));
}

// ── Transport ────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let client = HttpClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        public_token: String::new(),
        timeout_secs: 2,
    })
    .unwrap();
    let err = client.show_license("KEY").await.unwrap_err();
    assert!(matches!(err, LicenseError::Network(_)));
}

#[test]
fn empty_base_url_is_rejected() {
    let err = HttpClient::new(ClientConfig {
        base_url: String::new(),
        ..ClientConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, LicenseError::Config(_)));
}
