//! Mock-upstream tests for the authenticated HTTP client.
//!
//! These use wiremock to simulate upstream APIs and verify the client's
//! retry, caching, redaction, and pass-through behavior without network
//! access or real credentials.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netmcp::client::{AuthScheme, HttpClientBuilder};
use netmcp::error::ClientError;
use netmcp::redact::Redactor;

fn token_login(server: &MockServer) -> netmcp::client::HttpClient {
    HttpClientBuilder::new(
        server.uri(),
        AuthScheme::TokenLogin {
            login_path: "/auth/token".into(),
            username: "admin".into(),
            password: "s3cret".into(),
            token_field: "Token".into(),
            token_header: "X-Auth-Token".into(),
        },
    )
    .redactor(Redactor::new(["s3cret"]))
    .build()
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": token })))
        .mount(server)
        .await;
}

// ============================================================================
// Single-retry bound
// ============================================================================

#[tokio::test]
async fn always_401_upstream_gets_exactly_two_attempts() {
    let server = MockServer::start().await;
    mount_login(&server, "t-1").await;

    // Original + one replay, never more — regardless of how long the
    // upstream keeps rejecting.
    Mock::given(method("GET"))
        .and(path("/network-device"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = token_login(&server);
    let err = client.get("/network-device", &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));

    server.verify().await;
}

#[tokio::test]
async fn failed_reauthentication_surfaces_auth_error() {
    let server = MockServer::start().await;

    // Login succeeds once, then the credential is revoked.
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "t-1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    // Data path rejects the stale token; no replay can happen because the
    // re-authentication itself fails.
    Mock::given(method("GET"))
        .and(path("/site"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = token_login(&server);
    let err = client.get("/site", &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));

    server.verify().await;
}

#[tokio::test]
async fn static_scheme_401_is_terminal_without_replay() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tests"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClientBuilder::new(
        server.uri(),
        AuthScheme::Bearer {
            token: "expired".into(),
        },
    )
    .build();

    let err = client.get("/tests", &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));

    server.verify().await;
}

// ============================================================================
// Token caching and replay
// ============================================================================

#[tokio::test]
async fn cached_token_is_reused_across_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "t-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/network-device"))
        .and(header("X-Auth-Token", "t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let client = token_login(&server);
    client.get("/network-device", &[]).await.unwrap();
    client.get("/network-device", &[]).await.unwrap();

    server.verify().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;

    // First login hands out a token the upstream has already expired;
    // the re-authentication gets a fresh one.
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "t-stale" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "t-fresh" })))
        .mount(&server)
        .await;

    // Stale-token request is rejected; the replay with the fresh token
    // succeeds.
    Mock::given(method("GET"))
        .and(path("/issues"))
        .and(header("X-Auth-Token", "t-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": [1, 2] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/issues"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = token_login(&server);
    let body = client.get("/issues", &[]).await.unwrap();
    assert_eq!(body, json!({ "response": [1, 2] }));
}

// ============================================================================
// Pass-through fidelity and error classification
// ============================================================================

#[tokio::test]
async fn success_body_is_passed_through_unmodified() {
    let server = MockServer::start().await;
    mount_login(&server, "t-1").await;

    let upstream = json!({ "response": [{ "id": "1" }] });
    Mock::given(method("GET"))
        .and(path("/network-device"))
        .and(query_param("hostname", "edge-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .mount(&server)
        .await;

    let client = token_login(&server);
    let query = vec![("hostname".to_string(), "edge-1".to_string())];
    let body = client.get("/network-device", &query).await.unwrap();
    assert_eq!(body, upstream);
}

#[tokio::test]
async fn non_2xx_becomes_upstream_error_with_status_and_body() {
    let server = MockServer::start().await;
    mount_login(&server, "t-1").await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such resource"))
        .mount(&server)
        .await;

    let client = token_login(&server);
    match client.get("/missing", &[]).await.unwrap_err() {
        ClientError::Upstream { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such resource");
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn error_bodies_are_redacted() {
    let server = MockServer::start().await;
    mount_login(&server, "t-1").await;

    Mock::given(method("GET"))
        .and(path("/leaky"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("internal failure for user s3cret"),
        )
        .mount(&server)
        .await;

    let client = token_login(&server);
    let err = client.get("/leaky", &[]).await.unwrap_err();
    let message = err.to_string();
    assert!(!message.contains("s3cret"));
    assert!(message.contains("***REDACTED***"));
}

#[tokio::test]
async fn login_failure_message_never_contains_the_password() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad password s3cret"))
        .mount(&server)
        .await;

    let client = token_login(&server);
    let err = client.get("/anything", &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));
    assert!(!err.to_string().contains("s3cret"));
}

#[tokio::test]
async fn empty_body_maps_to_null() {
    let server = MockServer::start().await;
    mount_login(&server, "t-1").await;

    Mock::given(method("DELETE"))
        .and(path("/thing/3/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = token_login(&server);
    let body = client.delete("/thing/3/").await.unwrap();
    assert!(body.is_null());
}

// ============================================================================
// Normalization hook
// ============================================================================

#[tokio::test]
async fn normalizer_is_applied_to_success_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations/1/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "N_1", "name": null, "tags": null }
        ])))
        .mount(&server)
        .await;

    let client = HttpClientBuilder::new(
        server.uri(),
        AuthScheme::Bearer {
            token: "meraki-key".into(),
        },
    )
    .normalizer(netmcp::normalize::meraki_nulls)
    .build();

    let body = client.get("/organizations/1/networks", &[]).await.unwrap();
    assert_eq!(body, json!([{ "id": "N_1", "name": "", "tags": [] }]));
}

// ============================================================================
// Credential presentation
// ============================================================================

#[tokio::test]
async fn basic_scheme_sends_credentials_on_every_request() {
    let server = MockServer::start().await;

    // base64("ers:pw") with the standard padding reqwest produces
    Mock::given(method("GET"))
        .and(path("/networkdevice"))
        .and(header("Authorization", "Basic ZXJzOnB3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "SearchResult": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClientBuilder::new(
        server.uri(),
        AuthScheme::Basic {
            username: "ers".into(),
            password: "pw".into(),
        },
    )
    .build();

    client.get("/networkdevice", &[]).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn token_scheme_uses_token_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dcim/sites/"))
        .and(header("Authorization", "Token nb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let client = HttpClientBuilder::new(
        server.uri(),
        AuthScheme::Token {
            token: "nb-token".into(),
        },
    )
    .build();

    client.get("/dcim/sites/", &[]).await.unwrap();
}
