//! OAuth endpoint discovery integration tests using wiremock
//!
//! Verifies the behaviour of `src/auth/discovery.rs`:
//!
//! - a full discovery document overrides every configured default
//! - a partial document overrides only the fields it carries
//! - non-success statuses and malformed bodies silently fall back to the
//!   configured defaults

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolgate::auth::discovery::{resolve_endpoints, AuthEndpoints};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn defaults() -> AuthEndpoints {
    AuthEndpoints {
        authorization_endpoint: "http://fallback/authorize".to_string(),
        token_endpoint: "http://fallback/token".to_string(),
        registration_endpoint: None,
    }
}

const WELL_KNOWN: &str = "/.well-known/oauth-authorization-server";

// ---------------------------------------------------------------------------
// resolve_endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_document_overrides_all_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WELL_KNOWN))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "authorization_endpoint": "https://idp.example.com/authorize",
            "token_endpoint": "https://idp.example.com/token",
            "registration_endpoint": "https://idp.example.com/register",
        })))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let url = format!("{}{}", server.uri(), WELL_KNOWN);
    let resolved = resolve_endpoints(&http, &url, &defaults()).await;

    assert_eq!(
        resolved.authorization_endpoint,
        "https://idp.example.com/authorize"
    );
    assert_eq!(resolved.token_endpoint, "https://idp.example.com/token");
    assert_eq!(
        resolved.registration_endpoint.as_deref(),
        Some("https://idp.example.com/register")
    );
}

#[tokio::test]
async fn test_partial_document_overrides_only_present_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WELL_KNOWN))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_endpoint": "https://idp.example.com/token",
        })))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let url = format!("{}{}", server.uri(), WELL_KNOWN);
    let resolved = resolve_endpoints(&http, &url, &defaults()).await;

    assert_eq!(resolved.authorization_endpoint, "http://fallback/authorize");
    assert_eq!(resolved.token_endpoint, "https://idp.example.com/token");
    assert_eq!(resolved.registration_endpoint, None);
}

#[tokio::test]
async fn test_error_status_falls_back_to_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WELL_KNOWN))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let url = format!("{}{}", server.uri(), WELL_KNOWN);
    let resolved = resolve_endpoints(&http, &url, &defaults()).await;

    assert_eq!(resolved, defaults());
}

#[tokio::test]
async fn test_malformed_body_falls_back_to_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WELL_KNOWN))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let url = format!("{}{}", server.uri(), WELL_KNOWN);
    let resolved = resolve_endpoints(&http, &url, &defaults()).await;

    assert_eq!(resolved, defaults());
}

#[tokio::test]
async fn test_unreachable_server_falls_back_to_defaults() {
    // Port 9 (discard) is not listening in the test environment.
    let http = reqwest::Client::new();
    let resolved = resolve_endpoints(
        &http,
        "http://127.0.0.1:9/.well-known/oauth-authorization-server",
        &defaults(),
    )
    .await;

    assert_eq!(resolved, defaults());
}
