//! Authorization server endpoint discovery
//!
//! Fetches the well-known OAuth authorization-server metadata document and
//! resolves the authorization, token, and registration endpoints for a
//! session. Discovery failure is non-fatal by design: any network error,
//! non-200 status, or malformed body silently degrades to the configured
//! defaults with a logged warning, and fields absent from a successfully
//! fetched document keep their default values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout applied to the single discovery fetch.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// The resolved set of authorization server endpoints for one session.
///
/// Populated by [`resolve_endpoints`] from the discovery document, falling
/// back field-wise to the defaults carried in the caller's configuration.
/// Immutable once resolved.
///
/// # Examples
///
/// ```
/// use toolgate::auth::discovery::AuthEndpoints;
///
/// let defaults = AuthEndpoints {
///     authorization_endpoint: "https://signin.example.com/oauth2/v1/auth".to_string(),
///     token_endpoint: "https://oauth.example.com/v1/token".to_string(),
///     registration_endpoint: None,
/// };
/// assert!(defaults.registration_endpoint.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
    /// Absolute URL of the authorization endpoint (RFC 6749 section 3.1).
    pub authorization_endpoint: String,

    /// Absolute URL of the token endpoint (RFC 6749 section 3.2).
    pub token_endpoint: String,

    /// Optional URL of the Dynamic Client Registration endpoint (RFC 7591).
    /// There is no compile-time default for this one; it only exists when
    /// discovery advertises it.
    pub registration_endpoint: Option<String>,
}

/// Raw discovery document body. Every field is optional; absent fields keep
/// their defaults in the resolved [`AuthEndpoints`].
#[derive(Debug, Clone, Default, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    authorization_endpoint: Option<String>,
    #[serde(default)]
    token_endpoint: Option<String>,
    #[serde(default)]
    registration_endpoint: Option<String>,
}

/// Resolves the authorization server endpoints for a session.
///
/// Performs a single GET of `discovery_url` bounded by
/// [`DISCOVERY_TIMEOUT`]. Fields present in the fetched document override
/// the corresponding field of `defaults`; absent fields keep the default.
/// On any failure the defaults are returned unchanged and a warning is
/// logged. This function is idempotent and has no side effects beyond the
/// network call.
///
/// # Arguments
///
/// * `http` - Shared [`reqwest::Client`] used for the discovery request.
/// * `discovery_url` - URL of the well-known metadata document.
/// * `defaults` - Endpoint values to fall back to, field by field.
pub async fn resolve_endpoints(
    http: &reqwest::Client,
    discovery_url: &str,
    defaults: &AuthEndpoints,
) -> AuthEndpoints {
    let document = match fetch_discovery_document(http, discovery_url).await {
        Ok(doc) => doc,
        Err(reason) => {
            tracing::warn!(
                discovery_url,
                reason,
                "endpoint discovery failed; using default endpoints"
            );
            return defaults.clone();
        }
    };

    AuthEndpoints {
        authorization_endpoint: document
            .authorization_endpoint
            .unwrap_or_else(|| defaults.authorization_endpoint.clone()),
        token_endpoint: document
            .token_endpoint
            .unwrap_or_else(|| defaults.token_endpoint.clone()),
        registration_endpoint: document
            .registration_endpoint
            .or_else(|| defaults.registration_endpoint.clone()),
    }
}

/// Fetches and parses the discovery document, mapping every failure mode to
/// a human-readable reason string for the warning log.
async fn fetch_discovery_document(
    http: &reqwest::Client,
    discovery_url: &str,
) -> std::result::Result<DiscoveryDocument, String> {
    let resp = http
        .get(discovery_url)
        .timeout(DISCOVERY_TIMEOUT)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!("unexpected status {}", resp.status()));
    }

    resp.json::<DiscoveryDocument>()
        .await
        .map_err(|e| format!("malformed body: {e}"))
}
