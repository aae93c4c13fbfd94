//! OAuth2 authorization-code flow with PKCE and dynamic registration fallback
//!
//! This module drives the full authorization state machine:
//!
//! 1. Resolve a `client_id`: use the configured static id unless it is
//!    absent or a placeholder, otherwise perform Dynamic Client Registration
//!    (RFC 7591) against the discovered registration endpoint.
//! 2. Generate a PKCE S256 challenge and a random CSRF `state` nonce.
//! 3. Bind a loopback TCP listener for the redirect callback.
//! 4. Build the authorization URL and hand it to the user's browser.
//! 5. Accept the callback, validate `error`/`state`, and extract the
//!    authorization code (tolerating the proxy-mangled `amp;code` spelling).
//! 6. Exchange the code for a bearer token at the token endpoint.
//!
//! The per-attempt PKCE verifier and CSRF state live in an
//! [`AuthSession`] that is consumed exactly once by the callback handler,
//! so they can never be reused across attempts.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use base64::Engine as _;
use url::Url;

use crate::auth::discovery::AuthEndpoints;
use crate::auth::pkce;
use crate::error::{Result, ToolgateError};

/// Trailing sentinel marking a configured client id as a redacted
/// placeholder rather than a usable value.
const PLACEHOLDER_SUFFIX: &str = "*******";

// ---------------------------------------------------------------------------
// AccessCredential
// ---------------------------------------------------------------------------

/// An opaque bearer credential produced by a successful token exchange.
///
/// Has no modeled expiry; treated as valid until explicitly replaced.
/// Passed explicitly into the orchestrator rather than read from ambient
/// process state.
#[derive(Debug, Clone)]
pub struct AccessCredential {
    /// The opaque bearer token string.
    pub token: String,
}

impl AccessCredential {
    /// Wraps a raw bearer token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// True when the token string is empty. A 200 token response without an
    /// `access_token` field still produces a credential; callers must check
    /// this before persisting.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AuthFlowConfig / AuthSession
// ---------------------------------------------------------------------------

/// Configuration for one authorization flow.
#[derive(Debug, Clone)]
pub struct AuthFlowConfig {
    /// Optional static `client_id`. Ignored when empty or when it ends with
    /// the placeholder sentinel, in which case dynamic registration runs.
    pub client_id: Option<String>,

    /// Local TCP port to bind for the redirect callback. Use `0` to let the
    /// OS assign a free port.
    pub redirect_port: u16,
}

/// Single-use per-attempt authorization state.
///
/// Created after the client is resolved and the PKCE challenge is
/// generated; consumed exactly once by [`AuthSession::consume_callback`],
/// which takes `self` by value so the verifier and CSRF state are
/// invalidated regardless of outcome.
#[derive(Debug)]
pub struct AuthSession {
    /// Resolved client identifier for this attempt.
    pub client_id: String,
    /// PKCE code verifier; retained here only, never transmitted to the
    /// authorization endpoint.
    pub verifier: String,
    /// CSRF `state` nonce expected back on the callback.
    pub csrf_state: String,
    /// Redirect URI registered for this attempt.
    pub redirect_uri: String,
}

/// The values surviving callback consumption, needed for the token exchange.
#[derive(Debug)]
pub struct CallbackOutcome {
    /// The authorization code returned by the provider.
    pub code: String,
    /// Client id carried over from the session.
    pub client_id: String,
    /// PKCE verifier carried over from the session.
    pub verifier: String,
    /// Redirect URI carried over from the session.
    pub redirect_uri: String,
}

impl AuthSession {
    /// Validates the provider callback parameters and extracts the
    /// authorization code, consuming the session.
    ///
    /// Validation order:
    ///
    /// 1. An `error` parameter fails the attempt with
    ///    [`ToolgateError::Provider`] carrying the provider's message.
    /// 2. A `state` value different from the session's CSRF state (including
    ///    a missing one) fails with [`ToolgateError::CsrfMismatch`].
    /// 3. The code is accepted under `code` or the known proxy-mangled
    ///    `amp;code` spelling; absence fails with
    ///    [`ToolgateError::MissingCode`].
    ///
    /// The session is taken by value: success or failure, the verifier and
    /// CSRF state are gone afterwards and cannot be replayed.
    pub fn consume_callback(self, params: &HashMap<String, String>) -> Result<CallbackOutcome> {
        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .map(|d| format!("{error}: {d}"))
                .unwrap_or_else(|| error.clone());
            return Err(ToolgateError::Provider(description).into());
        }

        match params.get("state") {
            Some(state) if *state == self.csrf_state => {}
            _ => return Err(ToolgateError::CsrfMismatch.into()),
        }

        let code = extract_authorization_code(params).ok_or(ToolgateError::MissingCode)?;

        Ok(CallbackOutcome {
            code,
            client_id: self.client_id,
            verifier: self.verifier,
            redirect_uri: self.redirect_uri,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Raw JSON response from the token endpoint. `access_token` defaults to an
/// empty string when absent; the flow reports that as success and leaves
/// non-emptiness validation to the caller.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Minimal Dynamic Client Registration response (RFC 7591).
#[derive(Debug, serde::Deserialize)]
struct RegistrationResponse {
    #[serde(default)]
    client_id: Option<String>,
}

// ---------------------------------------------------------------------------
// AuthFlow
// ---------------------------------------------------------------------------

/// Drives the OAuth2 authorization-code flow with PKCE for one session.
///
/// Constructed with the endpoints produced by
/// [`resolve_endpoints`](crate::auth::discovery::resolve_endpoints); the
/// endpoints are immutable for the lifetime of the flow. The flow itself
/// persists nothing; the resulting [`AccessCredential`] is handed back to
/// the caller, which owns the credential-store collaborator.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toolgate::auth::discovery::AuthEndpoints;
/// use toolgate::auth::flow::{AuthFlow, AuthFlowConfig};
///
/// # async fn example() -> toolgate::error::Result<()> {
/// let endpoints = AuthEndpoints {
///     authorization_endpoint: "https://auth.example.com/authorize".to_string(),
///     token_endpoint: "https://auth.example.com/token".to_string(),
///     registration_endpoint: None,
/// };
/// let config = AuthFlowConfig {
///     client_id: Some("my-client".to_string()),
///     redirect_port: 0,
/// };
/// let flow = AuthFlow::new(Arc::new(reqwest::Client::new()), endpoints, config);
/// let outcome = flow.authorize().await?;
/// println!("authorized as client {}", outcome.client_id);
/// # Ok(())
/// # }
/// ```
pub struct AuthFlow {
    http: Arc<reqwest::Client>,
    endpoints: AuthEndpoints,
    config: AuthFlowConfig,
}

/// Result of a completed authorization flow.
#[derive(Debug, Clone)]
pub struct AuthorizeOutcome {
    /// The bearer credential returned by the token endpoint.
    pub credential: AccessCredential,
    /// The client id the flow ran under; differs from the configured one
    /// when dynamic registration was used.
    pub client_id: String,
    /// True when the client id came from dynamic registration.
    pub registered: bool,
}

impl AuthFlow {
    /// Creates a new flow over the given resolved endpoints.
    pub fn new(http: Arc<reqwest::Client>, endpoints: AuthEndpoints, config: AuthFlowConfig) -> Self {
        Self {
            http,
            endpoints,
            config,
        }
    }

    /// Runs the full authorization-code flow and returns the bearer
    /// credential.
    ///
    /// # Errors
    ///
    /// Returns the terminal error kinds of the authorization state machine:
    /// [`ToolgateError::RegistrationUnavailable`],
    /// [`ToolgateError::RegistrationFailed`], [`ToolgateError::Provider`],
    /// [`ToolgateError::CsrfMismatch`], [`ToolgateError::MissingCode`], or
    /// [`ToolgateError::TokenExchangeFailed`].
    pub async fn authorize(&self) -> Result<AuthorizeOutcome> {
        self.authorize_with(|url| {
            eprintln!("Open the following URL in your browser to authorize Toolgate:\n{url}");
            try_open_browser(url);
        })
        .await
    }

    /// Like [`authorize`](Self::authorize), but hands the authorization URL
    /// to `present_url` instead of printing it and launching a browser.
    pub async fn authorize_with(&self, present_url: impl FnOnce(&str)) -> Result<AuthorizeOutcome> {
        // Bind the callback listener first so the redirect URI carries the
        // real port before it is registered or sent anywhere.
        let listener =
            tokio::net::TcpListener::bind(format!("127.0.0.1:{}", self.config.redirect_port))
                .await?;
        let local_addr = listener.local_addr()?;
        let redirect_uri = format!("http://127.0.0.1:{}/oauth/callback", local_addr.port());

        // INIT -> CLIENT_RESOLVED
        let registered = self.static_client_id().is_none();
        let client_id = self.resolve_client_id(&redirect_uri).await?;
        tracing::debug!(client_id, registered, "client resolved");

        // CLIENT_RESOLVED -> CHALLENGE_READY
        let challenge = pkce::generate()?;
        let csrf_state = generate_state();
        let session = AuthSession {
            client_id: client_id.clone(),
            verifier: challenge.verifier.clone(),
            csrf_state: csrf_state.clone(),
            redirect_uri: redirect_uri.clone(),
        };

        // CHALLENGE_READY -> REDIRECTED
        let auth_url = self.build_authorization_url(
            &client_id,
            &redirect_uri,
            &challenge.challenge,
            &csrf_state,
        )?;
        present_url(&auth_url);

        // REDIRECTED -> CALLBACK_RECEIVED
        let params = accept_callback(listener).await?;
        let outcome = session.consume_callback(&params)?;

        // CALLBACK_RECEIVED -> TOKEN_EXCHANGED
        let credential = self.exchange_code(&outcome).await?;
        Ok(AuthorizeOutcome {
            credential,
            client_id,
            registered,
        })
    }

    /// Returns the configured static client id, treating an empty string or
    /// a redacted placeholder as unset.
    fn static_client_id(&self) -> Option<&str> {
        self.config
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty() && !id.ends_with(PLACEHOLDER_SUFFIX))
    }

    /// Resolves the `client_id` for this attempt: static id when usable,
    /// otherwise Dynamic Client Registration against the discovered
    /// registration endpoint.
    async fn resolve_client_id(&self, redirect_uri: &str) -> Result<String> {
        if let Some(id) = self.static_client_id() {
            return Ok(id.to_string());
        }

        let registration_endpoint = self
            .endpoints
            .registration_endpoint
            .as_deref()
            .ok_or(ToolgateError::RegistrationUnavailable)?;

        self.register_client(registration_endpoint, redirect_uri)
            .await
    }

    /// Performs Dynamic Client Registration (RFC 7591). Success is HTTP 201
    /// with a non-empty `client_id` in the JSON body.
    async fn register_client(
        &self,
        registration_endpoint: &str,
        redirect_uri: &str,
    ) -> Result<String> {
        let body = serde_json::json!({
            "redirect_uris": [redirect_uri],
            "grant_types": ["authorization_code"],
            "response_types": ["code"],
        });

        let resp = self
            .http
            .post(registration_endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolgateError::RegistrationFailed(format!("request failed: {e}")))?;

        if resp.status() != reqwest::StatusCode::CREATED {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(
                ToolgateError::RegistrationFailed(format!("endpoint returned {status}: {text}"))
                    .into(),
            );
        }

        let registration: RegistrationResponse = resp.json().await.map_err(|e| {
            ToolgateError::RegistrationFailed(format!("unparseable response: {e}"))
        })?;

        match registration.client_id {
            Some(client_id) if !client_id.is_empty() => Ok(client_id),
            _ => Err(ToolgateError::RegistrationFailed(
                "no client_id returned from registration".to_string(),
            )
            .into()),
        }
    }

    /// Builds the authorization URL with the required query parameters.
    fn build_authorization_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        code_challenge: &str,
        state: &str,
    ) -> Result<String> {
        let mut url = Url::parse(&self.endpoints.authorization_endpoint)
            .map_err(|e| ToolgateError::Config(format!("invalid authorization endpoint: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", client_id);
            query.append_pair("redirect_uri", redirect_uri);
            query.append_pair("code_challenge", code_challenge);
            query.append_pair("code_challenge_method", "S256");
            query.append_pair("state", state);
        }

        Ok(url.to_string())
    }

    /// Exchanges the authorization code for a bearer token.
    ///
    /// A 200 response whose body lacks `access_token` is still reported as
    /// success with an empty token and a logged warning; the caller decides
    /// whether to persist it.
    async fn exchange_code(&self, outcome: &CallbackOutcome) -> Result<AccessCredential> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", &outcome.code);
        params.insert("redirect_uri", &outcome.redirect_uri);
        params.insert("client_id", &outcome.client_id);
        params.insert("code_verifier", &outcome.verifier);

        let resp = self
            .http
            .post(&self.endpoints.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| ToolgateError::Auth(format!("token exchange request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ToolgateError::TokenExchangeFailed { status, body }.into());
        }

        let raw: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ToolgateError::Auth(format!("failed to parse token response: {e}")))?;

        if raw.access_token.is_empty() {
            tracing::warn!("token endpoint returned success without an access_token");
        }

        Ok(AccessCredential::new(raw.access_token))
    }
}

// ---------------------------------------------------------------------------
// Callback listener
// ---------------------------------------------------------------------------

/// Accepts a single connection on the callback listener, answers it with a
/// plain-text 200 so the browser stops spinning, and returns the parsed
/// query parameters of the request line.
///
/// Validation of the parameters belongs to
/// [`AuthSession::consume_callback`]; this function only transports them.
async fn accept_callback(listener: tokio::net::TcpListener) -> Result<HashMap<String, String>> {
    let (stream, _peer) = listener
        .accept()
        .await
        .map_err(|e| ToolgateError::Auth(format!("failed to accept callback connection: {e}")))?;

    // Blocking task with std I/O keeps the single-request parse simple
    // without pulling in an HTTP server.
    tokio::task::spawn_blocking(move || -> Result<HashMap<String, String>> {
        let std_stream = stream
            .into_std()
            .map_err(|e| ToolgateError::Auth(format!("stream conversion failed: {e}")))?;
        let mut write_stream = std_stream
            .try_clone()
            .map_err(|e| ToolgateError::Auth(format!("stream clone failed: {e}")))?;

        let reader = BufReader::new(std_stream);
        let mut request_line = String::new();

        for line in reader.lines() {
            let line =
                line.map_err(|e| ToolgateError::Auth(format!("failed to read callback: {e}")))?;
            // HTTP headers end at the first empty line.
            if line.is_empty() {
                break;
            }
            if request_line.is_empty() {
                request_line = line;
            }
        }

        let response = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nAuthorization received. You may close this tab.";
        let _ = write_stream.write_all(response.as_bytes());

        // Request line: "GET /oauth/callback?code=...&state=... HTTP/1.1"
        let path = request_line.split_whitespace().nth(1).unwrap_or("/");
        let query_string = path.split_once('?').map(|x| x.1).unwrap_or("");
        Ok(parse_query_string(query_string))
    })
    .await
    .map_err(|e| ToolgateError::Auth(format!("callback task panicked: {e}")))?
}

/// Attempts to open the authorization URL in the user's default browser.
/// Errors are ignored; the URL is always printed to stderr as a fallback.
fn try_open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = url;
    }
}

// ---------------------------------------------------------------------------
// Utility functions
// ---------------------------------------------------------------------------

/// Generates a cryptographically random CSRF `state` nonce: 16 random bytes
/// encoded as base64url without padding.
fn generate_state() -> String {
    use rand::RngCore as _;
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the authorization code under either of its known parameter
/// spellings. Some redirect proxies double-encode the query separator,
/// turning `&code=` into `&amp;code=`, which surfaces here as a parameter
/// literally named `amp;code`.
fn extract_authorization_code(params: &HashMap<String, String>) -> Option<String> {
    params
        .get("amp;code")
        .or_else(|| params.get("code"))
        .cloned()
}

/// Parses a URL query string into a key-value map.
///
/// Values are percent-decoded. Duplicate keys are overwritten by the last
/// occurrence.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for pair in query.split('&') {
        let mut iter = pair.splitn(2, '=');
        let key = iter.next().unwrap_or("").to_string();
        let value = iter.next().unwrap_or("").to_string();
        if !key.is_empty() {
            map.insert(key, percent_decode(&value));
        }
    }
    map
}

/// Performs minimal percent-decoding of a URL query parameter value.
///
/// Converts `+` to space and `%XX` sequences to the corresponding byte.
fn percent_decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'+' {
            out.push(' ');
            i += 1;
        } else if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte as char);
                    i += 3;
                    continue;
                }
            }
            out.push(bytes[i] as char);
            i += 1;
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            client_id: "client-1".to_string(),
            verifier: "verifier-value".to_string(),
            csrf_state: "expected-state".to_string(),
            redirect_uri: "http://127.0.0.1:5000/oauth/callback".to_string(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // consume_callback
    // -----------------------------------------------------------------------

    #[test]
    fn test_consume_callback_success() {
        let outcome = session()
            .consume_callback(&params(&[
                ("code", "auth-code"),
                ("state", "expected-state"),
            ]))
            .unwrap();
        assert_eq!(outcome.code, "auth-code");
        assert_eq!(outcome.client_id, "client-1");
        assert_eq!(outcome.verifier, "verifier-value");
    }

    #[test]
    fn test_consume_callback_accepts_mangled_code_spelling() {
        let outcome = session()
            .consume_callback(&params(&[
                ("amp;code", "mangled-code"),
                ("state", "expected-state"),
            ]))
            .unwrap();
        assert_eq!(outcome.code, "mangled-code");
    }

    #[test]
    fn test_consume_callback_provider_error_wins_over_everything() {
        let err = session()
            .consume_callback(&params(&[
                ("error", "access_denied"),
                ("code", "auth-code"),
                ("state", "expected-state"),
            ]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::Provider(msg) if msg == "access_denied"));
    }

    #[test]
    fn test_consume_callback_provider_error_carries_description() {
        let err = session()
            .consume_callback(&params(&[
                ("error", "access_denied"),
                ("error_description", "user cancelled"),
            ]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::Provider(msg) if msg.contains("user cancelled")));
    }

    #[test]
    fn test_consume_callback_state_mismatch_even_with_valid_code() {
        let err = session()
            .consume_callback(&params(&[("code", "auth-code"), ("state", "wrong")]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::CsrfMismatch));
    }

    #[test]
    fn test_consume_callback_missing_state_is_csrf_mismatch() {
        let err = session()
            .consume_callback(&params(&[("code", "auth-code")]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::CsrfMismatch));
    }

    #[test]
    fn test_consume_callback_empty_state_is_csrf_mismatch() {
        let err = session()
            .consume_callback(&params(&[("code", "auth-code"), ("state", "")]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::CsrfMismatch));
    }

    #[test]
    fn test_consume_callback_missing_code_with_matching_state() {
        let err = session()
            .consume_callback(&params(&[("state", "expected-state")]))
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::MissingCode));
    }

    // -----------------------------------------------------------------------
    // extract_authorization_code
    // -----------------------------------------------------------------------

    #[test]
    fn test_extract_code_prefers_mangled_spelling() {
        let p = params(&[("amp;code", "mangled"), ("code", "plain")]);
        assert_eq!(extract_authorization_code(&p), Some("mangled".to_string()));
    }

    #[test]
    fn test_extract_code_plain_spelling() {
        let p = params(&[("code", "plain")]);
        assert_eq!(extract_authorization_code(&p), Some("plain".to_string()));
    }

    #[test]
    fn test_extract_code_absent() {
        let p = params(&[("state", "x")]);
        assert_eq!(extract_authorization_code(&p), None);
    }

    // -----------------------------------------------------------------------
    // parse_query_string / percent_decode
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_query_string_with_code_and_state() {
        let map = parse_query_string("code=abc123&state=xyz789");
        assert_eq!(map.get("code"), Some(&"abc123".to_string()));
        assert_eq!(map.get("state"), Some(&"xyz789".to_string()));
    }

    #[test]
    fn test_parse_query_string_empty_returns_empty_map() {
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_parse_query_string_decodes_percent_encoding() {
        let map = parse_query_string("scope=openid%20profile");
        assert_eq!(map.get("scope"), Some(&"openid profile".to_string()));
    }

    #[test]
    fn test_percent_decode_converts_plus_to_space() {
        assert_eq!(percent_decode("hello+world"), "hello world");
    }

    #[test]
    fn test_percent_decode_incomplete_percent_passes_through() {
        let result = percent_decode("%zz");
        assert!(!result.is_empty());
    }

    // -----------------------------------------------------------------------
    // generate_state
    // -----------------------------------------------------------------------

    #[test]
    fn test_generate_state_produces_unique_url_safe_values() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 16 bytes in base64url without padding is 22 characters.
        assert_eq!(a.len(), 22);
    }

    // -----------------------------------------------------------------------
    // static_client_id / build_authorization_url
    // -----------------------------------------------------------------------

    fn flow(client_id: Option<&str>) -> AuthFlow {
        AuthFlow::new(
            Arc::new(reqwest::Client::new()),
            AuthEndpoints {
                authorization_endpoint: "https://auth.example.com/authorize".to_string(),
                token_endpoint: "https://auth.example.com/token".to_string(),
                registration_endpoint: None,
            },
            AuthFlowConfig {
                client_id: client_id.map(String::from),
                redirect_port: 0,
            },
        )
    }

    #[test]
    fn test_static_client_id_used_when_real() {
        assert_eq!(flow(Some("4071151845732613353")).static_client_id(), Some("4071151845732613353"));
    }

    #[test]
    fn test_static_client_id_placeholder_is_unset() {
        assert_eq!(flow(Some("1234*******")).static_client_id(), None);
    }

    #[test]
    fn test_static_client_id_empty_is_unset() {
        assert_eq!(flow(Some("")).static_client_id(), None);
        assert_eq!(flow(None).static_client_id(), None);
    }

    #[tokio::test]
    async fn test_resolve_client_id_without_registration_endpoint_fails() {
        let err = flow(None)
            .resolve_client_id("http://127.0.0.1:5000/oauth/callback")
            .await
            .unwrap_err();
        let err = err.downcast::<ToolgateError>().unwrap();
        assert!(matches!(err, ToolgateError::RegistrationUnavailable));
    }

    #[test]
    fn test_build_authorization_url_contains_required_params() {
        let url = flow(Some("test_client"))
            .build_authorization_url(
                "test_client",
                "http://127.0.0.1:5000/oauth/callback",
                "test_challenge",
                "test_state",
            )
            .unwrap();

        assert!(url.contains("response_type=code"), "missing response_type: {url}");
        assert!(url.contains("client_id=test_client"), "missing client_id: {url}");
        assert!(url.contains("redirect_uri="), "missing redirect_uri: {url}");
        assert!(url.contains("code_challenge=test_challenge"), "missing code_challenge: {url}");
        assert!(url.contains("code_challenge_method=S256"), "missing method: {url}");
        assert!(url.contains("state=test_state"), "missing state: {url}");
    }

    #[test]
    fn test_build_authorization_url_never_contains_verifier() {
        let challenge = pkce::generate().unwrap();
        let url = flow(Some("c"))
            .build_authorization_url(
                "c",
                "http://127.0.0.1:5000/oauth/callback",
                &challenge.challenge,
                "s",
            )
            .unwrap();
        assert!(
            !url.contains(&challenge.verifier),
            "verifier must never be transmitted to the authorization endpoint"
        );
    }

    // -----------------------------------------------------------------------
    // AccessCredential
    // -----------------------------------------------------------------------

    #[test]
    fn test_access_credential_emptiness() {
        assert!(AccessCredential::new("").is_empty());
        assert!(!AccessCredential::new("tok").is_empty());
    }
}
