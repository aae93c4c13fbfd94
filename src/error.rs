//! Error types for Toolgate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Toolgate operations
///
/// This enum encompasses all possible errors that can occur during
/// authorization, tool discovery, selection, handle activation, and
/// configuration loading. Authorization-engine variants are terminal for
/// the attempt that produced them; orchestrator variants distinguish
/// per-server failures (recovered and skipped) from aggregate emptiness
/// (fatal).
#[derive(Error, Debug)]
pub enum ToolgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No registration endpoint was advertised by discovery and no static
    /// client id is configured, so a client cannot be resolved at all
    #[error("Client registration unavailable: no registration endpoint advertised by discovery")]
    RegistrationUnavailable,

    /// Dynamic client registration was attempted but did not yield a client id
    #[error("Client registration failed: {0}")]
    RegistrationFailed(String),

    /// The authorization provider returned an `error` parameter on the callback
    #[error("Authorization provider error: {0}")]
    Provider(String),

    /// The `state` parameter on the callback did not match the session state
    #[error("State parameter mismatch in authorization callback")]
    CsrfMismatch,

    /// No authorization code was present on the callback under any known spelling
    #[error("Authorization code missing from callback")]
    MissingCode,

    /// Authorization flow plumbing errors (callback transport, token
    /// endpoint I/O) with no more specific variant
    #[error("Authorization flow error: {0}")]
    Auth(String),

    /// The token endpoint rejected the authorization code exchange
    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchangeFailed {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Raw response body, surfaced for diagnostics
        body: String,
    },

    /// A single capability server could not be reached or rejected the session
    #[error("Capability server '{server}' unreachable: {message}")]
    ServerUnreachable {
        /// Registry key of the failing server
        server: String,
        /// Underlying failure description
        message: String,
    },

    /// Discovery produced zero tools across every registered server
    #[error("No capabilities available: every registered server failed discovery")]
    NoCapabilitiesAvailable,

    /// Activation produced zero open handles
    #[error("No capability handles could be activated")]
    NoHandlesActivated,

    /// The selection collaborator returned a payload that is not a valid
    /// selection map. Always recovered locally via the identity fallback;
    /// never surfaced as fatal.
    #[error("Selection payload malformed: {0}")]
    SelectionMalformed(String),

    /// MCP protocol or session errors
    #[error("MCP error: {0}")]
    Mcp(String),

    /// LLM collaborator errors (API calls, malformed completions)
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Toolgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
