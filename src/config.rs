//! Configuration management
//!
//! Loads the YAML configuration file and applies environment variable
//! overrides. Authorization endpoints configured here act as the static
//! fallback when well-known discovery is unavailable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::AuthEndpoints;
use crate::error::{Result, ToolgateError};
use crate::orchestrator::ServerDescriptor;

/// Root configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Authorization server settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Chat completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Registered capability servers, in priority order
    #[serde(default)]
    pub servers: Vec<ServerDescriptor>,

    /// Per-request timeout for server traffic (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Authorization server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Well-known discovery document URL; when unset or unreachable the
    /// static endpoints below are used
    #[serde(default)]
    pub discovery_url: Option<String>,

    /// Static authorization endpoint
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    /// Static token endpoint
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Static client registration endpoint
    #[serde(default)]
    pub registration_endpoint: Option<String>,

    /// Pre-provisioned OAuth client id; placeholder or empty values
    /// trigger dynamic registration
    #[serde(default)]
    pub client_id: Option<String>,

    /// Loopback port for the authorization callback
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,

    /// File where the bearer token and registered client id are persisted
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

fn default_authorization_endpoint() -> String {
    "http://localhost:8080/oauth/authorize".to_string()
}

fn default_token_endpoint() -> String {
    "http://localhost:8080/oauth/token".to_string()
}

fn default_redirect_port() -> u16 {
    5000
}

fn default_env_file() -> String {
    ".env".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            discovery_url: None,
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
            registration_endpoint: None,
            client_id: None,
            redirect_port: default_redirect_port(),
            env_file: default_env_file(),
        }
    }
}

impl AuthConfig {
    /// The static endpoints used when discovery is silent or partial.
    pub fn fallback_endpoints(&self) -> AuthEndpoints {
        AuthEndpoints {
            authorization_endpoint: self.authorization_endpoint.clone(),
            token_endpoint: self.token_endpoint.clone(),
            registration_endpoint: self.registration_endpoint.clone(),
        }
    }
}

/// Chat completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    /// Model name sent with each request
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
}

fn default_llm_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_llm_api_base(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            llm: LlmConfig::default(),
            servers: Vec::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file, then applies environment
    /// variable overrides.
    ///
    /// A missing file is not an error; defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::Config`] when the file exists but cannot
    /// be read or parsed, or when validation fails.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolgateError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ToolgateError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(client_id) = std::env::var("TOOLGATE_CLIENT_ID") {
            self.auth.client_id = Some(client_id);
        }

        if let Ok(port) = std::env::var("TOOLGATE_REDIRECT_PORT") {
            if let Ok(value) = port.parse() {
                self.auth.redirect_port = value;
            } else {
                tracing::warn!("Invalid TOOLGATE_REDIRECT_PORT: {}", port);
            }
        }

        if let Ok(url) = std::env::var("TOOLGATE_DISCOVERY_URL") {
            self.auth.discovery_url = Some(url);
        }

        if let Ok(api_base) = std::env::var("TOOLGATE_LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(model) = std::env::var("TOOLGATE_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.key.trim().is_empty() {
                return Err(
                    ToolgateError::Config("server entry with empty key".to_string()).into(),
                );
            }
            if !seen.insert(server.key.as_str()) {
                return Err(ToolgateError::Config(format!(
                    "duplicate server key '{}'",
                    server.key
                ))
                .into());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
