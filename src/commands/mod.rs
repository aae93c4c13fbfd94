//! Command handlers for the CLI
//!
//! Each subcommand gets one handler module:
//!
//! - `login` -- run the browser authorization flow and persist the token
//! - `ask`   -- one orchestration pass answering a single question
//! - `chat`  -- interactive readline session over one orchestration pass
//!
//! The handlers are thin; all behavior lives in the library modules they
//! wire together.

pub mod ask;
pub mod chat;
pub mod login;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AccessCredential;
use crate::config::Config;
use crate::env_store;
use crate::error::{Result, ToolgateError};
use crate::llm::LlmClient;
use crate::orchestrator::{ServerRegistry, ToolOrchestrator};

/// Builds the orchestrator and chat client from configuration and the
/// stored credential.
///
/// # Errors
///
/// Fails when no servers are configured, no bearer token has been stored,
/// or the API key environment variable is unset.
fn build_session(config: &Config) -> Result<(ToolOrchestrator, LlmClient)> {
    if config.servers.is_empty() {
        return Err(ToolgateError::Config(
            "no servers configured; add entries under `servers` in the config file".to_string(),
        )
        .into());
    }

    let env_file = Path::new(&config.auth.env_file);
    let token = env_store::get_key(env_file, env_store::ACCESS_TOKEN_KEY)?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ToolgateError::Config(
                "no stored access token; run `toolgate login` first".to_string(),
            )
        })?;
    let credential = AccessCredential::new(token);

    let api_key = std::env::var(&config.llm.api_key_env).map_err(|_| {
        ToolgateError::Config(format!(
            "API key environment variable {} is not set",
            config.llm.api_key_env
        ))
    })?;

    let http = Arc::new(reqwest::Client::new());
    let registry = ServerRegistry::new(config.servers.clone());
    let timeout = Duration::from_secs(config.request_timeout_seconds);

    let orchestrator = ToolOrchestrator::new(Arc::clone(&http), registry, credential, timeout);
    let llm = LlmClient::new(http, &config.llm.api_base, api_key, &config.llm.model);
    Ok((orchestrator, llm))
}

/// Runs one full orchestration pass: discover, select, activate.
///
/// Returns with handles open; callers must pair this with
/// [`ToolOrchestrator::release`] on every exit path.
async fn prepare_tools(
    orchestrator: &ToolOrchestrator,
    llm: &LlmClient,
    request: &str,
) -> Result<()> {
    let (tools, failures) = orchestrator.discover_tools().await?;
    for failure in &failures {
        eprintln!(
            "warning: server '{}' unavailable: {}",
            failure.server_key, failure.message
        );
    }
    tracing::info!(
        tools = tools.len(),
        failed_servers = failures.len(),
        "discovery complete"
    );

    let selection = orchestrator.select_relevant(llm, &tools, request).await;
    let activated = orchestrator.activate(&selection).await?;
    tracing::info!(handles = activated, "capability handles open");
    Ok(())
}
