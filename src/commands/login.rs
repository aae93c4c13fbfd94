//! Login command handler
//!
//! Resolves the authorization endpoints, runs the browser flow, and
//! persists the bearer token (and any dynamically registered client id)
//! to the configured credential file.

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use crate::auth::{resolve_endpoints, AuthFlow, AuthFlowConfig};
use crate::config::Config;
use crate::env_store;
use crate::error::{Result, ToolgateError};

/// Runs the authorization flow and stores the resulting credential.
///
/// A successful exchange that carries an empty token is reported to the
/// user but never persisted, so a later `ask` does not run with a
/// credential that cannot work.
pub async fn run_login(config: Config) -> Result<()> {
    let http = Arc::new(reqwest::Client::new());
    let fallback = config.auth.fallback_endpoints();

    let endpoints = match &config.auth.discovery_url {
        Some(url) => resolve_endpoints(&http, url, &fallback).await,
        None => {
            tracing::debug!("no discovery URL configured, using static endpoints");
            fallback
        }
    };

    let env_file = Path::new(&config.auth.env_file);
    let client_id = match &config.auth.client_id {
        Some(id) => Some(id.clone()),
        None => env_store::get_key(env_file, env_store::CLIENT_ID_KEY)?,
    };

    let flow = AuthFlow::new(
        http,
        endpoints,
        AuthFlowConfig {
            client_id,
            redirect_port: config.auth.redirect_port,
        },
    );

    let outcome = flow.authorize().await?;

    if outcome.registered {
        env_store::set_key(env_file, env_store::CLIENT_ID_KEY, &outcome.client_id)?;
        println!(
            "Registered new client {}",
            outcome.client_id.as_str().cyan()
        );
    }

    if outcome.credential.is_empty() {
        println!(
            "{}",
            "Authorization completed but the token endpoint returned an empty token; nothing was stored."
                .yellow()
        );
        return Err(ToolgateError::Config(
            "authorization server returned an empty access token".to_string(),
        )
        .into());
    }

    env_store::set_key(
        env_file,
        env_store::ACCESS_TOKEN_KEY,
        &outcome.credential.token,
    )?;
    println!(
        "{} Token stored in {}",
        "Authorization successful.".green(),
        config.auth.env_file
    );
    Ok(())
}
