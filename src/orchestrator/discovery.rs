//! Tool discovery across every registered capability server
//!
//! Opens a short-lived session against each server in registry order,
//! lists its tools, and tags each tool with the owning server key. A
//! failure on one server is recorded and skipped so a single unreachable
//! server never denies access to the rest; judging aggregate emptiness is
//! the orchestrator facade's job.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AccessCredential;
use crate::error::{Result, ToolgateError};
use crate::mcp::McpSession;
use crate::orchestrator::registry::ServerRegistry;

/// A tool discovered on a capability server, tagged with the owning
/// server's registry key (a back-reference, not ownership). Ephemeral; a
/// new set is produced by every discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTool {
    /// Tool name, unique within its server.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Registry key of the owning server.
    pub server_key: String,
}

/// A per-server failure recorded during discovery or teardown.
#[derive(Debug, Clone)]
pub struct ServerFailure {
    /// Registry key of the failing server.
    pub server_key: String,
    /// What went wrong.
    pub message: String,
}

/// Discovers the tools of every registered server.
///
/// Servers are visited sequentially in registry order. Each visit opens a
/// bearer-authenticated session, lists tools, and closes the session
/// again; any error along the way is recorded as a [`ServerFailure`] for
/// that server and discovery continues with the next one.
///
/// # Returns
///
/// The aggregate tool list (registry order, then server-advertised order)
/// and the per-server failures. An empty tool list is not an error here;
/// the caller decides whether that is fatal.
pub async fn discover_all(
    http: &Arc<reqwest::Client>,
    registry: &ServerRegistry,
    credential: &AccessCredential,
    timeout: Duration,
) -> Result<(Vec<DiscoveredTool>, Vec<ServerFailure>)> {
    let mut tools = Vec::new();
    let mut failures = Vec::new();

    for server in registry.servers() {
        tracing::info!(server = %server.key, "discovering tools");

        match list_server_tools(http, server, credential, timeout).await {
            Ok(server_tools) => {
                tracing::info!(
                    server = %server.key,
                    count = server_tools.len(),
                    "discovered tools"
                );
                tools.extend(server_tools);
            }
            Err(e) => {
                tracing::warn!(server = %server.key, error = %e, "tool discovery failed");
                failures.push(ServerFailure {
                    server_key: server.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok((tools, failures))
}

/// Lists one server's tools over a short-lived session.
async fn list_server_tools(
    http: &Arc<reqwest::Client>,
    server: &crate::orchestrator::registry::ServerDescriptor,
    credential: &AccessCredential,
    timeout: Duration,
) -> Result<Vec<DiscoveredTool>> {
    let session = McpSession::connect(
        Arc::clone(http),
        server.url.clone(),
        &credential.token,
        timeout,
    )
    .await
    .map_err(|e| ToolgateError::ServerUnreachable {
        server: server.key.clone(),
        message: e.to_string(),
    })?;

    let listed = session.list_tools().await;
    // Close before surfacing a listing error so the session never leaks.
    if let Err(e) = session.close().await {
        tracing::warn!(server = %server.key, error = %e, "session close failed after discovery");
    }

    Ok(listed?
        .into_iter()
        .map(|tool| DiscoveredTool {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            server_key: server.key.clone(),
        })
        .collect())
}
