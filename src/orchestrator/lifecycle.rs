//! Capability handle lifecycle management
//!
//! Opens one [`CapabilityHandle`] per selected server and guarantees
//! symmetric teardown. The manager exclusively owns the set of currently
//! open handles behind a mutex; every successful open is recorded there
//! **before** the next server is attempted, so a failure partway through
//! activation still leaves every prior handle tracked for release.
//! `release` drains the record, which makes a second call a natural no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::auth::AccessCredential;
use crate::error::{Result, ToolgateError};
use crate::mcp::types::CallToolResult;
use crate::mcp::{McpSession, Tool};
use crate::orchestrator::discovery::ServerFailure;
use crate::orchestrator::registry::ServerRegistry;
use crate::orchestrator::selection::SelectionMap;

/// An open, per-server resource bound to a subset of that server's tools.
///
/// Owns the live session; released exactly once when the manager closes it.
/// No other component may keep a reference across a release.
#[derive(Debug)]
pub struct CapabilityHandle {
    /// Registry key of the server this handle is bound to.
    pub server_key: String,
    /// The activated tool names, in selection order.
    pub tools: Vec<String>,
    /// Full definitions (including input schemas) of the activated tools.
    pub tool_defs: Vec<Tool>,
    session: McpSession,
}

impl CapabilityHandle {
    /// Invokes one of the activated tools through this handle's session.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::Mcp`] when `name` is outside the activated
    /// scope or the invocation itself fails.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        if !self.tools.iter().any(|t| t == name) {
            return Err(ToolgateError::Mcp(format!(
                "tool '{name}' is not in the activated scope of server '{}'",
                self.server_key
            ))
            .into());
        }
        self.session.call_tool(name, arguments).await
    }

    async fn close(self) -> Result<()> {
        self.session.close().await
    }
}

/// Owns and tracks the currently open capability handles.
///
/// The open-handle record is the only mutable shared structure in the
/// orchestrator and is guarded by a single mutex against concurrent
/// activate/release races.
#[derive(Debug)]
pub struct LifecycleManager {
    http: Arc<reqwest::Client>,
    credential: AccessCredential,
    timeout: Duration,
    open: Mutex<Vec<CapabilityHandle>>,
}

impl LifecycleManager {
    /// Creates a manager with no open handles.
    pub fn new(http: Arc<reqwest::Client>, credential: AccessCredential, timeout: Duration) -> Self {
        Self {
            http,
            credential,
            timeout,
            open: Mutex::new(Vec::new()),
        }
    }

    /// Opens a handle for every server referenced by the selection map.
    ///
    /// Servers are visited in registry order for determinism. Each open
    /// performs the session handshake, re-lists the server's tools, and
    /// scopes the handle to the intersection of the selection with what the
    /// server still advertises. A single server's failure is logged and
    /// skipped.
    ///
    /// # Returns
    ///
    /// The number of handles now open.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::NoHandlesActivated`] when every open failed
    /// and nothing is tracked.
    pub async fn activate(
        &self,
        registry: &ServerRegistry,
        selection: &SelectionMap,
    ) -> Result<usize> {
        for server in registry.servers() {
            let Some(selected) = selection.get(&server.key) else {
                continue;
            };

            match self.open_handle(server, selected).await {
                Ok(handle) => {
                    tracing::info!(
                        server = %server.key,
                        tools = handle.tools.len(),
                        "capability handle opened"
                    );
                    // Record before attempting the next server, so a later
                    // failure still leaves this handle tracked for release.
                    self.open.lock().await.push(handle);
                }
                Err(e) => {
                    tracing::warn!(server = %server.key, error = %e, "handle activation failed");
                }
            }
        }

        let count = self.open.lock().await.len();
        if count == 0 {
            return Err(ToolgateError::NoHandlesActivated.into());
        }
        Ok(count)
    }

    /// Borrows the currently open handles for tool invocation.
    ///
    /// The guard holds the activation/release mutex; drop it before calling
    /// [`LifecycleManager::release`].
    pub async fn handles(&self) -> MutexGuard<'_, Vec<CapabilityHandle>> {
        self.open.lock().await
    }

    /// Closes every tracked handle.
    ///
    /// Drains the open-handle record and closes each handle in turn. A
    /// failing close is recorded and never prevents closing the rest.
    /// Safe to call after a partially failed activation, and a second call
    /// finds an empty record and does nothing.
    pub async fn release(&self) -> Vec<ServerFailure> {
        let handles: Vec<CapabilityHandle> = self.open.lock().await.drain(..).collect();
        let mut failures = Vec::new();

        for handle in handles {
            let server_key = handle.server_key.clone();
            if let Err(e) = handle.close().await {
                tracing::warn!(server = %server_key, error = %e, "handle close failed");
                failures.push(ServerFailure {
                    server_key,
                    message: e.to_string(),
                });
            } else {
                tracing::debug!(server = %server_key, "capability handle closed");
            }
        }
        failures
    }

    /// Opens one handle scoped to the selected tool names.
    async fn open_handle(
        &self,
        server: &crate::orchestrator::registry::ServerDescriptor,
        selected: &[String],
    ) -> Result<CapabilityHandle> {
        let session = McpSession::connect(
            Arc::clone(&self.http),
            server.url.clone(),
            &self.credential.token,
            self.timeout,
        )
        .await?;

        let advertised = match session.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                // The session opened but listing failed; close it before
                // surfacing the error so it cannot leak untracked.
                if let Err(close_err) = session.close().await {
                    tracing::warn!(server = %server.key, error = %close_err, "close failed after listing error");
                }
                return Err(e);
            }
        };

        let tool_defs: Vec<Tool> = advertised
            .into_iter()
            .filter(|tool| selected.iter().any(|name| *name == tool.name))
            .collect();
        let tools: Vec<String> = selected
            .iter()
            .filter(|name| tool_defs.iter().any(|t| t.name == **name))
            .cloned()
            .collect();

        Ok(CapabilityHandle {
            server_key: server.key.clone(),
            tools,
            tool_defs,
            session,
        })
    }
}
