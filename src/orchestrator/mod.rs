//! Multi-server capability orchestration
//!
//! Given a bearer credential from the authorization engine, the
//! orchestrator maintains the static server registry, discovers each
//! server's tools, narrows them to the subset relevant to a request, and
//! manages the acquire/release lifecycle of per-server capability handles
//! without leaking sessions on partial failure.
//!
//! # Module Layout
//!
//! - [`registry`]  -- static, ordered server registry
//! - [`discovery`] -- partial-failure-tolerant tool discovery
//! - [`selection`] -- selection contract, parsing, and identity fallback
//! - [`lifecycle`] -- handle activation and symmetric teardown

pub mod discovery;
pub mod lifecycle;
pub mod registry;
pub mod selection;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::MutexGuard;

use crate::auth::AccessCredential;
use crate::error::{Result, ToolgateError};
pub use discovery::{DiscoveredTool, ServerFailure};
pub use lifecycle::{CapabilityHandle, LifecycleManager};
pub use registry::{ServerDescriptor, ServerRegistry};
pub use selection::{BriefTool, SelectionMap, SelectionOutcome, ToolSelector};

/// Facade wiring the registry, discovery, selection, and handle lifecycle
/// into one orchestration pass.
///
/// The credential is injected at construction; nothing here reads ambient
/// process state. Registry and credential are immutable after
/// construction; the open-handle record inside the lifecycle manager is
/// the only mutable shared state.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use toolgate::auth::AccessCredential;
/// use toolgate::orchestrator::{ServerRegistry, ToolOrchestrator};
///
/// # async fn example(registry: ServerRegistry) -> toolgate::error::Result<()> {
/// let orchestrator = ToolOrchestrator::new(
///     Arc::new(reqwest::Client::new()),
///     registry,
///     AccessCredential::new("bearer-token"),
///     Duration::from_secs(60),
/// );
///
/// let (tools, failures) = orchestrator.discover_tools().await?;
/// println!("{} tools, {} servers failed", tools.len(), failures.len());
/// # Ok(())
/// # }
/// ```
pub struct ToolOrchestrator {
    http: Arc<reqwest::Client>,
    registry: ServerRegistry,
    credential: AccessCredential,
    timeout: Duration,
    lifecycle: LifecycleManager,
}

impl ToolOrchestrator {
    /// Creates an orchestrator over a fixed registry and credential.
    pub fn new(
        http: Arc<reqwest::Client>,
        registry: ServerRegistry,
        credential: AccessCredential,
        timeout: Duration,
    ) -> Self {
        let lifecycle = LifecycleManager::new(Arc::clone(&http), credential.clone(), timeout);
        Self {
            http,
            registry,
            credential,
            timeout,
            lifecycle,
        }
    }

    /// The static server registry.
    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Discovers the tools of every registered server.
    ///
    /// Per-server failures are tolerated and returned alongside the
    /// aggregate tool list; an empty aggregate is a hard failure because a
    /// pass with zero tools cannot serve any request.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::NoCapabilitiesAvailable`] when no server
    /// yielded any tools.
    pub async fn discover_tools(&self) -> Result<(Vec<DiscoveredTool>, Vec<ServerFailure>)> {
        let (tools, failures) =
            discovery::discover_all(&self.http, &self.registry, &self.credential, self.timeout)
                .await?;

        if tools.is_empty() {
            return Err(ToolgateError::NoCapabilitiesAvailable.into());
        }
        Ok((tools, failures))
    }

    /// Selects the subset of tools relevant to a request.
    ///
    /// Delegates to the reasoning collaborator with the condensed tool
    /// view; a collaborator failure or malformed payload degrades to the
    /// identity fallback (every tool, grouped by server). The result is
    /// always filtered against the registry and the discovery result, so
    /// it never references unknown servers or tools. This method cannot
    /// fail.
    pub async fn select_relevant(
        &self,
        selector: &dyn ToolSelector,
        tools: &[DiscoveredTool],
        request: &str,
    ) -> SelectionMap {
        let brief = selection::brief_view(tools, &self.registry);

        let selected = match selector.select_tools(&brief, request).await {
            Ok(raw) => match selection::parse_selection(&raw) {
                SelectionOutcome::Valid(map) => map,
                SelectionOutcome::Malformed(text) => {
                    tracing::warn!(
                        error = %ToolgateError::SelectionMalformed(text.chars().take(200).collect()),
                        "falling back to selecting every discovered tool"
                    );
                    selection::select_all(tools)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "selection collaborator failed; falling back to selecting every discovered tool");
                selection::select_all(tools)
            }
        };

        selection::filter_selection(selected, &self.registry, tools)
    }

    /// Opens capability handles for the selected servers. See
    /// [`LifecycleManager::activate`].
    pub async fn activate(&self, selection: &SelectionMap) -> Result<usize> {
        self.lifecycle.activate(&self.registry, selection).await
    }

    /// Borrows the currently open handles.
    pub async fn handles(&self) -> MutexGuard<'_, Vec<CapabilityHandle>> {
        self.lifecycle.handles().await
    }

    /// Releases every open handle. See [`LifecycleManager::release`].
    pub async fn release(&self) -> Vec<ServerFailure> {
        self.lifecycle.release().await
    }
}
