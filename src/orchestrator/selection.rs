//! Tool selection contract and fallback policy
//!
//! The canonical selection path hands a condensed tool list and the request
//! text to an external reasoning collaborator (the [`ToolSelector`] seam)
//! and expects back a bare JSON object mapping server keys to tool-name
//! arrays. The payload is parsed into a tagged [`SelectionOutcome`]; a
//! malformed payload or collaborator failure degrades to the identity
//! fallback (everything available) instead of failing the request, and the
//! final map is filtered against the registry and the latest discovery
//! result before activation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::orchestrator::discovery::DiscoveredTool;
use crate::orchestrator::registry::ServerRegistry;

/// Mapping from server key to the ordered tool names to activate there.
pub type SelectionMap = HashMap<String, Vec<String>>;

/// Condensed view of a discovered tool, as handed to the reasoning
/// collaborator. The `server` field carries the registry key so the
/// collaborator's answer round-trips into a [`SelectionMap`] unchanged.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BriefTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Registry key of the owning server.
    pub server: String,
}

/// Tagged result of parsing the collaborator's selection payload.
///
/// The payload is either a structurally valid selection map or opaque
/// malformed text; there is no in-between that gets partially trusted.
#[derive(Debug)]
pub enum SelectionOutcome {
    /// Payload parsed as a `{serverKey: [toolName, ...]}` object.
    Valid(SelectionMap),
    /// Payload did not parse; carries the raw text for diagnostics.
    Malformed(String),
}

/// The external reasoning collaborator deciding which tools matter for a
/// request. Implementations return the raw payload text; parsing and
/// validation stay on this side of the seam.
#[async_trait]
pub trait ToolSelector: Send + Sync {
    /// Produces the raw selection payload for the given tools and request.
    async fn select_tools(&self, tools: &[BriefTool], request: &str) -> Result<String>;
}

/// Builds the condensed tool view handed to the collaborator. When the
/// registry knows the server, its description enriches the tool's own.
pub fn brief_view(tools: &[DiscoveredTool], registry: &ServerRegistry) -> Vec<BriefTool> {
    tools
        .iter()
        .map(|tool| {
            let description = match registry.lookup(&tool.server_key) {
                Some(server) if tool.description.is_empty() => server.description.clone(),
                _ => tool.description.clone(),
            };
            BriefTool {
                name: tool.name.clone(),
                description,
                server: tool.server_key.clone(),
            }
        })
        .collect()
}

/// Parses the collaborator's payload into a tagged outcome.
///
/// Only a bare JSON object of `string -> [string]` (after whitespace
/// trimming) is `Valid`; fenced code blocks, commentary, arrays, or mixed
/// value types are all `Malformed`.
pub fn parse_selection(raw: &str) -> SelectionOutcome {
    match serde_json::from_str::<SelectionMap>(raw.trim()) {
        Ok(map) => SelectionOutcome::Valid(map),
        Err(_) => SelectionOutcome::Malformed(raw.to_string()),
    }
}

/// Identity fallback: every discovered tool, grouped by its owning server,
/// discovery order preserved, duplicates removed.
pub fn select_all(tools: &[DiscoveredTool]) -> SelectionMap {
    let mut map: SelectionMap = HashMap::new();
    for tool in tools {
        let entry = map.entry(tool.server_key.clone()).or_default();
        if !entry.contains(&tool.name) {
            entry.push(tool.name.clone());
        }
    }
    map
}

/// Filters a selection map against the registry and the latest discovery
/// result.
///
/// Unknown server keys, tool names the server never advertised, and
/// duplicate names are dropped silently (logged at debug level); servers
/// whose entry ends up empty are removed entirely. Filtering never fails.
pub fn filter_selection(
    selection: SelectionMap,
    registry: &ServerRegistry,
    tools: &[DiscoveredTool],
) -> SelectionMap {
    let mut known: HashMap<&str, HashSet<&str>> = HashMap::new();
    for tool in tools {
        known
            .entry(tool.server_key.as_str())
            .or_default()
            .insert(tool.name.as_str());
    }

    let mut filtered: SelectionMap = HashMap::new();
    for (server_key, names) in selection {
        if registry.lookup(&server_key).is_none() {
            tracing::debug!(server = %server_key, "dropping selection entry for unknown server");
            continue;
        }
        let advertised = known.get(server_key.as_str());
        let mut kept = Vec::new();
        for name in names {
            let is_known = advertised.is_some_and(|set| set.contains(name.as_str()));
            if is_known && !kept.contains(&name) {
                kept.push(name);
            } else if !is_known {
                tracing::debug!(server = %server_key, tool = %name, "dropping unknown tool from selection");
            }
        }
        if !kept.is_empty() {
            filtered.insert(server_key, kept);
        }
    }
    filtered
}
