//! Static capability-server registry
//!
//! Holds the configured set of capability servers. Built once at
//! orchestrator construction and never mutated afterwards, so it can be
//! read from any task without locking.

use serde::{Deserialize, Serialize};
use url::Url;

/// Description of one registered capability server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Unique short identifier, used as the selection-map key.
    pub key: String,
    /// Human-readable display name shown to the reasoning collaborator.
    pub name: String,
    /// Endpoint URL of the server.
    pub url: Url,
    /// What this server's tools do, in one sentence.
    #[serde(default)]
    pub description: String,
}

/// Ordered, immutable set of [`ServerDescriptor`] entries.
///
/// Iteration order is the configuration order and defines the
/// deterministic iteration order for discovery and activation.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    servers: Vec<ServerDescriptor>,
}

impl ServerRegistry {
    /// Builds a registry from configured descriptors, preserving order.
    pub fn new(servers: Vec<ServerDescriptor>) -> Self {
        Self { servers }
    }

    /// Returns the registered servers in configuration order.
    pub fn servers(&self) -> &[ServerDescriptor] {
        &self.servers
    }

    /// Looks up a server by its key.
    pub fn lookup(&self, key: &str) -> Option<&ServerDescriptor> {
        self.servers.iter().find(|s| s.key == key)
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// True when no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
