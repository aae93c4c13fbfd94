//! Toolgate - multi-server tool gateway library
//!
//! This library authorizes against an OAuth2 provider using the
//! PKCE-protected authorization-code grant, then orchestrates tool
//! discovery, selection, and invocation across a registry of MCP
//! capability servers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: PKCE authorization engine with endpoint discovery and
//!   dynamic client registration
//! - `mcp`: streamable-HTTP MCP session and wire types
//! - `orchestrator`: server registry, tool discovery, selection, and
//!   handle lifecycle
//! - `llm`: OpenAI-compatible chat completion client and tool selector
//! - `agent`: bounded tool-calling answer loop
//! - `env_store`: dotenv-style credential persistence
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use toolgate::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     println!("{} servers configured", config.servers.len());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod env_store;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod orchestrator;

// Re-export commonly used types
pub use auth::{AccessCredential, AuthFlow, AuthFlowConfig};
pub use config::Config;
pub use error::{Result, ToolgateError};
pub use orchestrator::{ServerRegistry, ToolOrchestrator};
