//! Minimal MCP client support
//!
//! Speaks the streamable-HTTP flavour of the Model Context Protocol, just
//! deep enough for this harness: session lifecycle, `tools/list`, and
//! `tools/call`.
//!
//! # Module Layout
//!
//! - `types`   -- JSON-RPC 2.0 primitives and MCP wire types
//! - `session` -- bearer-authenticated HTTP session

pub mod session;
pub mod types;

pub use session::McpSession;
pub use types::Tool;
