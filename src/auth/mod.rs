//! OAuth2 authorization engine
//!
//! Negotiates a bearer credential via the PKCE-protected authorization-code
//! grant, with dynamic client registration as the fallback when no static
//! client identifier is configured.
//!
//! # Module Layout
//!
//! - [`discovery`] -- well-known endpoint discovery with default fallback
//! - [`flow`]      -- the authorization state machine and callback handling
//! - [`pkce`]      -- PKCE `S256` challenge generation

pub mod discovery;
pub mod flow;
pub mod pkce;

pub use discovery::{resolve_endpoints, AuthEndpoints};
pub use flow::{AccessCredential, AuthFlow, AuthFlowConfig, AuthorizeOutcome};
