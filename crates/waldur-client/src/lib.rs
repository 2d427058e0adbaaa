//! Client for the Waldur REST API.
//!
//! Request building and authentication, query-parameter shaping, response projection for
//! list endpoints, and tool annotations derived from HTTP semantics. Nothing in this crate
//! knows about MCP sessions or transports.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod formatter;
pub mod params;
pub mod semantics;

pub use client::{InvitationRequest, WaldurClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use formatter::EntityKind;
pub use params::QueryParams;
