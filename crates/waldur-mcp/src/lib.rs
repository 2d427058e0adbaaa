//! MCP server exposing the Waldur REST API.
//!
//! A tool call flows through [`dispatcher::Dispatcher`], which validates arguments against the
//! registry in [`tools`], then either lists and projects records, runs a SQL query, or drives
//! the invitation workflow in [`invitations`]. Name lookups live in [`scope`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod invitations;
pub mod prompts;
pub mod resources;
pub mod scope;
pub mod server;
pub mod tools;
pub mod transport;

pub use config::{MatchPolicy, ServerConfig};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, ToolError};
pub use server::WaldurMcpServer;
