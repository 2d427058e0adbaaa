//! Error types for `waldur-client`.

use crate::client::describe_transport_error;
use thiserror::Error;

/// Failure modes of a single call against the Waldur REST API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid client configuration (base URL, auth scheme, timeout).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response (DNS, connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status.
    #[error("Upstream API returned {status}: {body}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    /// The API answered 2xx but the payload does not have the expected shape.
    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(describe_transport_error(value))
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
