//! Error types for the Waldur MCP server.

use rmcp::model::{CallToolResult, Content, ErrorData};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use waldur_client::ClientError;

/// Startup failures. Any of these stops the process before it serves a single request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl From<ClientError> for ConfigError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Config(msg) => Self::Invalid(msg),
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Failure of a single tool call.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream API returned {status}: {body}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("{kind} name '{name}' matched {matches} entries; use a more specific name")]
    Ambiguous {
        kind: String,
        name: String,
        matches: usize,
    },

    #[error("{kind} lookup '{name}' failed: {source}")]
    Lookup {
        kind: String,
        name: String,
        #[source]
        source: Box<ToolError>,
    },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl From<ClientError> for ToolError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Config(msg) => Self::Config(msg),
            ClientError::Transport(msg) => Self::Transport(msg),
            ClientError::Upstream { status, body } => Self::Upstream { status, body },
            ClientError::Malformed(msg) => Self::Malformed(msg),
        }
    }
}

impl ToolError {
    pub(crate) fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub(crate) fn lookup(kind: impl Into<String>, name: impl Into<String>, source: Self) -> Self {
        Self::Lookup {
            kind: kind.into(),
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Upstream status and body, looking through lookup context.
    #[must_use]
    pub fn upstream(&self) -> Option<(u16, &serde_json::Value)> {
        match self {
            Self::Upstream { status, body } => Some((*status, body)),
            Self::Lookup { source, .. } => source.upstream(),
            _ => None,
        }
    }

    /// Whether the host should see this as a protocol error rather than a failed tool result.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::UnknownTool { .. } | Self::InvalidArguments { .. })
    }

    /// Convert into the host's result channel.
    ///
    /// Unknown tools and bad arguments are protocol-level `invalid_params` errors. Everything
    /// else is a tool result flagged as an error, so the model can read the reason.
    ///
    /// # Errors
    ///
    /// Returns `ErrorData` for [`ToolError::UnknownTool`] and [`ToolError::InvalidArguments`].
    pub fn into_call_result(self) -> Result<CallToolResult, ErrorData> {
        if self.is_request_error() {
            return Err(ErrorData::invalid_params(self.to_string(), None));
        }
        Ok(CallToolResult::error(vec![Content::text(self.to_string())]))
    }

    /// Structured form used in per-email invitation reports.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self.upstream() {
            Some((status, body)) => json!({
                "message": self.to_string(),
                "status": status,
                "body": body,
            }),
            None => json!({ "message": self.to_string() }),
        }
    }
}
