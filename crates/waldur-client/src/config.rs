//! Connection settings for [`WaldurClient`](crate::WaldurClient), checked before any request.

use crate::error::{ClientError, Result};
use std::time::Duration;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `Authorization` scheme used by Waldur API tokens.
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Connection settings for a [`crate::client::WaldurClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://waldur.example.org/api/`.
    pub base_url: Url,
    /// Static API token.
    pub token: String,
    /// Scheme written before the token in the `Authorization` header.
    pub auth_scheme: String,
    /// Upper bound for every request; never zero.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build and validate a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL does not parse or is not `http(s)`, if
    /// the token or auth scheme is blank, or if the timeout is zero.
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        auth_scheme: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            ClientError::Config(format!("Invalid API URL '{base_url}': {e}"))
        })?;
        let scheme = base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ClientError::Config(format!(
                "Invalid API URL '{base_url}': unsupported scheme '{scheme}'"
            )));
        }

        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::Config("API token must not be empty".to_string()));
        }

        let auth_scheme = auth_scheme.into();
        let auth_scheme = auth_scheme.trim();
        if auth_scheme.is_empty() || auth_scheme.contains(char::is_whitespace) {
            return Err(ClientError::Config(format!(
                "Invalid auth scheme '{auth_scheme}'"
            )));
        }

        if timeout.is_zero() {
            return Err(ClientError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            token: token.trim().to_string(),
            auth_scheme: auth_scheme.to_string(),
            timeout,
        })
    }
}
