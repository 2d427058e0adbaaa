//! Process configuration.
//!
//! Settings come from (highest precedence first) command-line flags, environment variables,
//! and an optional YAML file. They are resolved once into a [`ServerConfig`] and never change
//! afterwards.

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use waldur_client::ClientConfig;
use waldur_client::config::{DEFAULT_AUTH_SCHEME, DEFAULT_TIMEOUT};

/// How a name lookup picks among several matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Take the first entry in upstream order.
    #[default]
    First,
    /// Fail when more than one entry matches.
    Unique,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "waldur-mcp",
    version,
    about = "Expose the Waldur REST API as MCP tools, resources and prompts"
)]
pub struct Cli {
    /// Waldur API root, e.g. https://waldur.example.org/api/
    #[arg(long, env = "WALDUR_API_URL")]
    pub api_url: Option<String>,

    /// API token
    #[arg(long, env = "WALDUR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Scheme written before the token in the Authorization header
    #[arg(long, env = "WALDUR_AUTH_SCHEME")]
    pub auth_scheme: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "WALDUR_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// What to do when a name lookup returns several entries
    #[arg(long, env = "WALDUR_MATCH_POLICY", value_enum)]
    pub match_policy: Option<MatchPolicy>,

    /// File whose content describes the database structure for the query prompt
    #[arg(long, env = "WALDUR_SCHEMA_FILE")]
    pub schema_file: Option<PathBuf>,

    /// Optional YAML config file
    #[arg(long, env = "WALDUR_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serve streamable HTTP at /mcp on this address instead of stdio
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// YAML config file. All keys optional, camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub auth_scheme: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub match_policy: Option<MatchPolicy>,
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
    #[serde(default)]
    pub bind: Option<SocketAddr>,
}

impl FileConfig {
    /// Read a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and [`ConfigError::Yaml`] if it
    /// does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved, validated settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub client: ClientConfig,
    pub match_policy: MatchPolicy,
    /// Content of the schema file, loaded at startup.
    pub schema_text: Option<String>,
    pub bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Resolve settings from the command line and, when given, the config file it names.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is unreadable, if the API URL or token is
    /// missing, or if any value is invalid.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge CLI/env values over file values and validate the result.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_cli`], minus file loading.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let api_url = non_blank(cli.api_url.clone())
            .or_else(|| non_blank(file.api_url))
            .ok_or(ConfigError::Missing("WALDUR_API_URL (--api-url)"))?;
        let token = non_blank(cli.token.clone())
            .or_else(|| non_blank(file.token))
            .ok_or(ConfigError::Missing("WALDUR_TOKEN (--token)"))?;
        let auth_scheme = non_blank(cli.auth_scheme.clone())
            .or_else(|| non_blank(file.auth_scheme))
            .unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string());
        let timeout = cli
            .timeout_secs
            .or(file.timeout_secs)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        let client = ClientConfig::new(&api_url, token, auth_scheme, timeout)?;

        let schema_text = match cli.schema_file.clone().or(file.schema_file) {
            Some(path) => Some(std::fs::read_to_string(&path).map_err(|source| {
                ConfigError::Io { path, source }
            })?),
            None => None,
        };

        Ok(Self {
            client,
            match_policy: cli.match_policy.or(file.match_policy).unwrap_or_default(),
            schema_text,
            bind: cli.bind.or(file.bind),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
