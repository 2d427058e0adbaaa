//! Name-to-reference lookups against the Waldur API.
//!
//! Waldur name filters are case-insensitive partial matches, so a lookup can return several
//! candidates. The configured [`MatchPolicy`] decides what happens then.

use crate::config::MatchPolicy;
use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;
use waldur_client::{QueryParams, WaldurClient, endpoints};

/// Organizational container an invitation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Customer,
    Project,
}

impl ScopeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Project => "project",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            Self::Customer => endpoints::CUSTOMERS,
            Self::Project => endpoints::PROJECTS,
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical URL of a customer or project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRef(pub String);

impl ScopeRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct ScopeResolver {
    client: WaldurClient,
    policy: MatchPolicy,
}

impl ScopeResolver {
    #[must_use]
    pub fn new(client: WaldurClient, policy: MatchPolicy) -> Self {
        Self { client, policy }
    }

    /// Look up a customer or project by name and return its URL.
    ///
    /// # Errors
    ///
    /// [`ToolError::NotFound`] on zero matches, [`ToolError::Ambiguous`] on several matches under
    /// [`MatchPolicy::Unique`], [`ToolError::Malformed`] if the match has no `url`, and
    /// [`ToolError::Lookup`] wrapping any client failure.
    pub async fn resolve(&self, scope_type: ScopeType, name: &str) -> Result<ScopeRef, ToolError> {
        let url = self
            .lookup(scope_type.endpoint(), "name", name, scope_type.as_str(), "url")
            .await?;
        Ok(ScopeRef(url))
    }

    /// Look up a role by its description and return its UUID.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`], with `uuid` as the extracted field.
    pub async fn resolve_role(&self, description: &str) -> Result<String, ToolError> {
        self.lookup(endpoints::ROLES, "description", description, "role", "uuid")
            .await
    }

    async fn lookup(
        &self,
        path: &str,
        filter: &str,
        value: &str,
        kind: &str,
        field: &str,
    ) -> Result<String, ToolError> {
        let mut query = QueryParams::new();
        query.push(filter, value);
        let candidates = self
            .client
            .list(path, &query)
            .await
            .map_err(|e| ToolError::lookup(kind, value, e.into()))?;

        let chosen = pick(&candidates, self.policy).map_err(|matches| match matches {
            0 => ToolError::not_found(kind, value),
            n => ToolError::Ambiguous {
                kind: kind.to_string(),
                name: value.to_string(),
                matches: n,
            },
        })?;

        let reference = chosen
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::Malformed(format!("{kind} '{value}' has no '{field}' field"))
            })?;

        debug!(kind, name = value, candidates = candidates.len(), "resolved lookup");
        Ok(reference.to_string())
    }
}

/// Select one candidate, or report how many there were.
fn pick(candidates: &[Value], policy: MatchPolicy) -> Result<&Value, usize> {
    match (candidates, policy) {
        ([], _) => Err(0),
        ([only], _) => Ok(only),
        ([first, ..], MatchPolicy::First) => Ok(first),
        (many, MatchPolicy::Unique) => Err(many.len()),
    }
}
