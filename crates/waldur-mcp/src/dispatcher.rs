//! Routes a validated tool call to the client, the projections or the invitation workflow.

use crate::config::{MatchPolicy, ServerConfig};
use crate::error::{ConfigError, ToolError};
use crate::invitations::{InvitationBatch, InvitationReport, InvitationWorkflow};
use crate::scope::ScopeResolver;
use crate::tools::{ToolCall, ToolName};
use rmcp::model::{CallToolResult, Content, ErrorData, JsonObject};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};
use waldur_client::formatter::format_records;
use waldur_client::{QueryParams, WaldurClient};

/// Successful result of one tool call, before it is wrapped for the host.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Projected list records.
    Records(Vec<Value>),
    /// Query rows as returned upstream.
    Rows(Value),
    Invitations(InvitationReport),
}

impl ToolOutput {
    /// Wrap as JSON text content. An invitation report with a failed email is flagged as an
    /// error but still carries the full report.
    #[must_use]
    pub fn into_call_result(self) -> CallToolResult {
        let (body, is_error) = match self {
            Self::Records(items) => (Value::Array(items), false),
            Self::Rows(rows) => (rows, false),
            Self::Invitations(report) => {
                let failed = report.has_failures();
                let body = serde_json::to_value(&report).unwrap_or(Value::Null);
                (body, failed)
            }
        };
        let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
        if is_error {
            CallToolResult::error(vec![Content::text(text)])
        } else {
            CallToolResult::success(vec![Content::text(text)])
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    client: WaldurClient,
    invitations: InvitationWorkflow,
}

impl Dispatcher {
    /// Build the shared client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let client = WaldurClient::new(&config.client)?;
        Ok(Self::new(client, config.match_policy))
    }

    #[must_use]
    pub fn new(client: WaldurClient, policy: MatchPolicy) -> Self {
        let resolver = ScopeResolver::new(client.clone(), policy);
        let invitations = InvitationWorkflow::new(client.clone(), resolver);
        Self {
            client,
            invitations,
        }
    }

    #[must_use]
    pub fn client(&self) -> &WaldurClient {
        &self.client
    }

    /// Validate and run one tool call.
    ///
    /// # Errors
    ///
    /// [`ToolError::UnknownTool`] and [`ToolError::InvalidArguments`] before any network call;
    /// otherwise whatever the client, resolver or projection reports.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
    ) -> Result<ToolOutput, ToolError> {
        let call = ToolCall::parse(name, arguments)?;
        self.execute(call).await
    }

    /// Run a validated call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dispatch`], minus validation.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::Query(args) => Ok(ToolOutput::Rows(self.client.query(&args.sql).await?)),
            ToolCall::ListCustomers(args) => self.list(ToolName::ListCustomers, &args).await,
            ToolCall::ListProjects(args) => self.list(ToolName::ListProjects, &args).await,
            ToolCall::ListResources(args) => self.list(ToolName::ListResources, &args).await,
            ToolCall::ListOfferings(args) => self.list(ToolName::ListOfferings, &args).await,
            ToolCall::ListInvoices(args) => self.list(ToolName::ListInvoices, &args).await,
            ToolCall::CreateInvitation(args) => {
                let batch = InvitationBatch {
                    scope_type: args.scope_type,
                    scope_name: args.scope_name,
                    role: args.role,
                    emails: args.emails,
                    extra_invitation_text: args.extra_invitation_text,
                };
                Ok(ToolOutput::Invitations(self.invitations.run(&batch).await?))
            }
        }
    }

    /// Dispatch and convert to the host's result channel, logging the outcome.
    ///
    /// # Errors
    ///
    /// Returns `invalid_params` for unknown tools and bad arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let started = Instant::now();
        match self.dispatch(name, arguments).await {
            Ok(output) => {
                info!(
                    tool = %name,
                    elapsed = ?started.elapsed(),
                    "tool call completed"
                );
                Ok(output.into_call_result())
            }
            Err(e) => {
                warn!(
                    tool = %name,
                    elapsed = ?started.elapsed(),
                    error = %e,
                    "tool call failed"
                );
                e.into_call_result()
            }
        }
    }

    async fn list<A: Serialize>(&self, tool: ToolName, args: &A) -> Result<ToolOutput, ToolError> {
        let (path, kind) = tool
            .listing()
            .ok_or_else(|| ToolError::Config(format!("{} is not a list tool", tool.as_str())))?;
        let query = filters(args)?;
        let items = self.client.list(path, &query).await?;
        Ok(ToolOutput::Records(format_records(&items, kind)?))
    }
}

fn filters<A: Serialize>(args: &A) -> Result<QueryParams, ToolError> {
    match serde_json::to_value(args) {
        Ok(Value::Object(map)) => Ok(QueryParams::from_object(&map)),
        Ok(_) => Ok(QueryParams::new()),
        Err(e) => Err(ToolError::Malformed(format!("cannot encode filters: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ToolOutput, filters};
    use crate::invitations::{InvitationOutcome, InvitationReport, InvitationStatus};
    use crate::scope::ScopeType;
    use crate::tools::ListProjectsArgs;
    use rmcp::model::RawContent;
    use serde_json::{Value, json};

    fn text_of(result: &rmcp::model::CallToolResult) -> Value {
        let RawContent::Text(t) = &result.content[0].raw else {
            panic!("expected text content");
        };
        serde_json::from_str(&t.text).expect("json text")
    }

    #[test]
    fn filters_skip_unset_arguments() {
        let args = ListProjectsArgs {
            name: Some("foo".to_string()),
            page: Some(2),
            ..ListProjectsArgs::default()
        };
        let q = filters(&args).expect("filters");
        let pairs: Vec<(&str, &str)> = q.iter().collect();
        assert_eq!(pairs, [("name", "foo"), ("page", "2")]);
    }

    #[test]
    fn records_are_returned_as_json_text() {
        let result = ToolOutput::Records(vec![json!({"uuid": "p1"})]).into_call_result();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text_of(&result), json!([{"uuid": "p1"}]));
    }

    #[test]
    fn failed_invitation_report_is_flagged() {
        let report = InvitationReport {
            scope_type: ScopeType::Customer,
            scope_name: "Acme".to_string(),
            scope: "https://example.org/api/customers/c1/".to_string(),
            role: "r1".to_string(),
            results: vec![InvitationOutcome {
                email: "a@x.com".to_string(),
                status: InvitationStatus::Failed,
                invitation: None,
                error: Some(json!({"message": "boom"})),
            }],
        };
        let result = ToolOutput::Invitations(report).into_call_result();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result)["results"][0]["status"], "failed");
    }
}
