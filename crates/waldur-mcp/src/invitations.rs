//! Role + scope lookup followed by one invitation per email.

use crate::error::ToolError;
use crate::scope::{ScopeResolver, ScopeType};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use waldur_client::{InvitationRequest, WaldurClient};

/// Input of [`InvitationWorkflow::run`].
#[derive(Debug, Clone)]
pub struct InvitationBatch {
    pub scope_type: ScopeType,
    pub scope_name: String,
    pub role: String,
    pub emails: Vec<String>,
    pub extra_invitation_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Sent,
    Failed,
    NotAttempted,
}

/// Outcome for one email, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationOutcome {
    pub email: String,
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationReport {
    pub scope_type: ScopeType,
    pub scope_name: String,
    pub scope: String,
    pub role: String,
    pub results: Vec<InvitationOutcome>,
}

impl InvitationReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == InvitationStatus::Failed)
    }
}

#[derive(Clone)]
pub struct InvitationWorkflow {
    client: WaldurClient,
    resolver: ScopeResolver,
}

impl InvitationWorkflow {
    #[must_use]
    pub fn new(client: WaldurClient, resolver: ScopeResolver) -> Self {
        Self { client, resolver }
    }

    /// Resolve the role, then the scope, then send invitations one email at a time.
    ///
    /// Sending stops at the first failing email; later emails are reported as not attempted.
    /// Invitations already created stay created.
    ///
    /// # Errors
    ///
    /// Only lookup failures (role or scope) are errors. Per-email failures are recorded in the
    /// returned report.
    pub async fn run(&self, batch: &InvitationBatch) -> Result<InvitationReport, ToolError> {
        let role = self.resolver.resolve_role(&batch.role).await?;
        let scope = self
            .resolver
            .resolve(batch.scope_type, &batch.scope_name)
            .await?;

        let mut results = Vec::with_capacity(batch.emails.len());
        let mut halted = false;

        for email in &batch.emails {
            if halted {
                results.push(InvitationOutcome {
                    email: email.clone(),
                    status: InvitationStatus::NotAttempted,
                    invitation: None,
                    error: None,
                });
                continue;
            }

            let request = InvitationRequest {
                scope: scope.as_str().to_string(),
                role: role.clone(),
                email: email.clone(),
                extra_invitation_text: batch.extra_invitation_text.clone(),
            };

            match self.client.create_invitation(&request).await {
                Ok(invitation) => {
                    info!(email = %email, scope = %batch.scope_name, "invitation sent");
                    results.push(InvitationOutcome {
                        email: email.clone(),
                        status: InvitationStatus::Sent,
                        invitation: Some(invitation),
                        error: None,
                    });
                }
                Err(e) => {
                    let err = ToolError::from(e);
                    warn!(email = %email, scope = %batch.scope_name, error = %err, "invitation failed");
                    results.push(InvitationOutcome {
                        email: email.clone(),
                        status: InvitationStatus::Failed,
                        invitation: None,
                        error: Some(err.to_json()),
                    });
                    halted = true;
                }
            }
        }

        Ok(InvitationReport {
            scope_type: batch.scope_type,
            scope_name: batch.scope_name.clone(),
            scope: scope.0,
            role,
            results,
        })
    }
}
