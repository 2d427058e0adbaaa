//! MCP surface: tools, resources and prompts over one shared [`Dispatcher`].

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ConfigError;
use crate::{prompts, resources, tools};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData as McpError, GetPromptRequestParams,
    GetPromptResult, Implementation, JsonObject, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ReadResourceRequestParams, ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SERVER_NAME: &str = "waldur-mcp";

const INSTRUCTIONS: &str = "Tools for the Waldur cloud management platform.\n\
- list_customers, list_projects, list_resources, list_offerings, list_invoices: \
one page per call; pass page/page_size to move through results. Name filters are \
case-insensitive partial matches.\n\
- query: run SQL against the reporting database. Read the schema://main resource or the \
schema_aware_query prompt first to see the tables.\n\
- create_invitation: invites each email in order and stops at the first failure. The role \
is found by description and the customer or project by name; when several entries match, \
the first one returned by Waldur is used unless the server runs with the unique match policy.";

#[derive(Clone)]
pub struct WaldurMcpServer {
    dispatcher: Dispatcher,
    schema_text: Option<Arc<str>>,
}

impl WaldurMcpServer {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, schema_text: Option<String>) -> Self {
        Self {
            dispatcher,
            schema_text: schema_text.map(Arc::from),
        }
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the API client cannot be built.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Dispatcher::from_config(config)?,
            config.schema_text.clone(),
        ))
    }
}

/// Run a tool call, dropping it (and its outbound request) once `ct` fires.
async fn call_until_cancelled(
    dispatcher: &Dispatcher,
    name: &str,
    arguments: Option<&JsonObject>,
    ct: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    tokio::select! {
        result = dispatcher.call_tool(name, arguments) => result,
        () = ct.cancelled() => {
            info!(tool = %name, "tool call cancelled by client");
            Err(McpError::internal_error(
                format!("tool call '{name}' was cancelled"),
                None,
            ))
        }
    }
}

impl ServerHandler for WaldurMcpServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(tools::list_tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let name = request.name.to_string();
            debug!(tool = %name, "tool call received");
            call_until_cancelled(
                &self.dispatcher,
                &name,
                request.arguments.as_ref(),
                &context.ct,
            )
            .await
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move { Ok(resources::list_resources(self.dispatcher.client()).await) }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(resources::list_resource_templates()))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move { resources::read_resource(self.dispatcher.client(), &request.uri).await }
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(prompts::list_prompts()))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        async move {
            prompts::get_prompt(
                self.dispatcher.client(),
                self.schema_text.as_deref(),
                &request.name,
                request.arguments.as_ref(),
            )
            .await
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Waldur MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}
