//! Tool registry: names, argument types and the schemas advertised to the host.

use crate::error::ToolError;
use crate::scope::ScopeType;
use reqwest::Method;
use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use waldur_client::semantics::{annotations_for_method, read_only_post_annotations};
use waldur_client::{EntityKind, endpoints};

/// Every tool this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Query,
    ListCustomers,
    ListProjects,
    ListResources,
    ListOfferings,
    ListInvoices,
    CreateInvitation,
}

impl ToolName {
    pub const ALL: [Self; 7] = [
        Self::Query,
        Self::ListCustomers,
        Self::ListProjects,
        Self::ListResources,
        Self::ListOfferings,
        Self::ListInvoices,
        Self::CreateInvitation,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::ListCustomers => "list_customers",
            Self::ListProjects => "list_projects",
            Self::ListResources => "list_resources",
            Self::ListOfferings => "list_offerings",
            Self::ListInvoices => "list_invoices",
            Self::CreateInvitation => "create_invitation",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Collection endpoint and projection for the list tools.
    #[must_use]
    pub fn listing(self) -> Option<(&'static str, EntityKind)> {
        match self {
            Self::ListCustomers => Some((endpoints::CUSTOMERS, EntityKind::Customer)),
            Self::ListProjects => Some((endpoints::PROJECTS, EntityKind::Project)),
            Self::ListResources => Some((endpoints::MARKETPLACE_RESOURCES, EntityKind::Resource)),
            Self::ListOfferings => Some((
                endpoints::MARKETPLACE_PUBLIC_OFFERINGS,
                EntityKind::Offering,
            )),
            Self::ListInvoices => Some((endpoints::INVOICES, EntityKind::Invoice)),
            Self::Query | Self::CreateInvitation => None,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Query => "Run SQL query",
            Self::ListCustomers => "List customers",
            Self::ListProjects => "List projects",
            Self::ListResources => "List marketplace resources",
            Self::ListOfferings => "List public offerings",
            Self::ListInvoices => "List invoices",
            Self::CreateInvitation => "Invite users",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Query => {
                "Run a SQL query against the Waldur reporting database and return the rows. \
                 The text is forwarded verbatim; read-only enforcement is left to the Waldur API."
            }
            Self::ListCustomers => {
                "List customers (organizations). Name filters are case-insensitive partial matches."
            }
            Self::ListProjects => "List projects with their owning customer.",
            Self::ListResources => "List provisioned marketplace resources.",
            Self::ListOfferings => "List public marketplace offerings.",
            Self::ListInvoices => "List invoices, optionally filtered by customer and period.",
            Self::CreateInvitation => {
                "Invite users by email to a customer or project with the given role. \
                 The role is looked up by description and the scope by name; when several \
                 entries match, the configured match policy applies."
            }
        }
    }

    fn method(self) -> Method {
        match self {
            Self::Query | Self::CreateInvitation => Method::POST,
            _ => Method::GET,
        }
    }

    fn params(self) -> Vec<ToolParam> {
        match self {
            Self::Query => vec![ToolParam::required("sql", string("SQL statement to run"))],
            Self::ListCustomers => vec![
                ToolParam::optional("name", string("Filter by name")),
                ToolParam::optional("abbreviation", string("Filter by abbreviation")),
                ToolParam::optional("archived", boolean("Filter by archived flag")),
                page(),
                page_size(),
            ],
            Self::ListProjects => vec![
                ToolParam::optional("name", string("Filter by project name")),
                ToolParam::optional("customer", string("Filter by customer UUID")),
                ToolParam::optional("customer_name", string("Filter by customer name")),
                page(),
                page_size(),
            ],
            Self::ListResources => vec![
                ToolParam::optional("name", string("Filter by resource name")),
                ToolParam::optional("project_name", string("Filter by project name")),
                ToolParam::optional("customer_uuid", string("Filter by customer UUID")),
                ToolParam::optional("state", string("Filter by lifecycle state")),
                page(),
                page_size(),
            ],
            Self::ListOfferings => vec![
                ToolParam::optional("name", string("Filter by offering name")),
                ToolParam::optional("category_title", string("Filter by category title")),
                ToolParam::optional("state", string("Filter by offering state")),
                page(),
                page_size(),
            ],
            Self::ListInvoices => vec![
                ToolParam::optional("customer_uuid", string("Filter by customer UUID")),
                ToolParam::optional("state", string("Filter by invoice state")),
                ToolParam::optional("year", integer("Invoice year", Some(1970), None)),
                ToolParam::optional("month", integer("Invoice month", Some(1), Some(12))),
                page(),
                page_size(),
            ],
            Self::CreateInvitation => vec![
                ToolParam::required(
                    "scope_type",
                    json!({
                        "type": "string",
                        "enum": ["customer", "project"],
                        "description": "Kind of scope to invite into"
                    }),
                ),
                ToolParam::required("scope_name", string("Name of the customer or project")),
                ToolParam::required("role", string("Role description, e.g. Administrator")),
                ToolParam::required(
                    "emails",
                    json!({
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "Email addresses to invite"
                    }),
                ),
                ToolParam {
                    name: "extra_invitation_text",
                    schema: string("Extra text included in the invitation email"),
                    required: false,
                    default: Some(json!("")),
                },
            ],
        }
    }

    /// The MCP tool descriptor advertised in `tools/list`.
    #[must_use]
    pub fn descriptor(self) -> Tool {
        let schema = build_input_schema(&self.params());
        let schema_obj = schema.as_object().cloned().unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.as_str(), self.description(), Arc::new(schema_obj));
        tool.annotations = Some(match self {
            Self::Query => read_only_post_annotations(self.title()),
            other => annotations_for_method(&other.method(), other.title()),
        });
        tool
    }
}

/// All tool descriptors, in registry order.
#[must_use]
pub fn list_tools() -> Vec<Tool> {
    ToolName::ALL.into_iter().map(ToolName::descriptor).collect()
}

struct ToolParam {
    name: &'static str,
    schema: Value,
    required: bool,
    default: Option<Value>,
}

impl ToolParam {
    fn required(name: &'static str, schema: Value) -> Self {
        Self {
            name,
            schema,
            required: true,
            default: None,
        }
    }

    fn optional(name: &'static str, schema: Value) -> Self {
        Self {
            name,
            schema,
            required: false,
            default: None,
        }
    }
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn integer(description: &str, minimum: Option<i64>, maximum: Option<i64>) -> Value {
    let mut schema = json!({ "type": "integer", "description": description });
    if let Some(min) = minimum {
        schema["minimum"] = json!(min);
    }
    if let Some(max) = maximum {
        schema["maximum"] = json!(max);
    }
    schema
}

fn page() -> ToolParam {
    ToolParam::optional("page", integer("Page number (1-based)", Some(1), None))
}

fn page_size() -> ToolParam {
    ToolParam::optional("page_size", integer("Items per page", Some(1), None))
}

fn build_input_schema(params: &[ToolParam]) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<&str> = Vec::new();

    for param in params {
        let mut prop_schema = param.schema.clone();
        if let Some(default) = &param.default {
            prop_schema["default"] = default.clone();
        }
        properties.insert(param.name.to_string(), prop_schema);

        if param.required && param.default.is_none() {
            required.push(param.name);
        }
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryArgs {
    pub sql: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCustomersArgs {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub archived: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListProjectsArgs {
    pub name: Option<String>,
    pub customer: Option<String>,
    pub customer_name: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListResourcesArgs {
    pub name: Option<String>,
    pub project_name: Option<String>,
    pub customer_uuid: Option<String>,
    pub state: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListOfferingsArgs {
    pub name: Option<String>,
    pub category_title: Option<String>,
    pub state: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListInvoicesArgs {
    pub customer_uuid: Option<String>,
    pub state: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvitationArgs {
    pub scope_type: ScopeType,
    pub scope_name: String,
    pub role: String,
    pub emails: Vec<String>,
    #[serde(default)]
    pub extra_invitation_text: String,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Query(QueryArgs),
    ListCustomers(ListCustomersArgs),
    ListProjects(ListProjectsArgs),
    ListResources(ListResourcesArgs),
    ListOfferings(ListOfferingsArgs),
    ListInvoices(ListInvoicesArgs),
    CreateInvitation(CreateInvitationArgs),
}

impl ToolCall {
    /// Validate a tool name and its argument bag.
    ///
    /// Every key must name an advertised parameter, and numbers must respect the advertised
    /// bounds. Null-valued keys are then dropped, so a null is treated as an omitted argument.
    ///
    /// # Errors
    ///
    /// [`ToolError::UnknownTool`] for names outside the registry and
    /// [`ToolError::InvalidArguments`] for unknown fields, wrong types or missing required
    /// arguments.
    pub fn parse(name: &str, arguments: Option<&JsonObject>) -> Result<Self, ToolError> {
        let tool = ToolName::from_name(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;
        check_against_schema(tool, arguments)?;
        let args = strip_nulls(arguments);

        Ok(match tool {
            ToolName::Query => Self::Query(decode(tool, args)?),
            ToolName::ListCustomers => Self::ListCustomers(decode(tool, args)?),
            ToolName::ListProjects => Self::ListProjects(decode(tool, args)?),
            ToolName::ListResources => Self::ListResources(decode(tool, args)?),
            ToolName::ListOfferings => Self::ListOfferings(decode(tool, args)?),
            ToolName::ListInvoices => Self::ListInvoices(decode(tool, args)?),
            ToolName::CreateInvitation => {
                let a: CreateInvitationArgs = decode(tool, args)?;
                if a.emails.is_empty() {
                    return Err(invalid(tool, "emails must contain at least one address"));
                }
                if let Some(blank) = a.emails.iter().position(|e| e.trim().is_empty()) {
                    return Err(invalid(tool, &format!("emails[{blank}] is empty")));
                }
                if a.scope_name.trim().is_empty() || a.role.trim().is_empty() {
                    return Err(invalid(tool, "scope_name and role must not be empty"));
                }
                Self::CreateInvitation(a)
            }
        })
    }
}

fn check_against_schema(tool: ToolName, arguments: Option<&JsonObject>) -> Result<(), ToolError> {
    let Some(arguments) = arguments else {
        return Ok(());
    };
    let params = tool.params();
    for (key, value) in arguments {
        let param = params
            .iter()
            .find(|p| p.name == key.as_str())
            .ok_or_else(|| invalid(tool, &format!("unknown field `{key}`")))?;
        let Some(n) = value.as_f64() else {
            continue;
        };
        let bound = |name: &str| param.schema.get(name).and_then(Value::as_f64);
        if let Some(min) = bound("minimum")
            && n < min
        {
            return Err(invalid(tool, &format!("{key} must be at least {min}")));
        }
        if let Some(max) = bound("maximum")
            && n > max
        {
            return Err(invalid(tool, &format!("{key} must be at most {max}")));
        }
    }
    Ok(())
}

fn strip_nulls(arguments: Option<&JsonObject>) -> Map<String, Value> {
    arguments
        .map(|args| {
            args.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn decode<T: DeserializeOwned>(tool: ToolName, args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| invalid(tool, &e.to_string()))
}

fn invalid(tool: ToolName, message: &str) -> ToolError {
    ToolError::InvalidArguments {
        tool: tool.as_str().to_string(),
        message: message.to_string(),
    }
}
