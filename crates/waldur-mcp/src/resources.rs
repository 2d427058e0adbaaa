//! Read-only database schema resources, fetched through the query endpoint.

use crate::error::ToolError;
use rmcp::model::{
    AnnotateAble, ErrorData, ListResourceTemplatesResult, ListResourcesResult, RawResource,
    RawResourceTemplate, ReadResourceResult, Resource, ResourceContents,
};
use serde_json::{Value, json};
use tracing::warn;
use waldur_client::WaldurClient;

pub const SCHEMA_MAIN_URI: &str = "schema://main";
pub const TABLE_URI_PREFIX: &str = "schema://table/";
const TABLE_URI_TEMPLATE: &str = "schema://table/{table}";
const JSON_MIME: &str = "application/json";

const TABLES_SQL: &str =
    "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'";

/// A parsed resource address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaUri {
    Main,
    Table(String),
}

impl SchemaUri {
    /// # Errors
    ///
    /// `resource_not_found` for unknown URIs, `invalid_params` for table names that are not
    /// plain identifiers.
    pub fn parse(uri: &str) -> Result<Self, ErrorData> {
        if uri == SCHEMA_MAIN_URI {
            return Ok(Self::Main);
        }
        let Some(table) = uri.strip_prefix(TABLE_URI_PREFIX) else {
            return Err(ErrorData::resource_not_found(
                format!("unknown resource: {uri}"),
                Some(json!({ "uri": uri })),
            ));
        };
        if !is_identifier(table) {
            return Err(ErrorData::invalid_params(
                format!("invalid table name '{table}': expected letters, digits or underscores"),
                Some(json!({ "uri": uri })),
            ));
        }
        Ok(Self::Table(table.to_string()))
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn columns_sql(table: &str) -> String {
    format!(
        "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = '{table}' ORDER BY ordinal_position"
    )
}

/// Names of the tables in the `public` schema. A non-array answer means no tables.
///
/// # Errors
///
/// Any client failure.
pub async fn table_names(client: &WaldurClient) -> Result<Vec<String>, ToolError> {
    let rows = client.query(TABLES_SQL).await?;
    let Value::Array(rows) = rows else {
        return Ok(Vec::new());
    };
    Ok(rows
        .iter()
        .filter_map(|row| match row {
            Value::Array(cols) => cols.first().and_then(Value::as_str),
            Value::Object(obj) => obj.get("table_name").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(str::to_string)
        .collect())
}

async fn table_columns(client: &WaldurClient, table: &str) -> Result<Vec<Value>, ToolError> {
    let rows = client.query(&columns_sql(table)).await?;
    let Value::Array(rows) = rows else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Array(cols) => Some(json!({
                "column_name": cols.first().cloned().unwrap_or(Value::Null),
                "data_type": cols.get(1).cloned().unwrap_or(Value::Null),
                "is_nullable": cols.get(2).cloned().unwrap_or(Value::Null),
            })),
            obj @ Value::Object(_) => Some(obj),
            _ => None,
        })
        .collect())
}

/// `schema://main` plus one resource per table.
///
/// If the table list cannot be fetched, only `schema://main` is listed.
pub async fn list_resources(client: &WaldurClient) -> ListResourcesResult {
    let mut resources = vec![resource(
        SCHEMA_MAIN_URI,
        "schema.main",
        "Database tables",
        "Names of the tables in the public schema",
    )];

    match table_names(client).await {
        Ok(tables) => resources.extend(tables.iter().filter(|t| is_identifier(t)).map(|t| {
            resource(
                &format!("{TABLE_URI_PREFIX}{t}"),
                &format!("schema.table.{t}"),
                &format!("Table {t}"),
                &format!("Columns of the {t} table"),
            )
        })),
        Err(e) => warn!(error = %e, "failed to enumerate tables for resource listing"),
    }

    ListResourcesResult::with_all_items(resources)
}

#[must_use]
pub fn list_resource_templates() -> ListResourceTemplatesResult {
    ListResourceTemplatesResult::with_all_items(vec![
        RawResourceTemplate {
            uri_template: TABLE_URI_TEMPLATE.to_string(),
            name: "schema.table".to_string(),
            title: Some("Table columns".to_string()),
            description: Some(
                "Column names, data types and nullability of a table in the public schema."
                    .to_string(),
            ),
            mime_type: Some(JSON_MIME.to_string()),
            icons: None,
        }
        .no_annotation(),
    ])
}

/// # Errors
///
/// Errors from [`SchemaUri::parse`], or `internal_error` when the upstream query fails.
pub async fn read_resource(client: &WaldurClient, uri: &str) -> Result<ReadResourceResult, ErrorData> {
    let payload = match SchemaUri::parse(uri)? {
        SchemaUri::Main => json!(table_names(client).await.map_err(|e| upstream(uri, &e))?),
        SchemaUri::Table(table) => {
            json!(table_columns(client, &table).await.map_err(|e| upstream(uri, &e))?)
        }
    };
    let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "[]".to_string());
    Ok(ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(JSON_MIME.to_string()),
            text,
            meta: None,
        }],
    })
}

fn upstream(uri: &str, e: &ToolError) -> ErrorData {
    ErrorData::internal_error(e.to_string(), Some(json!({ "uri": uri })))
}

fn resource(uri: &str, name: &str, title: &str, description: &str) -> Resource {
    RawResource {
        uri: uri.to_string(),
        name: name.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        mime_type: Some(JSON_MIME.to_string()),
        size: None,
        icons: None,
        meta: None,
    }
    .no_annotation()
}
