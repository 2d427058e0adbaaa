//! The `schema_aware_query` prompt: the database layout followed by the user's question.

use crate::resources::table_names;
use rmcp::model::{
    ErrorData, GetPromptResult, ListPromptsResult, Prompt, PromptArgument, PromptMessage,
    PromptMessageRole,
};
use serde_json::{Map, Value, json};
use waldur_client::WaldurClient;

pub const SCHEMA_AWARE_QUERY: &str = "schema_aware_query";

#[must_use]
pub fn list_prompts() -> ListPromptsResult {
    ListPromptsResult::with_all_items(vec![Prompt::new(
        SCHEMA_AWARE_QUERY,
        Some("Compose a SQL query for an analytical question, given the database structure."),
        Some(vec![PromptArgument {
            name: "question".to_string(),
            title: Some("Question".to_string()),
            description: Some("Analytical question to answer with SQL".to_string()),
            required: Some(false),
        }]),
    )])
}

/// Render a prompt.
///
/// The database structure comes from `schema_text` when configured, otherwise from the live
/// table list.
///
/// # Errors
///
/// `invalid_params` for unknown prompt names; `internal_error` if the table list is needed and
/// cannot be fetched.
pub async fn get_prompt(
    client: &WaldurClient,
    schema_text: Option<&str>,
    name: &str,
    arguments: Option<&Map<String, Value>>,
) -> Result<GetPromptResult, ErrorData> {
    if name != SCHEMA_AWARE_QUERY {
        return Err(ErrorData::invalid_params(
            format!("unknown prompt: {name}"),
            Some(json!({ "name": name })),
        ));
    }

    let schema = match schema_text {
        Some(text) => text.to_string(),
        None => {
            let tables = table_names(client)
                .await
                .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
            tables.join("\n")
        }
    };

    let question = arguments
        .and_then(|args| args.get("question"))
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty());

    Ok(GetPromptResult {
        description: Some("SQL composition with database structure".to_string()),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            render(&schema, question),
        )],
    })
}

fn render(schema: &str, question: Option<&str>) -> String {
    let mut text = format!(
        "Given the following PostgreSQL database structure:\n {schema}\n compose SQL query for the following analytical query:\n"
    );
    if let Some(q) = question {
        text.push_str(q);
    }
    text
}
