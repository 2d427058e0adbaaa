mod common;

use common::{MockUpstream, args, client_for, dispatcher_for, result_json, waldur_fixture};
use rmcp::ServiceExt as _;
use rmcp::model::{CallToolRequestParams, ClientRequest, ErrorCode, Request, ResourceContents};
use rmcp::service::PeerRequestOptions;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use waldur_mcp::{MatchPolicy, WaldurMcpServer, prompts, resources};

#[tokio::test]
async fn rmcp_client_lists_and_calls_tools() -> anyhow::Result<()> {
    let upstream = MockUpstream::start(waldur_fixture).await?;
    let server = WaldurMcpServer::new(dispatcher_for(&upstream, MatchPolicy::First), None);

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });

    let client = ().serve(client_io).await?;

    let info = client.peer_info().expect("server info after handshake");
    assert_eq!(info.server_info.name, "waldur-mcp");

    let tools = client.list_all_tools().await?;
    let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(
        names,
        [
            "create_invitation",
            "list_customers",
            "list_invoices",
            "list_offerings",
            "list_projects",
            "list_resources",
            "query"
        ]
    );

    let result = client
        .call_tool(CallToolRequestParams {
            name: "list_customers".into(),
            arguments: Some(args(json!({"name": "Acme"}))),
            task: None,
            meta: None,
        })
        .await?;
    assert_eq!(result.is_error, Some(false));
    let body = result_json(&result);
    assert_eq!(body[0]["uuid"], "c1");
    assert_eq!(body[0]["organization_group"], "Universities");

    let err = client
        .call_tool(CallToolRequestParams {
            name: "delete_customers".into(),
            arguments: None,
            task: None,
            meta: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("delete_customers"), "{err}");

    let listed = client.list_all_resources().await?;
    let uris: Vec<&str> = listed.iter().map(|r| r.raw.uri.as_str()).collect();
    assert_eq!(
        uris,
        [
            "schema://main",
            "schema://table/structure_customer",
            "schema://table/structure_project"
        ]
    );

    let prompts = client.list_all_prompts().await?;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].name, "schema_aware_query");

    client.cancel().await?;
    let _ = server_task.await;
    Ok(())
}

#[tokio::test]
async fn cancelled_call_does_not_wait_for_a_slow_upstream() -> anyhow::Result<()> {
    let upstream = MockUpstream::start(|req| match req.path.as_str() {
        "/api/customers/" => {
            common::MockResponse::ok(json!([])).with_delay(Duration::from_secs(10))
        }
        _ => waldur_fixture(req),
    })
    .await?;
    let server = WaldurMcpServer::new(dispatcher_for(&upstream, MatchPolicy::First), None);

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(async move {
        let running = server.serve(server_io).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });
    let client = ().serve(client_io).await?;

    let started = Instant::now();
    let handle = client
        .send_cancellable_request(
            ClientRequest::CallToolRequest(Request::new(CallToolRequestParams {
                name: "list_customers".into(),
                arguments: None,
                task: None,
                meta: None,
            })),
            PeerRequestOptions::no_options(),
        )
        .await?;

    tokio::time::timeout(Duration::from_secs(5), async {
        while upstream.requests_to("/api/customers/").is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    handle.cancel(Some("no longer needed".to_string())).await?;

    let result = client
        .call_tool(CallToolRequestParams {
            name: "list_projects".into(),
            arguments: None,
            task: None,
            meta: None,
        })
        .await?;
    assert_eq!(result.is_error, Some(false));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "session blocked for {:?}",
        started.elapsed()
    );

    client.cancel().await?;
    let _ = server_task.await;
    Ok(())
}

fn resource_text(result: &rmcp::model::ReadResourceResult) -> Value {
    let ResourceContents::TextResourceContents { text, .. } = &result.contents[0] else {
        panic!("expected text contents");
    };
    serde_json::from_str(text).expect("json resource")
}

#[tokio::test]
async fn schema_resources_read_through_the_query_endpoint() {
    let upstream = MockUpstream::start(waldur_fixture)
        .await
        .expect("mock upstream");
    let client = client_for(&upstream);

    let main = resources::read_resource(&client, "schema://main")
        .await
        .expect("schema://main");
    assert_eq!(
        resource_text(&main),
        json!(["structure_customer", "structure_project"])
    );

    let table = resources::read_resource(&client, "schema://table/structure_project")
        .await
        .expect("table resource");
    assert_eq!(
        resource_text(&table),
        json!([
            {"column_name": "uuid", "data_type": "uuid", "is_nullable": "NO"},
            {"column_name": "name", "data_type": "character varying", "is_nullable": "NO"}
        ])
    );

    let sent: Vec<Value> = upstream
        .requests_to("/api/query/")
        .iter()
        .map(|r| r.body_field("query"))
        .collect();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0],
        json!("SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'")
    );
}

#[tokio::test]
async fn unsafe_table_name_is_rejected_without_a_query() {
    let upstream = MockUpstream::start(waldur_fixture)
        .await
        .expect("mock upstream");
    let client = client_for(&upstream);

    let err = resources::read_resource(&client, "schema://table/x';DROP TABLE y;--")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn non_array_table_list_reads_as_empty() {
    let upstream = MockUpstream::start(|_| common::MockResponse::ok(json!({"detail": "n/a"})))
        .await
        .expect("mock upstream");
    let client = client_for(&upstream);

    let main = resources::read_resource(&client, "schema://main")
        .await
        .expect("schema://main");
    assert_eq!(resource_text(&main), json!([]));
}

#[tokio::test]
async fn prompt_uses_configured_schema_text_or_live_tables() {
    let upstream = MockUpstream::start(waldur_fixture)
        .await
        .expect("mock upstream");
    let client = client_for(&upstream);

    let question = args(json!({"question": "How many projects per customer?"}));
    let with_file = prompts::get_prompt(
        &client,
        Some("structure_project(uuid, name, customer_id)"),
        "schema_aware_query",
        Some(&question),
    )
    .await
    .expect("prompt");
    let text = prompt_text(&with_file);
    assert!(text.contains("structure_project(uuid, name, customer_id)"), "{text}");
    assert!(text.ends_with("How many projects per customer?"), "{text}");
    assert!(upstream.requests().is_empty());

    let live = prompts::get_prompt(&client, None, "schema_aware_query", None)
        .await
        .expect("prompt");
    let text = prompt_text(&live);
    assert!(text.contains("structure_customer\nstructure_project"), "{text}");

    let err = prompts::get_prompt(&client, None, "nope", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}

fn prompt_text(result: &rmcp::model::GetPromptResult) -> String {
    match &result.messages[0].content {
        rmcp::model::PromptMessageContent::Text { text } => text.clone(),
        _ => panic!("expected text prompt"),
    }
}
