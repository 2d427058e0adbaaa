#![allow(dead_code)]

use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Map, Value, json};
use std::time::Duration;
use waldur_client::{ClientConfig, WaldurClient};
use waldur_mcp::{Dispatcher, MatchPolicy};

pub use waldur_test_support::{MockResponse, MockUpstream, RecordedRequest, pick_unused_port};

pub const TOKEN: &str = "test-token";

pub fn client_for(upstream: &MockUpstream) -> WaldurClient {
    let cfg = ClientConfig::new(upstream.base_url(), TOKEN, "Token", Duration::from_secs(5))
        .expect("client config");
    WaldurClient::new(&cfg).expect("client")
}

pub fn dispatcher_for(upstream: &MockUpstream, policy: MatchPolicy) -> Dispatcher {
    Dispatcher::new(client_for(upstream), policy)
}

pub fn args(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("arguments must be an object")
}

/// Parse the first text content of a tool result as JSON.
pub fn result_json(result: &CallToolResult) -> Value {
    let Some(first) = result.content.first() else {
        panic!("tool result has no content");
    };
    let RawContent::Text(t) = &first.raw else {
        panic!("expected text content");
    };
    serde_json::from_str(&t.text).unwrap_or_else(|_| Value::String(t.text.clone()))
}

pub fn result_text(result: &CallToolResult) -> String {
    match result.content.first().map(|c| &c.raw) {
        Some(RawContent::Text(t)) => t.text.clone(),
        _ => String::new(),
    }
}

/// A small Waldur: two roles named "Administrator", one customer, two projects matching
/// "Alpha", and an invitation endpoint that rejects `bad@x.com`.
pub fn waldur_fixture(req: &RecordedRequest) -> MockResponse {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/roles/") => match req.query_value("description") {
            Some("Administrator") => MockResponse::ok(json!([
                {"uuid": "role-admin-1", "description": "Administrator"},
                {"uuid": "role-admin-2", "description": "Administrator"}
            ])),
            Some("Manager") => MockResponse::ok(json!([
                {"uuid": "role-manager", "description": "Manager"}
            ])),
            _ => MockResponse::ok(json!([])),
        },
        ("GET", "/api/customers/") => match req.query_value("name") {
            Some("Acme") => MockResponse::ok(json!([{
                "uuid": "c1",
                "url": "http://waldur.test/api/customers/c1/",
                "name": "Acme",
                "organization_group_name": "Universities",
                "archived": false
            }])),
            Some(_) => MockResponse::ok(json!([])),
            None => MockResponse::ok(json!([
                {"uuid": "c1", "name": "Acme", "url": "http://waldur.test/api/customers/c1/"},
                {"uuid": "c2", "name": "Globex", "abbreviation": "GBX"}
            ])),
        },
        ("GET", "/api/projects/") => match req.query_value("name") {
            Some("Alpha") => MockResponse::ok(json!([
                {"uuid": "p1", "name": "Alpha", "url": "http://waldur.test/api/projects/p1/"},
                {"uuid": "p2", "name": "Alpha 2", "url": "http://waldur.test/api/projects/p2/"}
            ])),
            Some("Beta") => MockResponse::ok(json!([
                {"uuid": "p3", "name": "Beta", "url": "http://waldur.test/api/projects/p3/"}
            ])),
            Some(_) => MockResponse::ok(json!([])),
            None => MockResponse::ok(json!([
                {"uuid": "p1", "name": "Alpha", "customer_name": "Acme", "extra": "dropped"}
            ])),
        },
        ("POST", "/api/user-invitations/") => {
            if req.body_field("email") == json!("bad@x.com") {
                MockResponse::status(400, json!({"email": ["Enter a valid email address."]}))
            } else {
                MockResponse::status(
                    201,
                    json!({
                        "uuid": format!("inv-{}", req.body_field("email").as_str().unwrap_or("")),
                        "email": req.body_field("email"),
                        "state": "pending"
                    }),
                )
            }
        }
        ("POST", "/api/query/") => {
            let sql = req.body_field("query");
            let sql = sql.as_str().unwrap_or_default();
            if sql.contains("information_schema.tables") {
                MockResponse::ok(json!([["structure_customer"], ["structure_project"]]))
            } else if sql.contains("information_schema.columns") {
                MockResponse::ok(json!([
                    ["uuid", "uuid", "NO"],
                    ["name", "character varying", "NO"]
                ]))
            } else {
                MockResponse::ok(json!([[42]]))
            }
        }
        _ => MockResponse::not_found(),
    }
}
