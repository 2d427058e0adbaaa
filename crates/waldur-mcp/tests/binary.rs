use anyhow::Context as _;
use serde_json::json;
use std::process::{Command, Stdio};
use std::time::Duration;
use waldur_test_support::{KillOnDrop, pick_unused_port, wait_http_listening};

const BIN: &str = env!("CARGO_BIN_EXE_waldur-mcp");

fn base_command() -> Command {
    let mut cmd = Command::new(BIN);
    for var in [
        "WALDUR_API_URL",
        "WALDUR_TOKEN",
        "WALDUR_AUTH_SCHEME",
        "WALDUR_TIMEOUT_SECS",
        "WALDUR_MATCH_POLICY",
        "WALDUR_SCHEMA_FILE",
        "WALDUR_MCP_CONFIG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.stdin(Stdio::null());
    cmd
}

#[test]
fn missing_token_exits_before_serving() -> anyhow::Result<()> {
    let out = base_command()
        .env("WALDUR_API_URL", "https://waldur.example.org/api/")
        .output()
        .context("run waldur-mcp")?;

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("WALDUR_TOKEN"), "{stderr}");
    assert!(out.stdout.is_empty(), "nothing may be written to stdout");
    Ok(())
}

#[test]
fn invalid_url_exits_before_serving() -> anyhow::Result<()> {
    let out = base_command()
        .env("WALDUR_API_URL", "not a url")
        .env("WALDUR_TOKEN", "t")
        .output()
        .context("run waldur-mcp")?;

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid API URL"), "{stderr}");
    Ok(())
}

#[test]
fn unreadable_config_file_exits_before_serving() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = base_command()
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .output()
        .context("run waldur-mcp")?;

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing.yaml"), "{stderr}");
    Ok(())
}

#[tokio::test]
async fn streamable_http_accepts_initialize() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cfg_path = dir.path().join("waldur.yaml");
    std::fs::write(
        &cfg_path,
        "apiUrl: http://127.0.0.1:9/api/\ntoken: from-file\ntimeoutSecs: 5\n",
    )?;

    let port = pick_unused_port()?;
    let child = base_command()
        .arg("--config")
        .arg(&cfg_path)
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn waldur-mcp")?;
    let _guard = KillOnDrop(child);

    let url = format!("http://127.0.0.1:{port}/mcp");
    wait_http_listening(&url, Duration::from_secs(20)).await?;

    let resp = reqwest::Client::new()
        .post(&url)
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "waldur-mcp-tests", "version": "0" }
            }
        }))
        .send()
        .await?;

    assert!(resp.status().is_success(), "initialize returned {}", resp.status());
    assert!(resp.headers().contains_key("mcp-session-id"));
    Ok(())
}
