//! stdio and streamable-HTTP hosting for [`WaldurMcpServer`].

use crate::server::WaldurMcpServer;
use anyhow::Context as _;
use axum::Router;
use rmcp::ServiceExt as _;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve one session over stdin/stdout until the client disconnects.
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the session ends abnormally.
pub async fn serve_stdio(server: WaldurMcpServer) -> anyhow::Result<()> {
    info!("serving MCP over stdio");
    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .context("start stdio session")?;
    service.waiting().await.context("stdio session")?;
    Ok(())
}

/// Build the axum router exposing the MCP endpoint at `/mcp`.
#[must_use]
pub fn router(server: WaldurMcpServer, shutdown: &CancellationToken) -> Router {
    let service: StreamableHttpService<WaldurMcpServer, LocalSessionManager> =
        StreamableHttpService::new(
            move || Ok(server.clone()),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: shutdown.child_token(),
                ..Default::default()
            },
        );
    Router::new().nest_service("/mcp", service)
}

/// Serve streamable HTTP on `bind` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve_http(
    server: WaldurMcpServer,
    bind: SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(server, &shutdown);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    let local = listener.local_addr()?;
    info!(addr = %local, "serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("http server")?;
    Ok(())
}
