use clap::Parser as _;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use waldur_mcp::config::{Cli, LogFormat};
use waldur_mcp::{ServerConfig, WaldurMcpServer, transport};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let config = match ServerConfig::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("waldur-mcp: {e}");
            return ExitCode::from(2);
        }
    };
    let server = match WaldurMcpServer::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to build API client");
            eprintln!("waldur-mcp: {e}");
            return ExitCode::from(2);
        }
    };

    info!(
        api_url = %waldur_client::client::display_url(&config.client.base_url),
        match_policy = ?config.match_policy,
        timeout = ?config.client.timeout,
        "starting waldur-mcp"
    );

    let result = match config.bind {
        Some(bind) => {
            let shutdown = CancellationToken::new();
            tokio::spawn({
                let shutdown = shutdown.clone();
                async move {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("shutdown requested");
                    shutdown.cancel();
                }
            });
            transport::serve_http(server, bind, shutdown).await
        }
        None => transport::serve_stdio(server).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "server exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
