use std::error::Error;
use std::sync::Arc;

use clap::Parser;
mod cli;

use chproxy_common::GlobalConfig;
use chproxy_router::{ProxyState, proxy_router};
use chproxy_upstream::{ChutesClient, UpstreamClientConfig};
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("chproxy failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = GlobalConfig {
        host: cli.host,
        port: cli.port,
        auth_token: cli.auth_token.filter(|token| !token.trim().is_empty()),
    };
    info!(
        host = %config.host,
        port = config.port,
        auth_enabled = config.auth_token.is_some(),
        "config loaded"
    );

    let client = ChutesClient::new(UpstreamClientConfig::default())?;
    let bind = format!("{}:{}", config.host, config.port);
    let app = proxy_router(ProxyState {
        client,
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("chproxy=info,chproxy_upstream=info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
