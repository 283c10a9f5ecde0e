//! m365-mcp entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use m365_core::AppConfig;
use m365_server::{AppState, M365Server};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    if let Err(e) = config.require_credentials() {
        tracing::error!(error = %e, "app-only credentials are required");
        return Err(e).context("cannot start without CLIENT_ID, CLIENT_SECRET and TENANT_ID");
    }

    tracing::info!(region = %config.region(), "Starting m365-mcp on stdio transport");

    let state = AppState::from_config(config).await?;
    let server = serve_server(M365Server::new(state), stdio()).await?;
    server.waiting().await?;

    Ok(())
}
