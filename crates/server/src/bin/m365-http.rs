//! m365-http entry point: serves the HTTP API on `bind_addr`.

use anyhow::{Context, Result};
use m365_core::AppConfig;
use m365_server::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let bind_addr = config.bind_addr.clone();

    let state = AppState::from_config(config).await?;
    let app = m365_server::http::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "Starting m365-http");

    axum::serve(listener, app).await?;
    Ok(())
}
