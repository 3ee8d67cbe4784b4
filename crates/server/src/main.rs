//! tiercache MCP server entry point.
//!
//! This is the main binary that opens the cache and boots the MCP server on
//! stdio transport. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tiercache_core::{CacheConfig, CacheFacade};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = CacheConfig::load()?;
    tracing::info!("Opening cache at {}", config.db_path.display());

    let cache = CacheFacade::open(&config).await;
    if cache.is_degraded() {
        tracing::warn!("Persistent cache unavailable; serving from memory only");
    }

    tracing::info!("Starting tiercache server on stdio transport");

    let handler = handler::TierCacheServer::new(Arc::new(cache));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
