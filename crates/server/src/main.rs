//! feedline server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use feedline_client::{EngineConfig, FeedClient, FeedEngine, UpstreamConfig};
use feedline_core::{AppConfig, FeedCache, cache::open_store};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    tracing::info!(
        feed_url = %config.feed_url,
        legacy_feed_url = %config.legacy_feed_url,
        fetch_size = config.fetch_size,
        "Starting feedline server on stdio transport"
    );

    let store = open_store(&config).await?;
    let _purge = tools::cache::spawn_purge_task(store.clone(), config.purge_interval());

    let client = FeedClient::new(UpstreamConfig::from(&config), Arc::new(config.filter_resolver()))?;
    let engine = FeedEngine::new(Arc::new(client), FeedCache::new(store), EngineConfig::from(&config));

    let handler = handler::FeedServer::new(Arc::new(engine), tools::PageLimits::from(&config));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
