//! Emoji Proxy - caching proxy for remote custom emoji
//!
//! Resolves emoji keys through a lookup service, keeps downloaded images in
//! a local SQLite cache and renders placeholders into HTML fragments.

mod config;
mod error;
mod server;
mod types;

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::server::{start_server, ServerState, SharedState};
use emoji_resolver::{AssetResolver, HttpEmojiSource, ResolverConfig};
use emoji_store::StoreHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("emoji_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Emoji Proxy...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Database: {}", config.database_url);
    info!("Lookup service: {}", config.lookup_url);
    info!("Cache TTL: {} days", config.cache_ttl_days);

    if let Some(dir) = config.database_dir() {
        tokio::fs::create_dir_all(&dir).await?;
    }

    let store = Arc::new(StoreHandle::new(config.database_url.clone()));
    let source = HttpEmojiSource::new(&config.lookup_url)?;
    let resolver = AssetResolver::new(
        store,
        Arc::new(source),
        ResolverConfig {
            ttl_days: config.cache_ttl_days,
            coalesce_inflight: config.coalesce_inflight,
            ..ResolverConfig::default()
        },
    );

    if config.sweep_on_start {
        match resolver.sweeper().sweep().await {
            Ok(report) => info!(
                scanned = report.scanned,
                deleted = report.deleted,
                "Startup sweep complete"
            ),
            Err(e) => warn!(error = %e, "Startup sweep failed"),
        }
    }

    let state: SharedState = Arc::new(ServerState::new(
        Arc::new(resolver),
        config.object_url_capacity,
        Duration::from_secs(config.object_url_idle_secs),
    ));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
