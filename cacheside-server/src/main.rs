use anyhow::Result;
use cacheside_server::core::{CacheAside, MemoryCache, MemoryStore, NoteService};
use cacheside_server::{AppState, ServerConfig, create_router};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cacheside-server")]
#[command(about = "Notes API with cache-aside acceleration", long_about = None)]
struct Args {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    info!("Starting Cacheside Server v{}", env!("CARGO_PKG_VERSION"));

    // Primary store and cache, opened here and owned for the process lifetime
    let store = MemoryStore::new();
    let cache = MemoryCache::new(config.to_cache_config());

    // Start TTL cleanup task
    cache.start_ttl_cleanup();

    let accessor = CacheAside::new(cache, config.cache.default_ttl_secs);
    let service = Arc::new(NoteService::new(store, accessor));

    // Create router
    let app = create_router(AppState { service });

    // Bind server
    let addr = config.server_addr();
    info!("Listening on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
