//! restbind HTTP Server
//!
//! Serves an in-memory notes resource over REST.

use anyhow::Result;
use restbind_server::api;
use restbind_server::config::ServerConfig;
use restbind_server::notes::NoteStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    // Create router
    let app = api::create_router(&config, NoteStore::new())?;

    // Start server
    let addr = config.addr();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Notes: http://{}{}", addr, config.resource_path);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let level = &config.log_level;
    let json = config.json_logs();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("restbind_server={level},restbind={level},tower_http=debug").into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
