//! Router creation and configuration
//!
//! Mounts the notes resource through the binder and adds a health check.

use crate::config::ServerConfig;
use crate::notes::NoteStore;
use axum::{routing::get, Json, Router};
use restbind::Binder;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
#[axum::debug_handler]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Bind the notes resource to the paths named in `config`.
pub fn bind_notes(config: &ServerConfig, store: &NoteStore) -> restbind::Result<Binder> {
    let mut binder = Binder::new().with_body_limit(config.body_limit_bytes);

    let factory_store = store.clone();
    let locator_store = store.clone();
    binder
        .register_create(&config.resource_path, move || factory_store.build())?
        .register_resource(&config.item_path(), move |id: String| {
            let store = locator_store.clone();
            async move { Ok::<_, anyhow::Error>(store.find(&id).await) }
        })?;

    for (method, path) in binder.routes() {
        info!("  {} {}", method, path);
    }
    Ok(binder)
}

/// Create REST API router
pub fn create_router(config: &ServerConfig, store: NoteStore) -> restbind::Result<Router> {
    let binder = bind_notes(config, &store)?;

    Ok(Router::new()
        .route("/health", get(health))
        .merge(binder.into_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()))
}
