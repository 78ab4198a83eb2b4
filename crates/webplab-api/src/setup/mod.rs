//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use axum::Router;
use webplab_core::ServerConfig;

use crate::state::AppState;

/// Build the shared state and the router
pub fn initialize_app(config: ServerConfig) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    tracing::info!(
        environment = %config.environment,
        host = %config.host,
        port = config.port,
        "Initializing WebP Lab API"
    );

    let state = Arc::new(AppState::new(config.clone()));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
