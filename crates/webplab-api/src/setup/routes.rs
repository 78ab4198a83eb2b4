//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use webplab_core::ServerConfig;
use webplab_infra::request_id_middleware;

use crate::handlers;
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Setup all application routes
pub fn setup_routes(config: &ServerConfig, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        http_body_limit_bytes = config.http_body_limit_bytes,
        "HTTP limits enabled"
    );

    let app = api_routes()
        .route(OPENAPI_PATH, get(|| async { Json(crate::api_doc::get_openapi_spec()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_PATH).path("/docs"))
        // Multipart bodies are bounded by RequestBodyLimitLayer alone
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(config.http_body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/presets", get(handlers::presets::list_presets))
        .route("/api/transform", post(handlers::transform::transform_images))
}

/// Setup CORS configuration
fn setup_cors(config: &ServerConfig) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.allows_any_origin() {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    // Browsers only expose non-safelisted response headers that are listed here
    Ok(cors.expose_headers([
        axum::http::header::CONTENT_DISPOSITION,
        axum::http::HeaderName::from_static("x-processed-files"),
        axum::http::HeaderName::from_static("x-failed-files"),
        axum::http::HeaderName::from_static("x-total-input-bytes"),
        axum::http::HeaderName::from_static("x-total-output-bytes"),
    ]))
}
