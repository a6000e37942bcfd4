//! NASA tile proxy service library.
//!
//! Proxies GIBS and Solar System Treks tiles through a file-backed cache and
//! serves the layer catalog the viewer builds its tile URLs from.

pub mod broadcast;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod rate_limit;
pub mod state;
pub mod sweeper;
pub mod tiles;
pub mod url_builder;

use axum::{
    extract::Extension,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use config::ServiceConfig;
use state::AppState;

/// Build the HTTP router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root_handler))
        // Tiles and catalog
        .route(
            "/v1/layers/:layer_key/tiles/:z/:x/:y",
            get(handlers::tile_handler),
        )
        .route("/v1/layers", get(handlers::layers_handler))
        // Health check
        .route("/api/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        // Cache maintenance
        .route("/api/cache/clear", post(handlers::cache_clear_handler))
        .route("/api/cache/stats", get(handlers::cache_stats_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
