//! Tile cache maintenance handlers.

use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::state::AppState;

/// POST /api/cache/clear - Remove every cached tile
#[instrument(skip(state))]
pub async fn cache_clear_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let removed = state.cache.clear().await;
    info!(removed = removed, "Cleared tile cache");

    Json(serde_json::json!({ "status": "ok", "removed": removed }))
}

/// GET /api/cache/stats - Hit/miss counters and cache settings
#[instrument(skip(state))]
pub async fn cache_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let snapshot = state.metrics.snapshot();

    Json(serde_json::json!({
        "dir": state.cache.base_dir().display().to_string(),
        "ttlSeconds": state.cache.ttl_secs(),
        "counters": snapshot,
        "hitRate": snapshot.hit_rate(),
    }))
}
