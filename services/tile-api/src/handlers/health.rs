//! Root, health, readiness and metrics handlers.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// GET / - Service identity
pub async fn root_handler(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "app": state.config.app_name,
        "environment": state.config.environment,
    }))
}

/// GET /api/health - Liveness check
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /ready - Readiness check (verifies the layer catalog answers)
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.catalog.list().await {
        Ok(layers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "layers": layers.len() })),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready" })),
            )
        }
    }
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(handle: Option<Extension<PrometheusHandle>>) -> Response {
    let body = handle
        .map(|Extension(handle)| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
