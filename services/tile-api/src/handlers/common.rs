//! Error rendering shared by all handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use tile_common::TileError;

/// JSON error body: `{"status", "code", "message", "details"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Handler-facing wrapper so `TileError` can be returned from axum handlers.
#[derive(Debug)]
pub struct ApiError(pub TileError);

impl From<TileError> for ApiError {
    fn from(err: TileError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() && !err.is_upstream() {
            error!(error = %err, "Request failed");
        }

        let details = match &err {
            TileError::UpstreamRejected { status, url } => {
                Some(serde_json::json!({ "upstreamStatus": status, "url": url }))
            }
            TileError::UpstreamTimeout { url, .. } | TileError::UpstreamUnreachable { url, .. } => {
                Some(serde_json::json!({ "url": url }))
            }
            TileError::InvalidParameter { param, .. } => {
                Some(serde_json::json!({ "param": param }))
            }
            _ => None,
        };

        // Internal failure text stays in the logs.
        let message = match &err {
            TileError::CacheError(_) | TileError::DatabaseError(_) | TileError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            status: err.status_label(),
            code: err.error_code(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
