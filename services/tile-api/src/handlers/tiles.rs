//! Tile proxy handler.

use axum::{
    body::Body,
    extract::{Extension, Path, Query},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use tile_common::{parse_date, TileError};

use super::common::ApiResult;
use crate::broadcast::{TilePayload, DEFAULT_CONTENT_TYPE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TileQuery {
    /// Calendar date, `YYYY-MM-DD`
    pub date: Option<String>,
}

/// GET /v1/layers/:layer_key/tiles/:z/:x/:y
#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((layer_key, z, x, y)): Path<(String, String, String, String)>,
    Query(query): Query<TileQuery>,
) -> ApiResult<Response> {
    let z = parse_coord("z", &z)?;
    let x = parse_coord("x", &x)?;
    let y = parse_coord("y", &y)?;

    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(parse_date(raw).map_err(|e| TileError::InvalidParameter {
            param: "date".to_string(),
            message: e.to_string(),
        })?),
        None => None,
    };

    let tile = state.tiles.fetch_tile(&layer_key, z, x, y, date).await?;
    Ok(tile_response(tile))
}

fn parse_coord(param: &str, raw: &str) -> Result<u32, TileError> {
    raw.parse::<u32>().map_err(|_| TileError::InvalidParameter {
        param: param.to_string(),
        message: format!("expected a non-negative integer, got '{}'", raw),
    })
}

fn tile_response(tile: TilePayload) -> Response {
    let content_type = HeaderValue::from_str(tile.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let TilePayload {
        body,
        headers: stored,
        from_cache,
    } = tile;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);

    // Forwarded only when the upstream sent them (or defaults were applied).
    let passthrough = [
        ("Cache-Control", header::CACHE_CONTROL),
        ("ETag", header::ETAG),
        ("Last-Modified", header::LAST_MODIFIED),
    ];
    for (key, name) in passthrough {
        if let Some(value) = stored.get(key).and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(name, value);
        }
    }
    headers.insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static(if from_cache { "HIT" } else { "MISS" }),
    );

    response
}
