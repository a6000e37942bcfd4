//! Tile broadcaster: cache lookup, upstream fetch and write-through.

use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderName, CACHE_CONTROL, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use storage::{FileCache, TileHeaders};
use tile_common::time::resolve_date;
use tile_common::{format_date, LayerDefinition, TileError, TileResult};

use crate::metrics::TileMetrics;
use crate::url_builder::{build_url, ProviderBases};

pub const DEFAULT_CONTENT_TYPE: &str = "image/png";
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=3600";

/// A tile ready to send to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePayload {
    pub body: Bytes,
    pub headers: TileHeaders,
    pub from_cache: bool,
}

impl TilePayload {
    pub fn content_type(&self) -> &str {
        self.headers
            .get("Content-Type")
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Cache key for a tile: `{layer_key}:{resolved_date}:{z}:{x}:{y}`.
pub fn cache_key(
    layer: &dyn LayerDefinition,
    z: u32,
    x: u32,
    y: u32,
    date_override: Option<NaiveDate>,
) -> String {
    let date = resolve_date(date_override, layer.default_date());
    format!("{}:{}:{}:{}:{}", layer.layer_key(), format_date(date), z, x, y)
}

/// Fetches tiles from NASA with a file-backed write-through cache.
pub struct TileBroadcaster {
    cache: Arc<FileCache>,
    client: Client,
    bases: ProviderBases,
    metrics: Arc<TileMetrics>,
}

impl TileBroadcaster {
    /// Create a broadcaster with its own pooled HTTP client.
    pub fn new(
        cache: Arc<FileCache>,
        bases: ProviderBases,
        timeout: Duration,
        metrics: Arc<TileMetrics>,
    ) -> TileResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TileError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(cache, client, bases, metrics))
    }

    pub fn with_client(
        cache: Arc<FileCache>,
        client: Client,
        bases: ProviderBases,
        metrics: Arc<TileMetrics>,
    ) -> Self {
        Self {
            cache,
            client,
            bases,
            metrics,
        }
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    /// Serve a tile from cache, or fetch it upstream and cache it.
    ///
    /// Upstream failures are classified and returned, never retried.
    #[instrument(skip(self, layer), fields(layer_key = %layer.layer_key()))]
    pub async fn get_tile(
        &self,
        layer: &dyn LayerDefinition,
        z: u32,
        x: u32,
        y: u32,
        date_override: Option<NaiveDate>,
    ) -> TileResult<TilePayload> {
        let key = cache_key(layer, z, x, y, date_override);

        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "Tile cache hit");
            self.metrics.record_cache_hit();
            return Ok(TilePayload {
                body: hit.body,
                headers: hit.headers,
                from_cache: true,
            });
        }
        self.metrics.record_cache_miss();

        let url = build_url(layer, z, x, y, date_override, &self.bases)?;
        let (body, headers) = match self.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(url = %url, error = %e, "Upstream tile fetch failed");
                self.metrics.record_upstream_error(&e);
                return Err(e);
            }
        };

        if let Err(e) = self.cache.set(&key, &body, &headers).await {
            warn!(key = %key, error = %e, "Failed to write tile to cache");
        }

        Ok(TilePayload {
            body,
            headers,
            from_cache: false,
        })
    }

    async fn fetch(&self, url: &str) -> TileResult<(Bytes, TileHeaders)> {
        self.metrics.record_upstream_request();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(TileError::UpstreamRejected {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let headers = tile_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        debug!(url = %url, bytes = body.len(), "Fetched tile from upstream");
        Ok((body, headers))
    }

    /// Release the connection pool. Call after the server stops accepting requests.
    pub fn shutdown(self) {
        drop(self.client);
    }
}

fn classify_transport_error(url: &str, e: reqwest::Error) -> TileError {
    if e.is_timeout() {
        TileError::UpstreamTimeout {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        TileError::UpstreamUnreachable {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Keep the headers worth caching, filling in defaults for the first two.
fn tile_headers(upstream: &HeaderMap) -> TileHeaders {
    let get = |name: HeaderName| {
        upstream
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut headers = TileHeaders::new();
    headers.insert(
        "Content-Type".to_string(),
        get(CONTENT_TYPE).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
    );
    headers.insert(
        "Cache-Control".to_string(),
        get(CACHE_CONTROL).unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
    );
    if let Some(etag) = get(ETAG) {
        headers.insert("ETag".to_string(), etag);
    }
    if let Some(modified) = get(LAST_MODIFIED) {
        headers.insert("Last-Modified".to_string(), modified);
    }
    headers
}
