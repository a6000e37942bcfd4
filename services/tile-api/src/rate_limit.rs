//! Per-client sliding-window rate limiting for catalog requests.

use axum::http::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tile_common::{TileError, TileResult};

/// Client buckets are pruned once the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// `limit` requests per rolling minute.
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Record a request from `client`, or reject it if the window is full.
    pub fn check(&self, client: &str) -> TileResult<()> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> TileResult<()> {
        let mut hits = self
            .hits
            .lock()
            .map_err(|_| TileError::InternalError("rate limiter lock poisoned".to_string()))?;

        if hits.len() > PRUNE_THRESHOLD {
            let window = self.window;
            hits.retain(|_, bucket| {
                bucket
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) <= window)
            });
        }

        let bucket = hits.entry(client.to_string()).or_default();
        while bucket
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) > self.window)
        {
            bucket.pop_front();
        }

        if bucket.len() >= self.limit {
            return Err(TileError::RateLimited);
        }
        bucket.push_back(now);
        Ok(())
    }
}

/// Identify the caller by peer IP.
///
/// The first `X-Forwarded-For` hop is used only when `trust_forwarded_for`
/// is set, i.e. when the service sits behind a proxy that overwrites it.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    let forwarded = trust_forwarded_for
        .then(|| forwarded_for(headers))
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
