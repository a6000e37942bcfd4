//! Tile proxy metrics, exported through the Prometheus recorder.

use metrics::counter;
use std::sync::atomic::{AtomicU64, Ordering};

use tile_common::TileError;

/// Running counts kept alongside the Prometheus counters.
///
/// The `metrics` macros are no-ops until a recorder is installed, so these
/// atomics are what the cache-stats endpoint and tests read.
#[derive(Debug, Default)]
pub struct TileMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_requests: AtomicU64,
    upstream_errors: AtomicU64,
}

impl TileMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("tile_cache_hits_total").increment(1);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        counter!("tile_cache_misses_total").increment(1);
    }

    pub fn record_upstream_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
        counter!("tile_upstream_requests_total").increment(1);
    }

    pub fn record_upstream_error(&self, error: &TileError) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
        counter!("tile_upstream_errors_total", "kind" => error.error_code()).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_requests: self.upstream_requests.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_requests: u64,
    pub upstream_errors: u64,
}

impl MetricsSnapshot {
    /// Percentage of lookups served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_without_recorder() {
        let metrics = TileMetrics::new();
        metrics.record_cache_miss();
        metrics.record_upstream_request();
        metrics.record_cache_hit();
        metrics.record_upstream_error(&TileError::UpstreamRejected {
            status: 503,
            url: "https://x".into(),
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.upstream_requests, 1);
        assert_eq!(snap.upstream_errors, 1);
        assert_eq!(snap.hit_rate(), 50.0);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(MetricsSnapshot::default().hit_rate(), 0.0);
    }
}
