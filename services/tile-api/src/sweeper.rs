//! Background removal of expired tiles.
//!
//! Reads already treat expired entries as misses; the sweeper only reclaims
//! disk for entries nobody asks for again.

use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use storage::FileCache;

/// Statistics from a sweep.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct SweepStats {
    /// Entries removed (expired, corrupt or orphaned)
    pub removed: usize,
    pub elapsed_ms: u128,
}

/// Periodic cache sweeper.
pub struct CacheSweeper {
    cache: Arc<FileCache>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: Arc<FileCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Sweeper for `interval_secs`, or `None` when the interval is zero.
    pub fn from_interval_secs(cache: Arc<FileCache>, interval_secs: u64) -> Option<Self> {
        (interval_secs > 0).then(|| Self::new(cache, Duration::from_secs(interval_secs)))
    }

    /// Run one sweep.
    pub async fn run_once(&self) -> SweepStats {
        let started = Instant::now();
        let removed = self.cache.purge_expired().await;
        let stats = SweepStats {
            removed,
            elapsed_ms: started.elapsed().as_millis(),
        };

        if removed > 0 {
            info!(removed = stats.removed, elapsed_ms = stats.elapsed_ms as u64, "Cache sweep complete");
        } else {
            debug!("Cache sweep found nothing to remove");
        }
        stats
    }

    /// Sweep on a fixed interval until the task is dropped.
    pub async fn run_forever(self) {
        info!(interval_secs = self.interval.as_secs(), "Starting cache sweeper");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }
}
