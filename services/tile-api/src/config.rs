//! Service configuration from command-line flags and environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Smallest accepted upstream timeout, in seconds.
pub const MIN_HTTP_TIMEOUT_SECS: f64 = 0.1;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

#[derive(Parser, Debug, Clone)]
#[command(name = "tile-api")]
#[command(about = "NASA GIBS / Trek tile proxy and layer catalog")]
pub struct ServiceConfig {
    /// Listen address
    #[arg(short, long, env = "APP_LISTEN", default_value = "0.0.0.0:8001")]
    pub listen: SocketAddr,

    /// Log level
    #[arg(long, env = "APP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Application name reported at the root endpoint
    #[arg(long, env = "APP_NAME", default_value = "nasa-service")]
    pub app_name: String,

    /// Deployment environment label
    #[arg(long, env = "APP_ENVIRONMENT", default_value = "local")]
    pub environment: String,

    /// NASA GIBS WMTS base URL
    #[arg(
        long,
        env = "APP_NASA_GIBS_BASE_URL",
        default_value = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best"
    )]
    pub gibs_base_url: String,

    /// NASA Solar System Treks tile base URL
    #[arg(
        long,
        env = "APP_NASA_TREKS_BASE_URL",
        default_value = "https://trek.nasa.gov/tiles"
    )]
    pub trek_base_url: String,

    /// Directory holding cached tiles
    #[arg(long, env = "APP_TILE_CACHE_DIR", default_value = ".cache/tiles")]
    pub tile_cache_dir: PathBuf,

    /// Lifetime of a cached tile, in seconds
    #[arg(long, env = "APP_TILE_CACHE_TTL_SECONDS", default_value_t = 3600)]
    pub tile_cache_ttl_secs: u64,

    /// Upstream request timeout, in seconds
    #[arg(long, env = "APP_HTTP_TIMEOUT_SECONDS", default_value_t = 10.0)]
    pub http_timeout_secs: f64,

    /// PostgreSQL URL for the persisted layer catalog (static catalog if unset)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Create the schema and seed layers at startup
    #[arg(long, env = "APP_RUN_MIGRATIONS_ON_STARTUP", default_value_t = false)]
    pub run_migrations: bool,

    /// Comma-separated CORS origins; `*` allows any
    #[arg(
        long,
        env = "APP_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// Catalog requests allowed per client per minute
    #[arg(long, env = "APP_RATE_LIMIT_PER_MINUTE", default_value_t = 120)]
    pub rate_limit_per_minute: usize,

    /// Key rate limits on the first `X-Forwarded-For` hop instead of the peer IP.
    /// Only enable behind a proxy that overwrites the header.
    #[arg(long, env = "APP_TRUST_FORWARDED_FOR", default_value_t = false)]
    pub trust_forwarded_for: bool,

    /// Seconds between expired-tile sweeps (0 disables the sweeper)
    #[arg(long, env = "APP_CACHE_SWEEP_INTERVAL_SECS", default_value_t = 0)]
    pub cache_sweep_interval_secs: u64,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    pub worker_threads: Option<usize>,
}

impl ServiceConfig {
    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), String> {
        if !self.http_timeout_secs.is_finite() || self.http_timeout_secs < MIN_HTTP_TIMEOUT_SECS {
            return Err(format!(
                "http timeout must be at least {} seconds, got {}",
                MIN_HTTP_TIMEOUT_SECS, self.http_timeout_secs
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err("rate limit must be at least 1 request per minute".to_string());
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http_timeout_secs)
    }

    /// True when any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }

    /// Defaults without reading argv or the environment.
    pub fn defaults() -> Self {
        Self::parse_from(["tile-api"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::try_parse_from(["tile-api"]).unwrap();

        assert_eq!(config.listen.port(), 8001);
        assert_eq!(config.tile_cache_ttl_secs, 3600);
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_limit_per_minute, 120);
        assert_eq!(config.cache_sweep_interval_secs, 0);
        assert!(!config.trust_forwarded_for);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_floor() {
        let config =
            ServiceConfig::try_parse_from(["tile-api", "--http-timeout-secs", "0.05"]).unwrap();
        assert!(config.validate().is_err());

        let config =
            ServiceConfig::try_parse_from(["tile-api", "--http-timeout-secs", "0.1"]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_allowed_origins_wildcard() {
        let config =
            ServiceConfig::try_parse_from(["tile-api", "--allowed-origins", "https://a.test,*"])
                .unwrap();
        assert_eq!(config.allowed_origins, vec!["https://a.test", "*"]);
        assert!(config.allows_any_origin());
    }
}
