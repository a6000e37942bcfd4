//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use storage::{FileCache, LayerCatalog, PgLayerCatalog, StaticCatalog};
use tile_common::default_layers;

use crate::broadcast::TileBroadcaster;
use crate::config::ServiceConfig;
use crate::metrics::TileMetrics;
use crate::rate_limit::RateLimiter;
use crate::tiles::TileService;
use crate::url_builder::ProviderBases;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub catalog: Arc<dyn LayerCatalog>,
    pub cache: Arc<FileCache>,
    pub tiles: TileService,
    pub rate_limiter: RateLimiter,
    pub metrics: Arc<TileMetrics>,
}

impl AppState {
    /// Build everything the configuration describes, connecting to the
    /// database when one is configured.
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        let catalog = connect_catalog(&config).await?;
        let cache = FileCache::new(&config.tile_cache_dir, config.tile_cache_ttl_secs)
            .context("Failed to open tile cache")?;

        info!(
            dir = %config.tile_cache_dir.display(),
            ttl_secs = config.tile_cache_ttl_secs,
            "Tile cache ready"
        );

        Self::with_catalog(config, catalog, Arc::new(cache))
    }

    /// Assemble state around an existing catalog and cache.
    pub fn with_catalog(
        config: ServiceConfig,
        catalog: Arc<dyn LayerCatalog>,
        cache: Arc<FileCache>,
    ) -> Result<Self> {
        let metrics = Arc::new(TileMetrics::new());
        let bases = ProviderBases::new(&config.gibs_base_url, &config.trek_base_url);
        let broadcaster = TileBroadcaster::new(
            cache.clone(),
            bases,
            config.http_timeout(),
            metrics.clone(),
        )?;
        let tiles = TileService::new(catalog.clone(), Arc::new(broadcaster));
        let rate_limiter = RateLimiter::per_minute(config.rate_limit_per_minute);

        Ok(Self {
            config,
            catalog,
            cache,
            tiles,
            rate_limiter,
            metrics,
        })
    }
}

/// PostgreSQL catalog when `DATABASE_URL` is set, the built-in list otherwise.
async fn connect_catalog(config: &ServiceConfig) -> Result<Arc<dyn LayerCatalog>> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("No database configured, using built-in layer catalog");
        return Ok(Arc::new(StaticCatalog::with_defaults()));
    };

    let catalog = PgLayerCatalog::connect(database_url)
        .await
        .context("Failed to connect layer catalog")?;

    if config.run_migrations {
        info!("Running layer catalog migrations");
        catalog.migrate().await.context("Catalog migration failed")?;
        let seeded = catalog
            .ensure_seeded(&default_layers())
            .await
            .context("Catalog seeding failed")?;
        info!(seeded = seeded, "Layer catalog migrations complete");
    }

    Ok(Arc::new(catalog))
}
