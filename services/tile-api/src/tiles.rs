//! Tile service: the boundary between HTTP handlers and the broadcaster.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;

use storage::LayerCatalog;
use tile_common::{TileError, TileResult};

use crate::broadcast::{TileBroadcaster, TilePayload};

pub struct TileService {
    catalog: Arc<dyn LayerCatalog>,
    broadcaster: Arc<TileBroadcaster>,
}

impl TileService {
    pub fn new(catalog: Arc<dyn LayerCatalog>, broadcaster: Arc<TileBroadcaster>) -> Self {
        Self {
            catalog,
            broadcaster,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn LayerCatalog> {
        &self.catalog
    }

    pub fn broadcaster(&self) -> &Arc<TileBroadcaster> {
        &self.broadcaster
    }

    /// Resolve a layer and return one of its tiles.
    ///
    /// A GIBS layer with neither a requested nor a default date is rejected
    /// before any cache or upstream access.
    #[instrument(skip(self))]
    pub async fn fetch_tile(
        &self,
        layer_key: &str,
        z: u32,
        x: u32,
        y: u32,
        date_override: Option<NaiveDate>,
    ) -> TileResult<TilePayload> {
        let layer = self
            .catalog
            .lookup(layer_key)
            .await?
            .ok_or_else(|| TileError::LayerNotFound(layer_key.to_string()))?;

        if layer.requires_date() && date_override.is_none() && layer.default_date().is_none() {
            return Err(TileError::MissingRequiredDate(layer_key.to_string()));
        }

        self.broadcaster
            .get_tile(layer.as_ref(), z, x, y, date_override)
            .await
    }
}
