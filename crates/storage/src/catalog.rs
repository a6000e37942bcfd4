//! Layer catalog: a static in-memory registry or a PostgreSQL table.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use tile_common::{LayerConfig, LayerDefinition, TileError, TileResult};

/// Read-mostly registry of tile layers, keyed by exact `layer_key`.
#[async_trait]
pub trait LayerCatalog: Send + Sync {
    async fn lookup(&self, layer_key: &str) -> TileResult<Option<Arc<dyn LayerDefinition>>>;

    async fn list(&self) -> TileResult<Vec<Arc<dyn LayerDefinition>>>;
}

// ============================================================================
// Static catalog
// ============================================================================

/// Catalog compiled into the service.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    layers: HashMap<String, Arc<LayerConfig>>,
    order: Vec<String>,
}

impl StaticCatalog {
    /// Build from a layer list. Later duplicates of a key replace earlier ones.
    pub fn new(layers: impl IntoIterator<Item = LayerConfig>) -> Self {
        let mut catalog = Self::default();
        for layer in layers {
            let key = layer.layer_key.clone();
            if catalog.layers.insert(key.clone(), Arc::new(layer)).is_none() {
                catalog.order.push(key);
            }
        }
        catalog
    }

    /// The built-in layer set.
    pub fn with_defaults() -> Self {
        Self::new(tile_common::default_layers())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[async_trait]
impl LayerCatalog for StaticCatalog {
    async fn lookup(&self, layer_key: &str) -> TileResult<Option<Arc<dyn LayerDefinition>>> {
        Ok(self
            .layers
            .get(layer_key)
            .map(|layer| layer.clone() as Arc<dyn LayerDefinition>))
    }

    async fn list(&self) -> TileResult<Vec<Arc<dyn LayerDefinition>>> {
        Ok(self
            .order
            .iter()
            .filter_map(|key| self.layers.get(key))
            .map(|layer| layer.clone() as Arc<dyn LayerDefinition>)
            .collect())
    }
}

// ============================================================================
// PostgreSQL catalog
// ============================================================================

/// Layer catalog persisted in the `layers` table.
pub struct PgLayerCatalog {
    pool: PgPool,
}

impl PgLayerCatalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str) -> TileResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| TileError::DatabaseError(format!("Connection failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist.
    pub async fn migrate(&self) -> TileResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| TileError::DatabaseError(format!("Migration failed: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Insert the seed layers, but only into an empty table.
    ///
    /// Returns the number of rows inserted.
    pub async fn ensure_seeded(&self, seed: &[LayerConfig]) -> TileResult<usize> {
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM layers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TileError::DatabaseError(format!("Count failed: {}", e)))?;

        if existing > 0 {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TileError::DatabaseError(format!("Transaction failed: {}", e)))?;

        for layer in seed {
            sqlx::query(
                r#"
                INSERT INTO layers (
                    layer_key, title, kind, body, projection,
                    matrix_set, image_format, style, max_zoom,
                    default_date, source_template
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (layer_key) DO NOTHING
                "#,
            )
            .bind(&layer.layer_key)
            .bind(&layer.title)
            .bind(&layer.kind)
            .bind(&layer.body)
            .bind(&layer.projection)
            .bind(&layer.matrix_set)
            .bind(&layer.image_format)
            .bind(&layer.style)
            .bind(layer.max_zoom.map(|z| z as i32))
            .bind(layer.default_date)
            .bind(&layer.source_template)
            .execute(&mut *tx)
            .await
            .map_err(|e| TileError::DatabaseError(format!("Insert failed: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| TileError::DatabaseError(format!("Commit failed: {}", e)))?;

        info!(count = seed.len(), "Seeded layer catalog");
        Ok(seed.len())
    }
}

#[async_trait]
impl LayerCatalog for PgLayerCatalog {
    async fn lookup(&self, layer_key: &str) -> TileResult<Option<Arc<dyn LayerDefinition>>> {
        let row = sqlx::query_as::<_, LayerRow>(&format!(
            "SELECT {} FROM layers WHERE layer_key = $1",
            LAYER_COLUMNS
        ))
        .bind(layer_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TileError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(row.map(|r| Arc::new(r) as Arc<dyn LayerDefinition>))
    }

    async fn list(&self) -> TileResult<Vec<Arc<dyn LayerDefinition>>> {
        let rows = sqlx::query_as::<_, LayerRow>(&format!(
            "SELECT {} FROM layers ORDER BY body, title",
            LAYER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TileError::DatabaseError(format!("Query failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|r| Arc::new(r) as Arc<dyn LayerDefinition>)
            .collect())
    }
}

const LAYER_COLUMNS: &str = "layer_key, title, kind, body, projection, matrix_set, \
     image_format, style, max_zoom, default_date, source_template";

/// A row of the `layers` table.
#[derive(Debug, Clone, FromRow)]
pub struct LayerRow {
    pub layer_key: String,
    pub title: String,
    pub kind: String,
    pub body: String,
    pub projection: String,
    pub matrix_set: Option<String>,
    pub image_format: Option<String>,
    pub style: Option<String>,
    pub max_zoom: Option<i32>,
    pub default_date: Option<NaiveDate>,
    pub source_template: String,
}

impl LayerDefinition for LayerRow {
    fn layer_key(&self) -> &str {
        &self.layer_key
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn body(&self) -> &str {
        &self.body
    }

    fn projection(&self) -> &str {
        &self.projection
    }

    fn matrix_set(&self) -> Option<&str> {
        self.matrix_set.as_deref()
    }

    fn image_format(&self) -> Option<&str> {
        self.image_format.as_deref()
    }

    fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    fn max_zoom(&self) -> Option<u32> {
        self.max_zoom.and_then(|z| u32::try_from(z).ok())
    }

    fn default_date(&self) -> Option<NaiveDate> {
        self.default_date
    }

    fn source_template(&self) -> &str {
        &self.source_template
    }
}

impl From<LayerConfig> for LayerRow {
    fn from(layer: LayerConfig) -> Self {
        LayerRow {
            layer_key: layer.layer_key,
            title: layer.title,
            kind: layer.kind,
            body: layer.body,
            projection: layer.projection,
            matrix_set: layer.matrix_set,
            image_format: layer.image_format,
            style: layer.style,
            max_zoom: layer.max_zoom.map(|z| z as i32),
            default_date: layer.default_date,
            source_template: layer.source_template,
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS layers (
    id SERIAL PRIMARY KEY,
    layer_key VARCHAR(255) NOT NULL,
    title VARCHAR(255) NOT NULL,
    kind VARCHAR(50) NOT NULL,
    body VARCHAR(50) NOT NULL,
    projection VARCHAR(64) NOT NULL,
    matrix_set VARCHAR(128),
    image_format VARCHAR(16),
    style VARCHAR(64),
    max_zoom INTEGER,
    default_date DATE,
    source_template VARCHAR(1024) NOT NULL,
    CONSTRAINT uq_layers_layer_key UNIQUE (layer_key)
);

CREATE INDEX IF NOT EXISTS idx_layers_body ON layers(body)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(key: &str, title: &str) -> LayerConfig {
        LayerConfig {
            layer_key: key.to_string(),
            title: title.to_string(),
            kind: "gibs".to_string(),
            body: "Earth".to_string(),
            projection: "EPSG:3857".to_string(),
            matrix_set: None,
            image_format: None,
            style: None,
            max_zoom: None,
            default_date: None,
            source_template: "{layerId}/{z}/{y}/{x}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_lookup_is_exact_match() {
        let catalog = StaticCatalog::new(vec![layer("gibs:A", "A")]);

        assert!(catalog.lookup("gibs:A").await.unwrap().is_some());
        assert!(catalog.lookup("gibs:a").await.unwrap().is_none());
        assert!(catalog.lookup("gibs:A:").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_list_keeps_insertion_order_and_dedups() {
        let catalog = StaticCatalog::new(vec![
            layer("gibs:B", "B"),
            layer("gibs:A", "A"),
            layer("gibs:B", "B2"),
        ]);

        let keys: Vec<String> = catalog
            .list()
            .await
            .unwrap()
            .iter()
            .map(|l| l.layer_key().to_string())
            .collect();
        assert_eq!(keys, vec!["gibs:B", "gibs:A"]);

        let replaced = catalog.lookup("gibs:B").await.unwrap().unwrap();
        assert_eq!(replaced.title(), "B2");
    }

    #[tokio::test]
    async fn test_defaults_catalog() {
        let catalog = StaticCatalog::with_defaults();
        assert_eq!(catalog.len(), 12);

        let modis = catalog
            .lookup("gibs:MODIS_Terra_CorrectedReflectance_TrueColor")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(modis.default_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(modis.requires_date());
    }

    #[test]
    fn test_layer_row_from_config() {
        let mut config = layer("gibs:A", "A");
        config.max_zoom = Some(9);
        let row = LayerRow::from(config);

        assert_eq!(row.max_zoom, Some(9));
        assert_eq!(LayerDefinition::max_zoom(&row), Some(9));
        assert_eq!(LayerDefinition::layer_key(&row), "gibs:A");
    }

    #[test]
    fn test_negative_max_zoom_is_dropped() {
        let mut row = LayerRow::from(layer("gibs:A", "A"));
        row.max_zoom = Some(-1);
        assert_eq!(LayerDefinition::max_zoom(&row), None);
    }
}
