//! Storage abstractions for the tile proxy.
//!
//! Provides:
//! - A file-backed tile cache with TTL expiry
//! - The layer catalog, static or backed by PostgreSQL

pub mod cache;
pub mod catalog;

pub use cache::{cache_file_stem, CachedPayload, FileCache, TileHeaders};
pub use catalog::{LayerCatalog, LayerRow, PgLayerCatalog, StaticCatalog};
