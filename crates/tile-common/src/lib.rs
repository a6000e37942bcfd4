//! Common types and utilities shared across the tile proxy crates.

pub mod defaults;
pub mod error;
pub mod layer;
pub mod time;

pub use defaults::default_layers;
pub use error::{TileError, TileResult};
pub use layer::{split_layer_key, LayerConfig, LayerDefinition, LayerKind};
pub use time::{format_date, parse_date, resolve_date};
