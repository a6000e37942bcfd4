//! HTTP request handlers.
//!
//! - `tiles`: tile proxy
//! - `layers`: layer catalog grouped by body
//! - `health`: root, health, readiness and Prometheus metrics
//! - `cache`: tile cache maintenance
//! - `common`: JSON error rendering

pub mod cache;
pub mod common;
pub mod health;
pub mod layers;
pub mod tiles;

pub use cache::{cache_clear_handler, cache_stats_handler};
pub use common::{ApiError, ApiResult, ErrorBody};
pub use health::{health_handler, metrics_handler, ready_handler, root_handler};
pub use layers::{layers_handler, LayerSummary};
pub use tiles::{tile_handler, TileQuery};
