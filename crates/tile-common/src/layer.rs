//! Layer definitions shared by the catalog and the tile broadcaster.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{TileError, TileResult};

/// Upstream tile provider convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// NASA GIBS WMTS (Earth imagery, time-varying)
    Gibs,
    /// NASA Solar System Treks WMTS (planetary bodies)
    Trek,
}

impl LayerKind {
    /// Parse a catalog kind string. Anything but `gibs`/`trek` is rejected.
    pub fn parse(kind: &str) -> TileResult<Self> {
        match kind {
            "gibs" => Ok(Self::Gibs),
            "trek" => Ok(Self::Trek),
            other => Err(TileError::UnsupportedLayerKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gibs => "gibs",
            Self::Trek => "trek",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a layer key into its namespace prefix and the remainder.
///
/// `"gibs:MODIS_Terra"` yields `(Some("gibs"), "MODIS_Terra")`; a key
/// without a colon yields `(None, key)`.
pub fn split_layer_key(key: &str) -> (Option<&str>, &str) {
    match key.split_once(':') {
        Some((namespace, rest)) => (Some(namespace), rest),
        None => (None, key),
    }
}

/// Anything shaped like a catalog layer.
///
/// Implemented by the static [`LayerConfig`] and by persisted catalog rows,
/// so the broadcaster does not care where a layer came from.
pub trait LayerDefinition: Send + Sync + std::fmt::Debug {
    fn layer_key(&self) -> &str;
    fn title(&self) -> &str;
    /// Raw kind string as stored in the catalog (validated at URL-build time).
    fn kind(&self) -> &str;
    fn body(&self) -> &str;
    fn projection(&self) -> &str;
    fn matrix_set(&self) -> Option<&str>;
    fn image_format(&self) -> Option<&str>;
    fn style(&self) -> Option<&str>;
    fn max_zoom(&self) -> Option<u32>;
    fn default_date(&self) -> Option<NaiveDate>;
    fn source_template(&self) -> &str;

    /// Parsed provider kind.
    fn layer_kind(&self) -> TileResult<LayerKind> {
        LayerKind::parse(self.kind())
    }

    /// GIBS layers are implicitly time-varying and need a date.
    fn requires_date(&self) -> bool {
        self.kind() == LayerKind::Gibs.as_str()
    }
}

/// Static layer configuration compiled into the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub layer_key: String,
    pub title: String,
    pub kind: String,
    pub body: String,
    pub projection: String,
    pub matrix_set: Option<String>,
    pub image_format: Option<String>,
    pub style: Option<String>,
    pub max_zoom: Option<u32>,
    pub default_date: Option<NaiveDate>,
    pub source_template: String,
}

impl LayerDefinition for LayerConfig {
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
        self.max_zoom
    }

    fn default_date(&self) -> Option<NaiveDate> {
        self.default_date
    }

    fn source_template(&self) -> &str {
        &self.source_template
    }
}
