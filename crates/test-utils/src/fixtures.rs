//! Layer fixtures shared by the storage and API tests.

use chrono::NaiveDate;
use tile_common::LayerConfig;

/// Layer keys used across tests.
pub mod keys {
    pub const GIBS_TEST: &str = "gibs:TEST_LAYER";
    pub const MODIS_TERRA: &str = "gibs:MODIS_Terra_CorrectedReflectance_TrueColor";
    pub const TREK_MARS: &str = "trek:Mars:CTX_Mosaic_Global_6ppd";
    pub const TREK_MALFORMED: &str = "trek:Mars";
}

/// Shorthand for a calendar date in tests.
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A GIBS layer with a relative template and no default date.
pub fn gibs_layer(layer_key: &str) -> LayerConfig {
    LayerConfig {
        layer_key: layer_key.to_string(),
        title: "Test GIBS Layer".to_string(),
        kind: "gibs".to_string(),
        body: "Earth".to_string(),
        projection: "EPSG:3857".to_string(),
        matrix_set: None,
        image_format: None,
        style: None,
        max_zoom: Some(9),
        default_date: None,
        source_template: "{layerId}/default/{date}/{matrixSet}/{z}/{y}/{x}.{format}".to_string(),
    }
}

/// The MODIS Terra true-color layer with its 2024-01-01 default date.
pub fn modis_layer() -> LayerConfig {
    LayerConfig {
        title: "MODIS Terra True Color".to_string(),
        matrix_set: Some("GoogleMapsCompatible_Level9".to_string()),
        image_format: Some("jpg".to_string()),
        default_date: Some(ymd(2024, 1, 1)),
        ..gibs_layer(keys::MODIS_TERRA)
    }
}

/// A Trek layer with a relative template.
pub fn trek_layer(layer_key: &str) -> LayerConfig {
    LayerConfig {
        layer_key: layer_key.to_string(),
        title: "Test Trek Layer".to_string(),
        kind: "trek".to_string(),
        body: "Mars".to_string(),
        projection: "EPSG:4326".to_string(),
        matrix_set: None,
        image_format: None,
        style: None,
        max_zoom: Some(10),
        default_date: None,
        source_template: "{body}/EQ/{layer}/1.0.0/{style}/{matrixSet}/{z}/{y}/{x}.{format}"
            .to_string(),
    }
}

/// A layer whose kind is neither `gibs` nor `trek`.
pub fn unknown_kind_layer(kind: &str) -> LayerConfig {
    LayerConfig {
        kind: kind.to_string(),
        ..gibs_layer("wms:SOMETHING")
    }
}
