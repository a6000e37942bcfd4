//! Built-in layer catalog.
//!
//! These are the layers the viewer ships with. They back the static catalog
//! and seed the persisted catalog on first start.

use chrono::NaiveDate;

use crate::LayerConfig;

const GIBS_TEMPLATE: &str = "{layerId}/default/{date}/{matrixSet}/{z}/{y}/{x}.{format}";
const TREK_TILES: &str = "https://trek.nasa.gov/tiles";

fn gibs(
    id: &str,
    title: &str,
    matrix_set: &str,
    max_zoom: u32,
    default_date: Option<NaiveDate>,
) -> LayerConfig {
    LayerConfig {
        layer_key: format!("gibs:{}", id),
        title: title.to_string(),
        kind: "gibs".to_string(),
        body: "Earth".to_string(),
        projection: "EPSG:3857".to_string(),
        matrix_set: Some(matrix_set.to_string()),
        image_format: Some("jpg".to_string()),
        style: Some("default".to_string()),
        max_zoom: Some(max_zoom),
        default_date,
        source_template: GIBS_TEMPLATE.to_string(),
    }
}

fn trek(body: &str, id: &str, title: &str, image_format: &str, max_zoom: u32) -> LayerConfig {
    LayerConfig {
        layer_key: format!("trek:{}:{}", body, id),
        title: title.to_string(),
        kind: "trek".to_string(),
        body: body.to_string(),
        projection: "EPSG:4326".to_string(),
        matrix_set: Some("default028mm".to_string()),
        image_format: Some(image_format.to_string()),
        style: Some("default".to_string()),
        max_zoom: Some(max_zoom),
        default_date: None,
        // Trek layers carry their own absolute URL.
        source_template: format!(
            "{}/{}/EQ/{}/1.0.0/{{style}}/{{matrixSet}}/{{z}}/{{y}}/{{x}}.{{format}}",
            TREK_TILES, body, id
        ),
    }
}

/// The default layer set, GIBS first, then Trek grouped by body.
pub fn default_layers() -> Vec<LayerConfig> {
    let jan_2024 = NaiveDate::from_ymd_opt(2024, 1, 1);
    let jan_2004 = NaiveDate::from_ymd_opt(2004, 1, 1);
    let jan_2012 = NaiveDate::from_ymd_opt(2012, 1, 1);
    let level9 = "GoogleMapsCompatible_Level9";
    let level8 = "GoogleMapsCompatible_Level8";

    vec![
        gibs("MODIS_Terra_CorrectedReflectance_TrueColor", "MODIS Terra True Color", level9, 9, jan_2024),
        gibs("MODIS_Aqua_CorrectedReflectance_TrueColor", "MODIS Aqua True Color", level9, 9, jan_2024),
        gibs("VIIRS_SNPP_CorrectedReflectance_TrueColor", "VIIRS SNPP True Color", level9, 9, jan_2024),
        gibs("MODIS_Terra_CorrectedReflectance_Bands721", "MODIS Terra Bands 7-2-1", level9, 9, jan_2024),
        gibs("MODIS_Terra_CorrectedReflectance_Bands367", "MODIS Terra Bands 3-6-7", level9, 9, jan_2024),
        gibs("BlueMarble_ShadedRelief", "Blue Marble Shaded Relief", level8, 8, jan_2004),
        gibs("BlueMarble_ShadedRelief_Bathymetry", "Blue Marble Relief Bathymetry", level8, 8, jan_2004),
        gibs("VIIRS_CityLights_2012", "VIIRS City Lights 2012", level8, 8, jan_2012),
        trek("Mars", "Mars_MGS_MOLA_ClrShade_merge_global_463m", "Mars MOLA Color Shaded", "jpg", 10),
        trek("Mars", "Mars_Viking_MDIM21_ClrMosaic_global_232m", "Mars Viking MDIM21 Color Mosaic", "jpg", 10),
        trek("Moon", "LRO_LOLA_ClrShade_Global_128ppd_v04", "Moon LRO LOLA Color Shaded", "png", 8),
        trek(
            "Ceres",
            "Ceres_Dawn_FC_HAMO_ClrShade_DLR_Global_60ppd_Oct2016",
            "Ceres Dawn FC HAMO Color Shaded",
            "jpg",
            10,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_layer_keys_are_unique() {
        let layers = default_layers();
        let keys: HashSet<_> = layers.iter().map(|l| l.layer_key.as_str()).collect();
        assert_eq!(keys.len(), layers.len());
    }

    #[test]
    fn test_gibs_layers_have_default_dates() {
        for layer in default_layers().iter().filter(|l| l.kind == "gibs") {
            assert!(layer.default_date.is_some(), "{} has no default date", layer.layer_key);
        }
    }

    #[test]
    fn test_trek_templates_are_absolute() {
        let layer = default_layers()
            .into_iter()
            .find(|l| l.layer_key == "trek:Moon:LRO_LOLA_ClrShade_Global_128ppd_v04")
            .unwrap();
        assert_eq!(
            layer.source_template,
            "https://trek.nasa.gov/tiles/Moon/EQ/LRO_LOLA_ClrShade_Global_128ppd_v04/1.0.0/{style}/{matrixSet}/{z}/{y}/{x}.{format}"
        );
        assert_eq!(layer.layer_key.split(':').count(), 3);
    }
}
