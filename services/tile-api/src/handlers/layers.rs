//! Layer catalog handler.

use axum::{
    extract::{ConnectInfo, Extension},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;

use tile_common::LayerDefinition;

use super::common::ApiResult;
use crate::rate_limit::client_key;
use crate::state::AppState;

/// One layer as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub layer_key: String,
    pub title: String,
    pub kind: String,
    pub body: String,
    pub projection: String,
    pub matrix_set: Option<String>,
    pub image_format: Option<String>,
    /// Proxy URL template with `{z}`, `{x}`, `{y}` (and `{date}` for GIBS)
    pub tile_template: String,
    pub max_zoom: Option<u32>,
    pub default_date: Option<NaiveDate>,
}

impl LayerSummary {
    pub fn from_layer(layer: &dyn LayerDefinition) -> Self {
        let mut tile_template = format!("/v1/layers/{}/tiles/{{z}}/{{x}}/{{y}}", layer.layer_key());
        if layer.requires_date() {
            tile_template.push_str("?date={date}");
        }

        Self {
            layer_key: layer.layer_key().to_string(),
            title: layer.title().to_string(),
            kind: layer.kind().to_string(),
            body: layer.body().to_string(),
            projection: layer.projection().to_string(),
            matrix_set: layer.matrix_set().map(str::to_string),
            image_format: layer.image_format().map(str::to_string),
            tile_template,
            max_zoom: layer.max_zoom(),
            default_date: layer.default_date(),
        }
    }
}

/// Group layers by celestial body, keeping catalog order within a group.
pub fn group_by_body(layers: &[Arc<dyn LayerDefinition>]) -> BTreeMap<String, Vec<LayerSummary>> {
    let mut grouped: BTreeMap<String, Vec<LayerSummary>> = BTreeMap::new();
    for layer in layers {
        grouped
            .entry(layer.body().to_string())
            .or_default()
            .push(LayerSummary::from_layer(layer.as_ref()));
    }
    grouped
}

/// GET /v1/layers
#[instrument(skip(state, headers, peer))]
pub async fn layers_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> ApiResult<Json<BTreeMap<String, Vec<LayerSummary>>>> {
    let client = client_key(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.trust_forwarded_for,
    );
    state.rate_limiter.check(&client)?;

    let layers = state.catalog.list().await?;
    Ok(Json(group_by_body(&layers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{keys, modis_layer, trek_layer};

    #[test]
    fn test_summary_templates() {
        let gibs = LayerSummary::from_layer(&modis_layer());
        assert_eq!(
            gibs.tile_template,
            format!("/v1/layers/{}/tiles/{{z}}/{{x}}/{{y}}?date={{date}}", keys::MODIS_TERRA)
        );

        let trek = LayerSummary::from_layer(&trek_layer(keys::TREK_MARS));
        assert_eq!(
            trek.tile_template,
            format!("/v1/layers/{}/tiles/{{z}}/{{x}}/{{y}}", keys::TREK_MARS)
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_value(LayerSummary::from_layer(&modis_layer())).unwrap();
        assert_eq!(json["layerKey"], keys::MODIS_TERRA);
        assert_eq!(json["matrixSet"], "GoogleMapsCompatible_Level9");
        assert_eq!(json["defaultDate"], "2024-01-01");
        assert_eq!(json["maxZoom"], 9);
        assert!(json.get("tileTemplate").is_some());
    }

    #[test]
    fn test_group_by_body() {
        let layers: Vec<Arc<dyn LayerDefinition>> = vec![
            Arc::new(modis_layer()),
            Arc::new(trek_layer(keys::TREK_MARS)),
            Arc::new(trek_layer("trek:Mars:Other")),
        ];
        let grouped = group_by_body(&layers);

        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["Earth", "Mars"]);
        assert_eq!(grouped["Mars"].len(), 2);
        assert_eq!(grouped["Mars"][1].layer_key, "trek:Mars:Other");
    }
}
