//! Tests for the built-in layer set and the layer definition trait.

use tile_common::{default_layers, split_layer_key, LayerDefinition, LayerKind};

#[test]
fn test_default_layers_cover_four_bodies() {
    let mut bodies: Vec<String> = default_layers().into_iter().map(|l| l.body).collect();
    bodies.sort();
    bodies.dedup();
    assert_eq!(bodies, vec!["Ceres", "Earth", "Mars", "Moon"]);
}

#[test]
fn test_default_layer_kinds_parse() {
    for layer in default_layers() {
        let kind = layer.layer_kind().unwrap();
        let (namespace, _) = split_layer_key(&layer.layer_key);
        assert_eq!(namespace, Some(kind.as_str()));
    }
}

#[test]
fn test_only_gibs_layers_require_dates() {
    let layers = default_layers();
    let gibs = layers.iter().filter(|l| l.requires_date()).count();
    let trek = layers
        .iter()
        .filter(|l| l.layer_kind().unwrap() == LayerKind::Trek)
        .count();

    assert_eq!(gibs, 8);
    assert_eq!(trek, 4);
}

#[test]
fn test_layer_config_serde() {
    let layer = default_layers().remove(0);
    let json = serde_json::to_string(&layer).unwrap();
    assert!(json.contains("\"default_date\":\"2024-01-01\""));
}
