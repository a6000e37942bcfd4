//! Upstream tile URL construction for GIBS and Trek layers.

use chrono::NaiveDate;

use tile_common::time::{format_date, resolve_date};
use tile_common::{split_layer_key, LayerDefinition, LayerKind, TileError, TileResult};

const GIBS_DEFAULT_MATRIX_SET: &str = "GoogleMapsCompatible_Level9";
const GIBS_DEFAULT_FORMAT: &str = "jpg";
const TREK_DEFAULT_MATRIX_SET: &str = "default028mm";
const TREK_DEFAULT_FORMAT: &str = "png";
const DEFAULT_STYLE: &str = "default";

/// Base URLs that relative templates are joined to.
#[derive(Debug, Clone)]
pub struct ProviderBases {
    pub gibs: String,
    pub trek: String,
}

impl ProviderBases {
    pub fn new(gibs: impl Into<String>, trek: impl Into<String>) -> Self {
        Self {
            gibs: gibs.into(),
            trek: trek.into(),
        }
    }

    fn for_kind(&self, kind: LayerKind) -> &str {
        match kind {
            LayerKind::Gibs => &self.gibs,
            LayerKind::Trek => &self.trek,
        }
    }
}

/// Values substituted into a layer's source template.
#[derive(Debug)]
struct TemplateVars<'a> {
    layer_id: &'a str,
    body: &'a str,
    layer: &'a str,
    date: String,
    matrix_set: &'a str,
    format: &'a str,
    style: &'a str,
}

/// Build the fully qualified upstream URL for one tile.
///
/// Tile coordinates are substituted verbatim. The only impurity is reading
/// today's date when neither an override nor a layer default is present.
pub fn build_url(
    layer: &dyn LayerDefinition,
    z: u32,
    x: u32,
    y: u32,
    date_override: Option<NaiveDate>,
    bases: &ProviderBases,
) -> TileResult<String> {
    let kind = layer.layer_kind()?;
    let date = format_date(resolve_date(date_override, layer.default_date()));

    let vars = match kind {
        LayerKind::Gibs => {
            let (_, layer_id) = split_layer_key(layer.layer_key());
            TemplateVars {
                layer_id,
                body: layer.body(),
                layer: layer_id,
                date,
                matrix_set: layer.matrix_set().unwrap_or(GIBS_DEFAULT_MATRIX_SET),
                format: layer.image_format().unwrap_or(GIBS_DEFAULT_FORMAT),
                style: layer.style().unwrap_or(DEFAULT_STYLE),
            }
        }
        LayerKind::Trek => {
            let (body, name) = split_trek_key(layer.layer_key())?;
            TemplateVars {
                layer_id: name,
                body,
                layer: name,
                date,
                matrix_set: layer.matrix_set().unwrap_or(TREK_DEFAULT_MATRIX_SET),
                format: layer.image_format().unwrap_or(TREK_DEFAULT_FORMAT),
                style: layer.style().unwrap_or(DEFAULT_STYLE),
            }
        }
    };

    let template = layer.source_template();
    let raw = if has_scheme(template) {
        template.to_string()
    } else {
        join_base(bases.for_kind(kind), template)
    };

    let (z, x, y) = (z.to_string(), x.to_string(), y.to_string());
    Ok(substitute(&raw, |name| match name {
        "layerId" => Some(vars.layer_id),
        "body" => Some(vars.body),
        "layer" => Some(vars.layer),
        "date" => Some(vars.date.as_str()),
        "matrixSet" => Some(vars.matrix_set),
        "format" => Some(vars.format),
        "style" => Some(vars.style),
        "z" => Some(z.as_str()),
        "x" => Some(x.as_str()),
        "y" => Some(y.as_str()),
        _ => None,
    }))
}

/// Replace each `{name}` in one left-to-right pass.
///
/// Substituted values are never rescanned. Unknown placeholders and
/// unmatched braces are kept as written.
fn substitute<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(|c: char| c == '{' || c == '}') {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// `trek:<body>:<layer>` with exactly three non-empty parts.
fn split_trek_key(key: &str) -> TileResult<(&str, &str)> {
    let parts: Vec<&str> = key.split(':').collect();
    match parts.as_slice() {
        [ns, body, name] if !ns.is_empty() && !body.is_empty() && !name.is_empty() => {
            Ok((body, name))
        }
        _ => Err(TileError::MalformedLayerKey(key.to_string())),
    }
}

/// True for templates like `https://...`.
fn has_scheme(template: &str) -> bool {
    match template.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn join_base(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{gibs_layer, keys, modis_layer, trek_layer, unknown_kind_layer, ymd};

    fn bases() -> ProviderBases {
        ProviderBases::new(
            "https://gibs.example/wmts/epsg3857/best/",
            "https://trek.example/tiles",
        )
    }

    #[test]
    fn test_gibs_override_date_and_layer_id() {
        let layer = gibs_layer(keys::GIBS_TEST);
        let url = build_url(&layer, 3, 4, 5, Some(ymd(2024, 1, 5)), &bases()).unwrap();

        assert_eq!(
            url,
            "https://gibs.example/wmts/epsg3857/best/TEST_LAYER/default/2024-01-05/GoogleMapsCompatible_Level9/3/5/4.jpg"
        );
    }

    #[test]
    fn test_override_date_beats_layer_default() {
        let mut layer = gibs_layer(keys::GIBS_TEST);
        layer.matrix_set = Some("GoogleMapsCompatible_Level9".to_string());
        layer.image_format = Some("png".to_string());
        layer.default_date = Some(ymd(2024, 1, 1));

        let url = build_url(&layer, 2, 1, 3, Some(ymd(2024, 1, 5)), &bases()).unwrap();

        assert_eq!(
            url,
            "https://gibs.example/wmts/epsg3857/best/TEST_LAYER/default/2024-01-05/GoogleMapsCompatible_Level9/2/3/1.png"
        );
        assert!(!url.contains("2024-01-01"), "{}", url);
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut layer = trek_layer(keys::TREK_MARS);
        layer.style = Some("{z}".to_string());
        layer.matrix_set = Some("{date}".to_string());
        let url = build_url(&layer, 7, 0, 0, None, &bases()).unwrap();

        assert!(url.ends_with("/1.0.0/{z}/{date}/7/0/0.png"), "{}", url);
    }

    #[test]
    fn test_substitute_keeps_unknown_and_unbalanced_braces() {
        let lookup = |name: &str| (name == "z").then_some("4");
        assert_eq!(substitute("{z}/{q}/{z}", lookup), "4/{q}/4");
        assert_eq!(substitute("a{b{z}c}", lookup), "a{b4c}");
        assert_eq!(substitute("tail{", lookup), "tail{");
        assert_eq!(substitute("", lookup), "");
    }

    #[test]
    fn test_gibs_default_date() {
        let url = build_url(&modis_layer(), 2, 1, 0, None, &bases()).unwrap();
        assert!(url.contains("/default/2024-01-01/"), "{}", url);
    }

    #[test]
    fn test_gibs_today_fallback() {
        let layer = gibs_layer(keys::GIBS_TEST);
        let url = build_url(&layer, 0, 0, 0, None, &bases()).unwrap();
        let today = format_date(tile_common::time::today());
        assert!(url.contains(&today), "{}", url);
    }

    #[test]
    fn test_gibs_key_without_namespace_uses_whole_key() {
        let mut layer = gibs_layer("PLAIN");
        layer.source_template = "{layerId}/{z}/{y}/{x}".to_string();
        let url = build_url(&layer, 1, 2, 3, None, &bases()).unwrap();
        assert_eq!(url, "https://gibs.example/wmts/epsg3857/best/PLAIN/1/3/2");
    }

    #[test]
    fn test_trek_relative_template() {
        let layer = trek_layer(keys::TREK_MARS);
        let url = build_url(&layer, 2, 1, 3, None, &bases()).unwrap();

        assert_eq!(
            url,
            "https://trek.example/tiles/Mars/EQ/CTX_Mosaic_Global_6ppd/1.0.0/default/default028mm/2/3/1.png"
        );
    }

    #[test]
    fn test_full_url_template_ignores_base() {
        let mut layer = trek_layer("trek:Moon:LRO_LOLA");
        layer.source_template =
            "https://other.example/{body}/{layer}/{z}/{y}/{x}.{format}".to_string();
        let url = build_url(&layer, 1, 0, 0, None, &bases()).unwrap();
        assert_eq!(url, "https://other.example/Moon/LRO_LOLA/1/0/0.png");
    }

    #[test]
    fn test_layer_fields_override_provider_defaults() {
        let mut layer = trek_layer(keys::TREK_MARS);
        layer.matrix_set = Some("custom".to_string());
        layer.image_format = Some("jpg".to_string());
        layer.style = Some("hillshade".to_string());
        let url = build_url(&layer, 0, 0, 0, None, &bases()).unwrap();
        assert!(url.ends_with("/1.0.0/hillshade/custom/0/0/0.jpg"), "{}", url);
    }

    #[test]
    fn test_malformed_trek_keys() {
        for key in [keys::TREK_MALFORMED, "trek:Mars:", "trek::Layer", "trek:Mars:A:B"] {
            let layer = trek_layer(key);
            match build_url(&layer, 0, 0, 0, None, &bases()) {
                Err(TileError::MalformedLayerKey(k)) => assert_eq!(k, key),
                other => panic!("expected MalformedLayerKey for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected_for_any_tile() {
        let layer = unknown_kind_layer("wms");
        for (z, x, y) in [(0, 0, 0), (5, 10, 12), (22, u32::MAX, 7)] {
            assert!(matches!(
                build_url(&layer, z, x, y, None, &bases()),
                Err(TileError::UnsupportedLayerKind(_))
            ));
        }
    }

    #[test]
    fn test_coordinates_are_not_bounds_checked() {
        let layer = gibs_layer(keys::GIBS_TEST);
        let url = build_url(&layer, 30, 999_999, 123_456, Some(ymd(2024, 1, 1)), &bases()).unwrap();
        assert!(url.ends_with("/30/123456/999999.jpg"), "{}", url);
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://a/b"));
        assert!(has_scheme("http://a"));
        assert!(!has_scheme("{layerId}/x"));
        assert!(!has_scheme("://nope"));
        assert!(!has_scheme("path/with://inside"));
    }

    #[test]
    fn test_join_base_normalizes_slashes() {
        assert_eq!(join_base("https://a/", "/b"), "https://a/b");
        assert_eq!(join_base("https://a", "b"), "https://a/b");
        assert_eq!(join_base("https://a//", "//b"), "https://a/b");
    }
}
