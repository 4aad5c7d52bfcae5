//! deck.gl hand-off: the bin table as a JSON layer spec and a standalone page.
//!
//! Bins are drawn with a `ColumnLayer` at six-sided disk resolution, so the
//! browser shows exactly the hexagons computed here instead of re-binning.

use super::legend::{escape_html, Legend};
use super::palette::{ColorScheme, Rgba};
use crate::config::RenderSettings;
use crate::hex::HexAggregation;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the Mapbox access token.
pub const MAPBOX_KEY_VAR: &str = "phila_crash_map_api_key";
pub const MAPBOX_DARK_STYLE: &str = "mapbox://styles/mapbox/dark-v10";
pub const CARTO_DARK_STYLE: &str =
    "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json";

/// Basemap provider and style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStyle {
    Mapbox { api_key: String },
    Carto,
}

impl MapStyle {
    /// Mapbox when a non-empty token is given, Carto otherwise.
    pub fn resolve(api_key: Option<String>) -> Self {
        match api_key {
            Some(key) if !key.trim().is_empty() => Self::Mapbox { api_key: key },
            _ => Self::Carto,
        }
    }

    pub fn from_env() -> Self {
        let style = Self::resolve(env::var(MAPBOX_KEY_VAR).ok());
        if style == Self::Carto {
            log::debug!("{MAPBOX_KEY_VAR} not set, using the Carto basemap");
        }
        style
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::Mapbox { .. } => "mapbox",
            Self::Carto => "carto",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Mapbox { .. } => MAPBOX_DARK_STYLE,
            Self::Carto => CARTO_DARK_STYLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Light {
    Ambient {
        intensity: f64,
    },
    Directional {
        intensity: f64,
        direction: [f64; 3],
        color: [u8; 3],
    },
}

/// Light settings attached to the layer material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lighting {
    pub ambient_ratio: f64,
    pub diffuse_ratio: f64,
    pub specular_ratio: f64,
    pub lights: Vec<Light>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_ratio: 0.4,
            diffuse_ratio: 0.6,
            specular_ratio: 0.8,
            lights: vec![
                Light::Ambient { intensity: 0.5 },
                Light::Directional {
                    intensity: 1.0,
                    direction: [3.0, 10.0, -5.0],
                    color: [255, 255, 255],
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub ambient_color: [u8; 3],
    pub shininess: f64,
    pub light_settings: Lighting,
}

/// One hexagon as the browser sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDatum {
    /// `[longitude, latitude]` of the bin center.
    pub position: [f64; 2],
    pub color: Rgba,
    /// Aggregate value, shown in the tooltip.
    pub elevation_value: u64,
    /// Column height before `elevationScale`.
    pub elevation: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayer {
    #[serde(rename = "@@type")]
    pub layer_type: &'static str,
    pub id: String,
    pub data: Vec<ColumnDatum>,
    pub disk_resolution: u32,
    pub radius: f64,
    pub angle: f64,
    pub coverage: f64,
    pub extruded: bool,
    pub elevation_scale: f64,
    pub pickable: bool,
    pub auto_highlight: bool,
    pub opacity: f64,
    pub get_position: &'static str,
    pub get_fill_color: &'static str,
    pub get_elevation: &'static str,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipStyle {
    pub background_color: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub html: String,
    pub style: TooltipStyle,
}

/// Complete deck description of one rendering pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSpec {
    pub initial_view_state: ViewState,
    pub layers: Vec<ColumnLayer>,
    pub map_provider: &'static str,
    pub map_style: &'static str,
    pub tooltip: Tooltip,
    #[serde(skip)]
    pub map: MapStyle,
}

impl DeckSpec {
    pub fn new(
        aggregation: &HexAggregation,
        settings: &RenderSettings,
        scheme: &ColorScheme,
        map: MapStyle,
    ) -> Self {
        let [low, high] = settings.elevation_range();
        let data = aggregation
            .bins
            .iter()
            .map(|bin| {
                let value = bin.value as f64;
                let (color, elevation) = match aggregation.value_range {
                    Some(range) if !range.is_degenerate() => (
                        scheme.color_for(value, range),
                        low + (value - range.min) / range.width() * (high - low),
                    ),
                    _ => (scheme.first(), high),
                };
                ColumnDatum {
                    position: [bin.position.longitude, bin.position.latitude],
                    color,
                    elevation_value: bin.value,
                    elevation,
                    count: bin.count,
                }
            })
            .collect();

        let layer = ColumnLayer {
            layer_type: "ColumnLayer",
            id: "crash-hexagons".to_string(),
            data,
            disk_resolution: 6,
            radius: aggregation.radius(),
            // Pointy-top cells: first vertex at 30 degrees.
            angle: 30.0,
            coverage: 1.0,
            extruded: settings.mode.is_3d(),
            elevation_scale: settings.elevation_scale,
            pickable: true,
            auto_highlight: true,
            opacity: aggregation.opacity,
            get_position: "@@=position",
            get_fill_color: "@@=color",
            get_elevation: "@@=elevation",
            material: Material {
                ambient_color: [255, 255, 255],
                shininess: 50.0,
                light_settings: settings.lighting.clone(),
            },
        };

        Self {
            initial_view_state: ViewState {
                longitude: settings.center_longitude,
                latitude: settings.center_latitude,
                zoom: settings.zoom,
                min_zoom: settings.min_zoom,
                max_zoom: settings.max_zoom,
                pitch: settings.pitch(),
                bearing: settings.bearing,
            },
            layers: vec![layer],
            map_provider: map.provider(),
            map_style: map.url(),
            tooltip: Tooltip {
                html: format!("<b>{} :</b> {{elevationValue}}", aggregation.metric),
                style: TooltipStyle {
                    background_color: "rgba(0, 0, 0, 0.7)",
                    color: "white",
                },
            },
            map,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Standalone page that loads deck.gl from a CDN and draws this spec,
    /// with the legend overlaid when there is one.
    pub fn to_html(&self, title: &str, legend: Option<&Legend>) -> serde_json::Result<String> {
        let spec = serde_json::to_string(self)?;
        let (map_script, map_css, token) = match &self.map {
            MapStyle::Mapbox { api_key } => (
                "https://api.mapbox.com/mapbox-gl-js/v1.13.3/mapbox-gl.js",
                "https://api.mapbox.com/mapbox-gl-js/v1.13.3/mapbox-gl.css",
                format!("mapboxgl.accessToken = {};", serde_json::to_string(api_key)?),
            ),
            MapStyle::Carto => (
                "https://unpkg.com/maplibre-gl@3.6.2/dist/maplibre-gl.js",
                "https://unpkg.com/maplibre-gl@3.6.2/dist/maplibre-gl.css",
                String::new(),
            ),
        };
        let legend_html = legend.map(Legend::to_html).unwrap_or_default();

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://unpkg.com/deck.gl@8.9.35/dist.min.js"></script>
<script src="https://unpkg.com/@deck.gl/json@8.9.35/dist.min.js"></script>
<script src="{map_script}"></script>
<link href="{map_css}" rel="stylesheet">
<style>
  body {{ margin: 0; background: #000; }}
  #map {{ position: absolute; width: 100%; height: 100%; }}
</style>
</head>
<body>
<div id="map"></div>
{legend_html}<script>
{token}
const spec = {spec};
const converter = new deck.JSONConverter({{
  configuration: new deck.JSONConfiguration({{ classes: deck }})
}});
const props = converter.convert(spec);
new deck.DeckGL({{
  ...props,
  container: "map",
  mapStyle: spec.mapStyle,
  controller: true,
  getTooltip: ({{ object }}) => object && {{
    html: spec.tooltip.html.replace("{{elevationValue}}", object.elevationValue),
    style: spec.tooltip.style
  }}
}});
</script>
</body>
</html>
"#,
            title = escape_html(title),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderMode;
    use crate::data::CrashRecord;
    use crate::hex::{AggregationRequest, HexAggregator, MetricSelector};
    use serde_json::Value;

    fn aggregation() -> HexAggregation {
        let mut a = CrashRecord::at(-75.16, 39.95);
        a.injury_count = 2;
        let mut b = CrashRecord::at(-75.05, 40.05);
        b.injury_count = 6;
        let df = CrashRecord::to_dataframe(&[a, b]).unwrap();
        HexAggregator::aggregate(
            &df,
            &AggregationRequest {
                metric: MetricSelector::TotalInjured,
                radius: 300.0,
                opacity: 0.5,
            },
        )
        .unwrap()
    }

    fn spec_json(mode: RenderMode) -> Value {
        let settings = RenderSettings {
            mode,
            ..RenderSettings::default()
        };
        let spec = DeckSpec::new(
            &aggregation(),
            &settings,
            &ColorScheme::default(),
            MapStyle::Carto,
        );
        serde_json::from_str(&spec.to_json().unwrap()).unwrap()
    }

    #[test]
    fn map_style_follows_api_key() {
        assert_eq!(MapStyle::resolve(None), MapStyle::Carto);
        assert_eq!(MapStyle::resolve(Some("  ".into())), MapStyle::Carto);
        let mapbox = MapStyle::resolve(Some("pk.test".into()));
        assert_eq!(mapbox.provider(), "mapbox");
        assert_eq!(mapbox.url(), MAPBOX_DARK_STYLE);
    }

    #[test]
    fn three_d_spec_is_extruded() {
        let json = spec_json(RenderMode::ThreeD);
        let layer = &json["layers"][0];
        assert_eq!(layer["@@type"], "ColumnLayer");
        assert_eq!(layer["diskResolution"], 6);
        assert_eq!(layer["radius"], 300.0);
        assert_eq!(layer["extruded"], true);
        assert_eq!(layer["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["initialViewState"]["pitch"], 60.0);
        assert_eq!(json["initialViewState"]["bearing"], -27.36);
        assert_eq!(json["mapStyle"], CARTO_DARK_STYLE);
        assert_eq!(
            json["tooltip"]["html"],
            "<b>Total Injured :</b> {elevationValue}"
        );
        let lights = &layer["material"]["lightSettings"]["lights"];
        assert_eq!(lights[0]["type"], "ambient");
        assert_eq!(lights[1]["direction"], serde_json::json!([3.0, 10.0, -5.0]));
    }

    #[test]
    fn two_d_spec_is_flat() {
        let json = spec_json(RenderMode::TwoD);
        let layer = &json["layers"][0];
        assert_eq!(layer["extruded"], false);
        assert_eq!(json["initialViewState"]["pitch"], 10.0);
        for datum in layer["data"].as_array().unwrap() {
            assert_eq!(datum["elevation"], 0.0);
        }
    }

    #[test]
    fn data_carries_values_and_ramp_colors() {
        let json = spec_json(RenderMode::ThreeD);
        let data = json["layers"][0]["data"].as_array().unwrap();
        let mut values: Vec<u64> = data
            .iter()
            .map(|d| d["elevationValue"].as_u64().unwrap())
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![2, 6]);

        let scheme = ColorScheme::default();
        let top = data
            .iter()
            .find(|d| d["elevationValue"] == 6)
            .unwrap();
        assert_eq!(top["color"], serde_json::to_value(scheme.last()).unwrap());
        assert_eq!(top["elevation"], 150.0);
    }

    #[test]
    fn html_embeds_spec_and_legend() {
        let agg = aggregation();
        let scheme = ColorScheme::default();
        let spec = DeckSpec::new(
            &agg,
            &RenderSettings::default(),
            &scheme,
            MapStyle::Mapbox {
                api_key: "pk.secret".into(),
            },
        );
        let legend = Legend::from_aggregation(&agg, &scheme);
        let html = spec.to_html("Crashes", legend.as_ref()).unwrap();
        assert!(html.contains("ColumnLayer"));
        assert!(html.contains("mapboxgl.accessToken = \"pk.secret\";"));
        assert!(html.contains("crash-legend"));
        // The token only appears in the page, never in the JSON spec.
        assert!(!spec.to_json().unwrap().contains("pk.secret"));
    }
}
