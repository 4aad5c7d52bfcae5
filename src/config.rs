//! Application configuration, read from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) gives the
//! dashboard's stock settings.

use crate::charts::{ColorScheme, Lighting};
use crate::data::{LoadOptions, DEFAULT_FILE_PREFIX};
use crate::hex::{AggregationRequest, MetricSelector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// 3D draws extruded columns, 2D flat hexagons.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum RenderMode {
    #[default]
    #[serde(rename = "3D")]
    #[strum(serialize = "3D")]
    ThreeD,
    #[serde(rename = "2D")]
    #[strum(serialize = "2D")]
    TwoD,
}

impl RenderMode {
    pub fn is_3d(self) -> bool {
        self == Self::ThreeD
    }
}

/// Map appearance for one rendering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub mode: RenderMode,
    /// Hexagon circumradius in meters.
    pub radius: f64,
    /// Layer opacity in `0.0..=1.0`.
    pub opacity: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub bearing: f64,
    pub center_longitude: f64,
    pub center_latitude: f64,
    pub elevation_scale: f64,
    pub lighting: Lighting,
    /// Static render size in pixels.
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::ThreeD,
            radius: 300.0,
            opacity: 0.5,
            zoom: 9.95,
            min_zoom: 5.0,
            max_zoom: 15.0,
            bearing: -27.36,
            center_longitude: -75.1652,
            center_latitude: 39.9926,
            elevation_scale: 50.0,
            lighting: Lighting::default(),
            image_width: 1200,
            image_height: 1000,
        }
    }
}

impl RenderSettings {
    /// Camera pitch in degrees.
    pub fn pitch(&self) -> f64 {
        match self.mode {
            RenderMode::ThreeD => 60.0,
            RenderMode::TwoD => 10.0,
        }
    }

    /// Elevation range of the column layer; flat in 2D.
    pub fn elevation_range(&self) -> [f64; 2] {
        match self.mode {
            RenderMode::ThreeD => [0.0, 150.0],
            RenderMode::TwoD => [0.0, 0.0],
        }
    }

    pub fn request(&self, metric: MetricSelector) -> AggregationRequest {
        AggregationRequest {
            metric,
            radius: self.radius,
            opacity: self.opacity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Invalid(format!(
                "opacity must be within 0..=1, got {}",
                self.opacity
            )));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ConfigError::Invalid("image size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Where crash extracts are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub require_non_empty: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            require_non_empty: false,
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            file_prefix: self.file_prefix.clone(),
            require_non_empty: self.require_non_empty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub render: RenderSettings,
    pub metric: MetricSelector,
    pub color_scheme: ColorScheme,
}

impl AppConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.render.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Rgba;
    use std::str::FromStr;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.render.radius, 300.0);
        assert_eq!(config.render.opacity, 0.5);
        assert_eq!(config.color_scheme.len(), 12);
        assert_eq!(config.data.directory, PathBuf::from("data"));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = AppConfig::from_toml_str(r#"metric = "bicycle_fatalities""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("unknown metric 'bicycle_fatalities'"));
    }

    #[test]
    fn parses_partial_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            metric = "pedestrian_fatalities"
            color_scheme = [[0, 0, 0], [255, 255, 255, 128]]

            [data]
            directory = "/srv/crashes"

            [render]
            mode = "2D"
            radius = 800.0
            "#,
        )
        .unwrap();

        assert_eq!(config.metric, MetricSelector::PedestrianFatalities);
        assert_eq!(config.data.directory, PathBuf::from("/srv/crashes"));
        assert_eq!(config.data.file_prefix, "CRASH");
        assert_eq!(config.render.mode, RenderMode::TwoD);
        assert_eq!(config.render.radius, 800.0);
        assert_eq!(config.render.zoom, 9.95);
        assert_eq!(
            config.color_scheme.colors(),
            &[Rgba::rgb(0, 0, 0), Rgba::rgba(255, 255, 255, 128)]
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_toml_str("[render]\nradius = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[render]\nopacity = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("color_scheme = []"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn mode_switches_pitch_and_elevation() {
        let mut settings = RenderSettings::default();
        assert_eq!(settings.pitch(), 60.0);
        assert_eq!(settings.elevation_range(), [0.0, 150.0]);

        settings.mode = RenderMode::from_str("2d").unwrap();
        assert_eq!(settings.pitch(), 10.0);
        assert_eq!(settings.elevation_range(), [0.0, 0.0]);
        assert_eq!(settings.mode.to_string(), "2D");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }
}
