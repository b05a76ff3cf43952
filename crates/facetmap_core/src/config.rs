//! Map view configuration.
//!
//! # Responsibility
//! - Deserialize view settings and accessor bindings from JSON.
//! - Apply widget defaults for every omitted field.
//! - Reject values that would produce unusable marker geometry.
//!
//! # Invariants
//! - `center`, `zoom` and `max_auto_zoom` stay `None` unless configured;
//!   `None` enables auto-center/auto-zoom.
//! - A validated `ViewSettings` is never mutated by the view.

use crate::model::point::LatLng;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Center used for the initial map frame when none is configured.
pub const DEFAULT_CENTER: LatLng = LatLng { lat: 20.0, lng: 0.0 };
/// Zoom used for the initial map frame when none is configured.
pub const DEFAULT_ZOOM: f64 = 2.0;
/// Painter service that renders marker images from query parameters.
pub const DEFAULT_MARKER_URL_PREFIX: &str = "http://simile.mit.edu/painter/painter?";

/// Largest accepted marker dimension in pixels.
pub const MAX_MARKER_DIMENSION: u32 = 4096;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Zoom/pan control flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSize {
    #[default]
    Small,
    Large,
}

/// Base map imagery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    #[default]
    Normal,
    Satellite,
    Hybrid,
}

/// Where info windows attach to a pinned marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleTip {
    #[default]
    Top,
    Bottom,
}

/// Resolved view settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    /// `[lat, lng]`; unset enables auto-center.
    pub center: Option<[f64; 2]>,
    /// Unset enables auto-zoom.
    pub zoom: Option<f64>,
    /// Upper bound for auto-zoom.
    pub max_auto_zoom: Option<f64>,
    pub size: ControlSize,
    pub scale_control: bool,
    pub overview_control: bool,
    #[serde(rename = "type")]
    pub map_type: MapType,
    pub bubble_tip: BubbleTip,
    pub map_height: u32,
    /// Marker color when no color accessor is configured.
    pub color: String,
    pub color_coder: Option<String>,
    pub size_coder: Option<String>,
    /// Fixed marker size; `0` keeps the shape dimensions.
    pub icon_size: u32,
    pub icon_fit: String,
    pub icon_scale: f64,
    pub icon_offset_x: f64,
    pub icon_offset_y: f64,
    pub shape: String,
    pub shape_width: u32,
    pub shape_height: u32,
    pub shape_alpha: f64,
    pub pin: bool,
    pub pin_height: u32,
    pub pin_width: u32,
    pub size_legend_label: String,
    pub color_legend_label: String,
    pub marker_url_prefix: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center: None,
            zoom: None,
            max_auto_zoom: None,
            size: ControlSize::Small,
            scale_control: true,
            overview_control: false,
            map_type: MapType::Normal,
            bubble_tip: BubbleTip::Top,
            map_height: 400,
            color: "#FF9000".to_string(),
            color_coder: None,
            size_coder: None,
            icon_size: 0,
            icon_fit: "smaller".to_string(),
            icon_scale: 1.0,
            icon_offset_x: 0.0,
            icon_offset_y: 0.0,
            shape: "circle".to_string(),
            shape_width: 24,
            shape_height: 24,
            shape_alpha: 0.7,
            pin: true,
            pin_height: 6,
            pin_width: 6,
            size_legend_label: String::new(),
            color_legend_label: String::new(),
            marker_url_prefix: DEFAULT_MARKER_URL_PREFIX.to_string(),
        }
    }
}

impl ViewSettings {
    /// Configured center, if pinned.
    pub fn center_lat_lng(&self) -> Option<LatLng> {
        self.center.map(|[lat, lng]| LatLng::new(lat, lng))
    }

    /// Center for the first frame before any auto-centering.
    pub fn initial_center(&self) -> LatLng {
        self.center_lat_lng().unwrap_or(DEFAULT_CENTER)
    }

    /// Zoom for the first frame before any auto-zoom.
    pub fn initial_zoom(&self) -> f64 {
        self.zoom.unwrap_or(DEFAULT_ZOOM)
    }

    /// Validates value ranges that marker synthesis depends on.
    pub fn validate(&self) -> ConfigResult<()> {
        if !HEX_COLOR_RE.is_match(self.color.as_str()) {
            return Err(ConfigError::InvalidColor(self.color.clone()));
        }
        for (name, value) in [
            ("shapeWidth", self.shape_width),
            ("shapeHeight", self.shape_height),
        ] {
            if value == 0 || value > MAX_MARKER_DIMENSION {
                return Err(ConfigError::InvalidDimension { name, value });
            }
        }
        for (name, value) in [
            ("pinWidth", self.pin_width),
            ("pinHeight", self.pin_height),
            ("iconSize", self.icon_size),
        ] {
            if value > MAX_MARKER_DIMENSION {
                return Err(ConfigError::InvalidDimension { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.shape_alpha) {
            return Err(ConfigError::InvalidAlpha(self.shape_alpha));
        }
        for zoom in [self.zoom, self.max_auto_zoom].into_iter().flatten() {
            if !zoom.is_finite() || zoom < 0.0 {
                return Err(ConfigError::InvalidZoom(zoom));
            }
        }
        if let Some([lat, lng]) = self.center {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ConfigError::InvalidCenter { lat, lng });
            }
        }
        Ok(())
    }
}

/// Attribute names the view reads from the item database.
///
/// Every binding is optional; the coordinate shape is chosen from the
/// combination present (see `accessor::LatLngBinding`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessorConfig {
    pub proxy: Option<String>,
    pub latlng: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub max_auto_zoom: Option<String>,
    pub color_key: Option<String>,
    /// Legacy name for `color_key`.
    pub marker: Option<String>,
    pub size_key: Option<String>,
    pub icon: Option<String>,
}

/// Full configuration document: `{ "settings": {..}, "accessors": {..} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    pub settings: ViewSettings,
    pub accessors: AccessorConfig,
}

impl MapViewConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.settings.validate()?;
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidColor(String),
    InvalidDimension { name: &'static str, value: u32 },
    InvalidAlpha(f64),
    InvalidZoom(f64),
    InvalidCenter { lat: f64, lng: f64 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid map view configuration: {err}"),
            Self::InvalidColor(value) => {
                write!(f, "color must be `#RRGGBB`, got `{value}`")
            }
            Self::InvalidDimension { name, value } => {
                write!(f, "{name} must be within 1..={MAX_MARKER_DIMENSION}, got {value}")
            }
            Self::InvalidAlpha(value) => write!(f, "shapeAlpha must be within [0, 1], got {value}"),
            Self::InvalidZoom(value) => write!(f, "zoom must be a non-negative number, got {value}"),
            Self::InvalidCenter { lat, lng } => {
                write!(f, "center is out of range: ({lat}, {lng})")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{BubbleTip, ConfigError, MapType, MapViewConfig, ViewSettings, MAX_MARKER_DIMENSION};

    #[test]
    fn empty_document_uses_defaults() {
        let config = MapViewConfig::from_json("{}").expect("empty config");
        assert_eq!(config.settings, ViewSettings::default());
        assert_eq!(config.settings.center, None);
        assert_eq!(config.settings.initial_zoom(), 2.0);
        assert!(config.accessors.latlng.is_none());
    }

    #[test]
    fn parses_camel_case_fields() {
        let config = MapViewConfig::from_json(
            r##"{
                "settings": {
                    "center": [42.36, -71.09],
                    "type": "hybrid",
                    "bubbleTip": "bottom",
                    "shapeWidth": 30,
                    "colorLegendLabel": "Kind"
                },
                "accessors": { "lat": "latitude", "lng": "longitude", "colorKey": "kind" }
            }"##,
        )
        .expect("config should parse");

        assert_eq!(config.settings.map_type, MapType::Hybrid);
        assert_eq!(config.settings.bubble_tip, BubbleTip::Bottom);
        assert_eq!(config.settings.shape_width, 30);
        assert_eq!(config.settings.shape_height, 24);
        assert_eq!(config.settings.color_legend_label, "Kind");
        assert_eq!(config.settings.initial_center().lat, 42.36);
        assert_eq!(config.accessors.lat.as_deref(), Some("latitude"));
        assert_eq!(config.accessors.color_key.as_deref(), Some("kind"));
    }

    #[test]
    fn rejects_invalid_color() {
        let err = MapViewConfig::from_json(r#"{ "settings": { "color": "orange" } }"#)
            .expect_err("named colors are not supported");
        assert!(matches!(err, ConfigError::InvalidColor(_)));
    }

    #[test]
    fn rejects_zero_shape_dimension_and_bad_alpha() {
        let mut settings = ViewSettings::default();
        settings.shape_height = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidDimension {
                name: "shapeHeight",
                ..
            })
        ));

        let mut settings = ViewSettings::default();
        settings.shape_width = u32::MAX;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidDimension {
                name: "shapeWidth",
                ..
            })
        ));

        let mut settings = ViewSettings::default();
        settings.pin_height = MAX_MARKER_DIMENSION + 1;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidDimension {
                name: "pinHeight",
                ..
            })
        ));

        let mut settings = ViewSettings::default();
        settings.shape_alpha = 1.5;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidAlpha(_))));
    }

    #[test]
    fn rejects_unknown_enum_choice() {
        let err = MapViewConfig::from_json(r#"{ "settings": { "type": "terrain" } }"#)
            .expect_err("terrain is not a supported map type");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
