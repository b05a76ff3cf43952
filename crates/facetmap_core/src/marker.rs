//! Marker icon synthesis.
//!
//! # Responsibility
//! - Compute marker body/pin geometry, anchors and hit regions.
//! - Build painter image URLs for markers, shadows and legend swatches.
//!
//! # Invariants
//! - Synthesis is a pure function of its inputs; no shared state is mutated.
//! - A size-coded marker (`icon_size > 0`) never has a pin or a shadow.
//! - With a pin, total height is body height plus pin height.
//! - Geometry arithmetic saturates instead of overflowing.

use crate::config::{BubbleTip, ViewSettings};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but RFC 3986 unreserved characters is escaped in query values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const DEFAULT_ICON_FIT: &str = "smaller";
const LABEL_CHAR_WIDTH: u32 = 3;
const SWATCH_SHAPE: &str = "circle";
const SWATCH_SIZE: u32 = 20;
const SWATCH_PIN_HEIGHT: u32 = 5;

/// Marker drawing parameters taken from view settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerGeometry {
    pub shape_width: u32,
    pub shape_height: u32,
    pub shape_alpha: f64,
    pub pin: bool,
    pub pin_height: u32,
    pub pin_width: u32,
    pub bubble_tip: BubbleTip,
    pub icon_fit: String,
    pub icon_scale: f64,
    pub icon_offset_x: f64,
    pub icon_offset_y: f64,
    pub url_prefix: String,
}

impl MarkerGeometry {
    pub fn from_settings(settings: &ViewSettings) -> Self {
        Self {
            shape_width: settings.shape_width,
            shape_height: settings.shape_height,
            shape_alpha: settings.shape_alpha,
            pin: settings.pin,
            pin_height: settings.pin_height,
            pin_width: settings.pin_width,
            bubble_tip: settings.bubble_tip,
            icon_fit: settings.icon_fit.clone(),
            icon_scale: settings.icon_scale,
            icon_offset_x: settings.icon_offset_x,
            icon_offset_y: settings.icon_offset_y,
            url_prefix: settings.marker_url_prefix.clone(),
        }
    }
}

impl Default for MarkerGeometry {
    fn default() -> Self {
        Self::from_settings(&ViewSettings::default())
    }
}

/// Per-marker inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRequest<'a> {
    pub shape: &'a str,
    /// `#RRGGBB`.
    pub color: &'a str,
    /// `0` keeps the configured shape size.
    pub icon_size: u32,
    pub label: &'a str,
    pub icon_url: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

/// Renderable marker icon; one per cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIconDescriptor {
    pub image_url: String,
    pub shadow_url: Option<String>,
    pub anchor: PixelPoint,
    /// Clickable polygon, clockwise from the top-left corner.
    pub hit_region: Vec<PixelPoint>,
    pub size: PixelSize,
    pub shadow_size: PixelSize,
    pub info_window_anchor: PixelPoint,
    /// Body height without the pin.
    pub body_height: u32,
}

/// Builds the icon descriptor for one marker.
pub fn make_icon(request: &MarkerRequest<'_>, geometry: &MarkerGeometry) -> MarkerIconDescriptor {
    let label_chars = u32::try_from(request.label.chars().count()).unwrap_or(u32::MAX);
    let extra = label_chars.saturating_mul(LABEL_CHAR_WIDTH);
    let mut half_width = geometry.shape_width.div_ceil(2).saturating_add(extra);
    let mut width = half_width.saturating_mul(2);
    let mut body_height = geometry.shape_height;
    let mut pin = geometry.pin;
    if request.icon_size > 0 {
        width = request.icon_size;
        half_width = request.icon_size.div_ceil(2);
        body_height = request.icon_size;
        pin = false;
    }
    let mut height = body_height;

    let mut image = QueryString::new();
    image.push("renderer", "map-marker");
    image.push("shape", request.shape);
    image.push("alpha", geometry.shape_alpha);
    image.push("width", width);
    image.push("height", body_height);
    image.push("background", request.color.trim_start_matches('#'));
    image.push("label", request.label);

    let mut shadow = QueryString::new();
    shadow.push("renderer", "map-marker-shadow");
    shadow.push("shape", request.shape);
    shadow.push("width", width);
    shadow.push("height", body_height);

    if let Some(icon_url) = request.icon_url {
        image.push("icon", icon_url);
        if geometry.icon_fit != DEFAULT_ICON_FIT {
            image.push("iconFit", geometry.icon_fit.as_str());
        }
        if geometry.icon_scale != 1.0 {
            image.push("iconScale", geometry.icon_scale);
        }
        if geometry.icon_offset_x != 0.0 {
            image.push("iconX", geometry.icon_offset_x);
        }
        if geometry.icon_offset_y != 0.0 {
            image.push("iconY", geometry.icon_offset_y);
        }
    }

    let (w, hw, bh) = (i64::from(width), i64::from(half_width), i64::from(body_height));
    let mut pin_params = QueryString::new();
    let (anchor, hit_region, info_window_anchor) = if pin {
        let pin_half_width = geometry.pin_width.div_ceil(2);
        height = height.saturating_add(geometry.pin_height);
        pin_params.push("pinHeight", geometry.pin_height);
        pin_params.push("pinWidth", pin_half_width.saturating_mul(2));

        let h = i64::from(height);
        let phw = i64::from(pin_half_width);
        let tip = PixelPoint::new(hw, h);
        let hit_region = vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(0, bh),
            PixelPoint::new(hw - phw, bh),
            tip,
            PixelPoint::new(hw + phw, bh),
            PixelPoint::new(w, bh),
            PixelPoint::new(w, 0),
        ];
        let info_window_anchor = match geometry.bubble_tip {
            BubbleTip::Bottom => tip,
            BubbleTip::Top => PixelPoint::new(hw, 0),
        };
        (tip, hit_region, info_window_anchor)
    } else {
        pin_params.push("pin", "false");
        let anchor = PixelPoint::new(hw, i64::from(height.div_ceil(2)));
        let hit_region = vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(0, bh),
            PixelPoint::new(w, bh),
            PixelPoint::new(w, 0),
        ];
        (anchor, hit_region, PixelPoint::new(hw, 0))
    };

    image.extend(&pin_params);
    shadow.extend(&pin_params);
    let shadow_url =
        (request.icon_size == 0).then(|| format!("{}{}", geometry.url_prefix, shadow.finish()));

    MarkerIconDescriptor {
        image_url: format!("{}{}", geometry.url_prefix, image.finish()),
        shadow_url,
        anchor,
        hit_region,
        size: PixelSize {
            width: f64::from(width),
            height: f64::from(height),
        },
        shadow_size: PixelSize {
            width: f64::from(width) * 1.5,
            height: f64::from(height) - 2.0,
        },
        info_window_anchor,
        body_height,
    }
}

/// Legend swatch for a color entry.
pub fn color_swatch_url(url_prefix: &str, color: &str) -> String {
    let mut query = QueryString::new();
    query.push("renderer", "map-marker");
    query.push("shape", SWATCH_SHAPE);
    query.push("width", SWATCH_SIZE);
    query.push("height", SWATCH_SIZE);
    query.push("pinHeight", SWATCH_PIN_HEIGHT);
    query.push("background", color.trim_start_matches('#'));
    format!("{url_prefix}{}", query.finish())
}

/// Legend swatch for a size entry.
pub fn size_swatch_url(url_prefix: &str, size: u32) -> String {
    let mut query = QueryString::new();
    query.push("renderer", "map-marker");
    query.push("shape", SWATCH_SHAPE);
    query.push("width", size);
    query.push("height", size);
    query.push("pinHeight", 0);
    format!("{url_prefix}{}", query.finish())
}

/// Ordered `key=value` pairs joined with `&`.
#[derive(Debug, Clone, Default)]
struct QueryString {
    pairs: Vec<(&'static str, String)>,
}

impl QueryString {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, key: &'static str, value: impl ToString) {
        self.pairs.push((key, value.to_string()));
    }

    fn extend(&mut self, other: &QueryString) {
        self.pairs.extend(other.pairs.iter().cloned());
    }

    fn finish(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
