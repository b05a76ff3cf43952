//! Color coders.

use super::{interpolate, Coder, CodingFlags, Fallback, GradientPoint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HEX_RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})$").expect("valid rgb regex")
});

const DEFAULT_PALETTE: &[&str] = &[
    "#FF9000", "#5D7CBA", "#A97838", "#8B9BBA", "#FFC77F", "#003EBA", "#29447B", "#543C1C",
];

pub const MIXED_COLOR: &str = "#FFFFFF";
pub const MISSING_COLOR: &str = "#888888";
pub const OTHERS_COLOR: &str = "#AAAAAA";

pub const MIXED_LABEL: &str = "Mixed";
pub const MISSING_LABEL: &str = "Missing";
pub const OTHERS_LABEL: &str = "Others";

/// Coder construction errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CoderError {
    InvalidColor(String),
    EmptyGradient,
    UnsortedGradient { previous: f64, next: f64 },
}

impl Display for CoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColor(value) => write!(f, "coder color must be `#RRGGBB`, got `{value}`"),
            Self::EmptyGradient => write!(f, "gradient needs at least one control point"),
            Self::UnsortedGradient { previous, next } => write!(
                f,
                "gradient control points must ascend: {next} follows {previous}"
            ),
        }
    }
}

impl Error for CoderError {}

/// Fallback coder: hands out palette colors in first-seen key order.
///
/// Assignment is deterministic for a given visit order and stable for the
/// coder's lifetime.
#[derive(Debug)]
pub struct DefaultColorCoder {
    assigned: RefCell<BTreeMap<String, String>>,
    next_index: Cell<usize>,
    others: Fallback<String>,
    mixed: Fallback<String>,
    missing: Fallback<String>,
}

impl Default for DefaultColorCoder {
    fn default() -> Self {
        Self {
            assigned: RefCell::new(BTreeMap::new()),
            next_index: Cell::new(0),
            others: Fallback::new(OTHERS_COLOR.to_string(), OTHERS_LABEL),
            mixed: Fallback::new(MIXED_COLOR.to_string(), MIXED_LABEL),
            missing: Fallback::new(MISSING_COLOR.to_string(), MISSING_LABEL),
        }
    }
}

impl DefaultColorCoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn color_for(&self, key: &str) -> String {
        if let Some(color) = self.assigned.borrow().get(key) {
            return color.clone();
        }
        let index = self.next_index.get();
        let color = DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()].to_string();
        self.next_index.set(index + 1);
        self.assigned
            .borrow_mut()
            .insert(key.to_string(), color.clone());
        color
    }
}

impl Coder for DefaultColorCoder {
    type Value = String;

    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> String {
        flags.keys.insert(key.to_string());
        self.color_for(key)
    }

    fn others(&self) -> &Fallback<String> {
        &self.others
    }

    fn mixed(&self) -> &Fallback<String> {
        &self.mixed
    }

    fn missing(&self) -> &Fallback<String> {
        &self.missing
    }
}

/// Explicit key → color table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedColorCoder {
    colors: BTreeMap<String, String>,
    others: Fallback<String>,
    mixed: Fallback<String>,
    missing: Fallback<String>,
}

impl KeyedColorCoder {
    pub fn new<K, C>(entries: impl IntoIterator<Item = (K, C)>) -> Result<Self, CoderError>
    where
        K: Into<String>,
        C: Into<String>,
    {
        let mut colors = BTreeMap::new();
        for (key, color) in entries {
            colors.insert(key.into(), checked_color(color.into())?);
        }
        Ok(Self {
            colors,
            others: Fallback::new(OTHERS_COLOR.to_string(), OTHERS_LABEL),
            mixed: Fallback::new(MIXED_COLOR.to_string(), MIXED_LABEL),
            missing: Fallback::new(MISSING_COLOR.to_string(), MISSING_LABEL),
        })
    }

    pub fn with_others(mut self, color: &str, label: &str) -> Result<Self, CoderError> {
        self.others = Fallback::new(checked_color(color.to_string())?, label);
        Ok(self)
    }

    pub fn with_mixed(mut self, color: &str, label: &str) -> Result<Self, CoderError> {
        self.mixed = Fallback::new(checked_color(color.to_string())?, label);
        Ok(self)
    }

    pub fn with_missing(mut self, color: &str, label: &str) -> Result<Self, CoderError> {
        self.missing = Fallback::new(checked_color(color.to_string())?, label);
        Ok(self)
    }
}

impl Coder for KeyedColorCoder {
    type Value = String;

    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> String {
        match self.colors.get(key) {
            Some(color) => {
                flags.keys.insert(key.to_string());
                color.clone()
            }
            None => {
                flags.others = true;
                self.others.value.clone()
            }
        }
    }

    fn others(&self) -> &Fallback<String> {
        &self.others
    }

    fn mixed(&self) -> &Fallback<String> {
        &self.mixed
    }

    fn missing(&self) -> &Fallback<String> {
        &self.missing
    }
}

/// Numeric keys blended between color control points.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientColorCoder {
    points: Vec<GradientPoint<String>>,
    others: Fallback<String>,
    mixed: Fallback<String>,
    missing: Fallback<String>,
}

impl GradientColorCoder {
    pub fn new(points: Vec<GradientPoint<String>>) -> Result<Self, CoderError> {
        let mut checked = Vec::with_capacity(points.len());
        for point in points {
            checked.push(GradientPoint {
                value: point.value,
                coded: checked_color(point.coded)?,
            });
        }
        check_ascending(&checked)?;
        Ok(Self {
            points: checked,
            others: Fallback::new(OTHERS_COLOR.to_string(), OTHERS_LABEL),
            mixed: Fallback::new(MIXED_COLOR.to_string(), MIXED_LABEL),
            missing: Fallback::new(MISSING_COLOR.to_string(), MISSING_LABEL),
        })
    }
}

impl Coder for GradientColorCoder {
    type Value = String;

    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> String {
        let blended = key
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .and_then(|value| interpolate(&self.points, value, blend_colors));
        match blended {
            Some(color) => {
                flags.keys.insert(key.to_string());
                color
            }
            None => {
                flags.others = true;
                self.others.value.clone()
            }
        }
    }

    fn others(&self) -> &Fallback<String> {
        &self.others
    }

    fn mixed(&self) -> &Fallback<String> {
        &self.mixed
    }

    fn missing(&self) -> &Fallback<String> {
        &self.missing
    }

    fn gradient(&self) -> Option<&[GradientPoint<String>]> {
        Some(self.points.as_slice())
    }
}

pub(crate) fn check_ascending<V>(points: &[GradientPoint<V>]) -> Result<(), CoderError> {
    if points.is_empty() {
        return Err(CoderError::EmptyGradient);
    }
    for window in points.windows(2) {
        if window[1].value < window[0].value {
            return Err(CoderError::UnsortedGradient {
                previous: window[0].value,
                next: window[1].value,
            });
        }
    }
    Ok(())
}

fn checked_color(color: String) -> Result<String, CoderError> {
    if HEX_RGB_RE.is_match(color.as_str()) {
        Ok(color.to_ascii_uppercase())
    } else {
        Err(CoderError::InvalidColor(color))
    }
}

fn parse_rgb(color: &str) -> Option<[u8; 3]> {
    let captures = HEX_RGB_RE.captures(color)?;
    let mut rgb = [0u8; 3];
    for (index, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(captures.get(index + 1)?.as_str(), 16).ok()?;
    }
    Some(rgb)
}

fn blend_colors(low: &String, high: &String, t: f64) -> String {
    match (parse_rgb(low), parse_rgb(high)) {
        (Some(a), Some(b)) => {
            let channel = |i: usize| {
                let value = f64::from(a[i]) + (f64::from(b[i]) - f64::from(a[i])) * t;
                value.round().clamp(0.0, 255.0) as u8
            };
            format!("#{:02X}{:02X}{:02X}", channel(0), channel(1), channel(2))
        }
        _ => low.clone(),
    }
}
