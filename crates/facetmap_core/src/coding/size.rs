//! Size coders.

use super::color::{check_ascending, CoderError, MISSING_LABEL, MIXED_LABEL, OTHERS_LABEL};
use super::{interpolate, Coder, CodingFlags, Fallback, GradientPoint};
use std::collections::BTreeMap;

pub const MIXED_SIZE: u32 = 20;
pub const MISSING_SIZE: u32 = 10;
pub const OTHERS_SIZE: u32 = 15;

/// Explicit key → marker size table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSizeCoder {
    sizes: BTreeMap<String, u32>,
    others: Fallback<u32>,
    mixed: Fallback<u32>,
    missing: Fallback<u32>,
}

impl KeyedSizeCoder {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, u32)>) -> Self {
        Self {
            sizes: entries
                .into_iter()
                .map(|(key, size)| (key.into(), size))
                .collect(),
            others: Fallback::new(OTHERS_SIZE, OTHERS_LABEL),
            mixed: Fallback::new(MIXED_SIZE, MIXED_LABEL),
            missing: Fallback::new(MISSING_SIZE, MISSING_LABEL),
        }
    }

    pub fn with_others(mut self, size: u32, label: &str) -> Self {
        self.others = Fallback::new(size, label);
        self
    }

    pub fn with_mixed(mut self, size: u32, label: &str) -> Self {
        self.mixed = Fallback::new(size, label);
        self
    }

    pub fn with_missing(mut self, size: u32, label: &str) -> Self {
        self.missing = Fallback::new(size, label);
        self
    }
}

impl Coder for KeyedSizeCoder {
    type Value = u32;

    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> u32 {
        match self.sizes.get(key) {
            Some(size) => {
                flags.keys.insert(key.to_string());
                *size
            }
            None => {
                flags.others = true;
                self.others.value
            }
        }
    }

    fn others(&self) -> &Fallback<u32> {
        &self.others
    }

    fn mixed(&self) -> &Fallback<u32> {
        &self.mixed
    }

    fn missing(&self) -> &Fallback<u32> {
        &self.missing
    }
}

/// Numeric keys interpolated between size control points.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSizeCoder {
    points: Vec<GradientPoint<u32>>,
    others: Fallback<u32>,
    mixed: Fallback<u32>,
    missing: Fallback<u32>,
}

impl GradientSizeCoder {
    pub fn new(points: Vec<GradientPoint<u32>>) -> Result<Self, CoderError> {
        check_ascending(&points)?;
        Ok(Self {
            points,
            others: Fallback::new(OTHERS_SIZE, OTHERS_LABEL),
            mixed: Fallback::new(MIXED_SIZE, MIXED_LABEL),
            missing: Fallback::new(MISSING_SIZE, MISSING_LABEL),
        })
    }
}

impl Coder for GradientSizeCoder {
    type Value = u32;

    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> u32 {
        let size = key
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .and_then(|value| interpolate(&self.points, value, blend_sizes));
        match size {
            Some(size) => {
                flags.keys.insert(key.to_string());
                size
            }
            None => {
                flags.others = true;
                self.others.value
            }
        }
    }

    fn others(&self) -> &Fallback<u32> {
        &self.others
    }

    fn mixed(&self) -> &Fallback<u32> {
        &self.mixed
    }

    fn missing(&self) -> &Fallback<u32> {
        &self.missing
    }

    fn gradient(&self) -> Option<&[GradientPoint<u32>]> {
        Some(self.points.as_slice())
    }
}

fn blend_sizes(low: &u32, high: &u32, t: f64) -> u32 {
    let value = f64::from(*low) + (f64::from(*high) - f64::from(*low)) * t;
    value.round().max(0.0) as u32
}
