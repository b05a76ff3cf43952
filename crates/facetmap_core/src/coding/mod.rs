//! Color and size coding strategies.
//!
//! # Responsibility
//! - Define the `Coder` contract used for marker color and size.
//! - Share the key-set translation rules (mixed/missing/others) across coders.
//! - Resolve configured coder references with fallback behavior.
//!
//! # Invariants
//! - `translate_set` records every mapped key into `CodingFlags::keys`.
//! - A key set spanning several coded values yields the mixed value.
//! - An empty key set yields the missing value.

use std::collections::BTreeSet;
use std::fmt::Debug;

pub mod color;
pub mod registry;
pub mod size;

pub use color::{DefaultColorCoder, GradientColorCoder, KeyedColorCoder};
pub use registry::{CoderDefinition, CoderRegistry, ResolvedCoders};
pub use size::{GradientSizeCoder, KeyedSizeCoder};

/// Color coder: values are `#RRGGBB` strings.
pub type ColorCoder = dyn Coder<Value = String>;
/// Size coder: values are marker sizes in pixels.
pub type SizeCoder = dyn Coder<Value = u32>;

/// Per-pass accumulator filled by `Coder::translate_set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingFlags {
    pub mixed: bool,
    pub missing: bool,
    pub others: bool,
    pub keys: BTreeSet<String>,
}

/// Display value and legend label of a fallback category.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallback<V> {
    pub value: V,
    pub label: String,
}

impl<V> Fallback<V> {
    pub fn new(value: V, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// One control point of a continuous coding.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientPoint<V> {
    pub value: f64,
    pub coded: V,
}

/// Strategy mapping keys to a visual value.
pub trait Coder {
    type Value: Clone + PartialEq + Debug;

    /// Translates one key, recording `others`/`keys` into `flags`.
    fn translate_key(&self, key: &str, flags: &mut CodingFlags) -> Self::Value;

    fn others(&self) -> &Fallback<Self::Value>;
    fn mixed(&self) -> &Fallback<Self::Value>;
    fn missing(&self) -> &Fallback<Self::Value>;

    /// Control points when the coding is continuous.
    fn gradient(&self) -> Option<&[GradientPoint<Self::Value>]> {
        None
    }

    /// Translates one key without keeping flags (legend rendering).
    fn translate(&self, key: &str) -> Self::Value {
        let mut scratch = CodingFlags::default();
        self.translate_key(key, &mut scratch)
    }

    /// Translates a cluster's key set into one value.
    fn translate_set(&self, keys: &BTreeSet<String>, flags: &mut CodingFlags) -> Self::Value {
        let mut coded: Option<Self::Value> = None;
        let mut is_mixed = false;
        for key in keys {
            let value = self.translate_key(key, flags);
            match &coded {
                None => coded = Some(value),
                Some(existing) if *existing != value => is_mixed = true,
                Some(_) => {}
            }
        }

        if is_mixed {
            flags.mixed = true;
            return self.mixed().value.clone();
        }
        match coded {
            Some(value) => value,
            None => {
                flags.missing = true;
                self.missing().value.clone()
            }
        }
    }
}

/// Linear interpolation over sorted control points, clamped at both ends.
pub(crate) fn interpolate<V>(
    points: &[GradientPoint<V>],
    value: f64,
    blend: impl Fn(&V, &V, f64) -> V,
) -> Option<V>
where
    V: Clone,
{
    let first = points.first()?;
    let last = points.last()?;
    if value <= first.value {
        return Some(first.coded.clone());
    }
    if value >= last.value {
        return Some(last.coded.clone());
    }
    for window in points.windows(2) {
        let (low, high) = (&window[0], &window[1]);
        if value >= low.value && value <= high.value {
            let span = high.value - low.value;
            if span <= 0.0 {
                return Some(high.coded.clone());
            }
            let t = (value - low.value) / span;
            return Some(blend(&low.coded, &high.coded, t));
        }
    }
    Some(last.coded.clone())
}
