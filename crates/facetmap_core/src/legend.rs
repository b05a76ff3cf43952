//! Legend synthesis for color and size codings.
//!
//! # Invariants
//! - Discrete entries are sorted ascending by key.
//! - Fallback entries follow in the fixed order others, mixed, missing, and
//!   each appears at most once, only when its flag was set in the pass.

use crate::coding::{CodingFlags, ColorCoder, Fallback, GradientPoint, ResolvedCoders, SizeCoder};
use crate::marker::{color_swatch_url, size_swatch_url};

/// Number of samples drawn across a size gradient.
pub const SIZE_GRADIENT_SAMPLES: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Color,
    Size,
}

/// Why an entry is in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Key,
    Others,
    Mixed,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swatch {
    Color(String),
    Size(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub kind: EntryKind,
    pub swatch: Swatch,
    pub label: String,
    /// Painter image rendering the swatch.
    pub swatch_url: String,
}

/// Legend section for one coding dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBlock {
    pub dimension: Dimension,
    /// Heading, present only when configured non-empty.
    pub label: Option<String>,
    /// Continuous color ramp; `None` for discrete and size legends.
    pub gradient: Option<Vec<GradientPoint<String>>>,
    pub entries: Vec<LegendEntry>,
}

impl LegendBlock {
    pub fn entries_of(&self, kind: EntryKind) -> impl Iterator<Item = &LegendEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Legend {
    pub blocks: Vec<LegendBlock>,
}

impl Legend {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, dimension: Dimension) -> Option<&LegendBlock> {
        self.blocks.iter().find(|block| block.dimension == dimension)
    }
}

/// Legend inputs gathered during one reconstruction pass.
pub struct LegendInputs<'a> {
    pub coders: &'a ResolvedCoders,
    pub color_flags: &'a CodingFlags,
    pub size_flags: &'a CodingFlags,
    pub color_label: &'a str,
    pub size_label: &'a str,
    pub url_prefix: &'a str,
}

/// Builds blocks for every active coding dimension, color first.
pub fn build_legend(inputs: &LegendInputs<'_>) -> Legend {
    let mut blocks = Vec::new();
    if let Some(coder) = &inputs.coders.color {
        blocks.push(color_block(
            coder.as_ref(),
            inputs.color_flags,
            inputs.color_label,
            inputs.url_prefix,
        ));
    }
    if let Some(coder) = &inputs.coders.size {
        blocks.push(size_block(
            coder.as_ref(),
            inputs.size_flags,
            inputs.size_label,
            inputs.url_prefix,
        ));
    }
    Legend { blocks }
}

pub fn color_block(
    coder: &ColorCoder,
    flags: &CodingFlags,
    label: &str,
    url_prefix: &str,
) -> LegendBlock {
    let entry = |kind: EntryKind, color: String, label: String| LegendEntry {
        kind,
        swatch_url: color_swatch_url(url_prefix, &color),
        swatch: Swatch::Color(color),
        label,
    };

    let gradient = coder.gradient().map(|points| points.to_vec());
    let mut entries = Vec::new();
    if gradient.is_none() {
        for key in &flags.keys {
            entries.push(entry(EntryKind::Key, coder.translate(key), key.clone()));
        }
    }
    for (kind, fallback) in active_fallbacks(flags, [coder.others(), coder.mixed(), coder.missing()]) {
        entries.push(entry(kind, fallback.value.clone(), fallback.label.clone()));
    }

    LegendBlock {
        dimension: Dimension::Color,
        label: heading(label),
        gradient,
        entries,
    }
}

pub fn size_block(
    coder: &SizeCoder,
    flags: &CodingFlags,
    label: &str,
    url_prefix: &str,
) -> LegendBlock {
    let entry = |kind: EntryKind, size: u32, label: String| LegendEntry {
        kind,
        swatch: Swatch::Size(size),
        swatch_url: size_swatch_url(url_prefix, size),
        label,
    };

    let mut entries = Vec::new();
    match coder.gradient() {
        Some(points) => {
            for sample in gradient_samples(points) {
                let key = sample.to_string();
                entries.push(entry(EntryKind::Key, coder.translate(&key), key));
            }
        }
        None => {
            for key in &flags.keys {
                entries.push(entry(EntryKind::Key, coder.translate(key), key.clone()));
            }
        }
    }
    for (kind, fallback) in active_fallbacks(flags, [coder.others(), coder.mixed(), coder.missing()]) {
        entries.push(entry(kind, fallback.value, fallback.label.clone()));
    }

    LegendBlock {
        dimension: Dimension::Size,
        label: heading(label),
        gradient: None,
        entries,
    }
}

/// `floor(v0 + i * (vN - v0) / 10)` for `i` in `0..=10`.
pub fn gradient_samples<V>(points: &[GradientPoint<V>]) -> Vec<i64> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let step = (last.value - first.value) / (SIZE_GRADIENT_SAMPLES - 1) as f64;
    (0..SIZE_GRADIENT_SAMPLES)
        .map(|i| (first.value + step * i as f64).floor() as i64)
        .collect()
}

fn active_fallbacks<'c, V>(
    flags: &CodingFlags,
    [others, mixed, missing]: [&'c Fallback<V>; 3],
) -> Vec<(EntryKind, &'c Fallback<V>)> {
    [
        (flags.others, EntryKind::Others, others),
        (flags.mixed, EntryKind::Mixed, mixed),
        (flags.missing, EntryKind::Missing, missing),
    ]
    .into_iter()
    .filter(|(set, _, _)| *set)
    .map(|(_, kind, fallback)| (kind, fallback))
    .collect()
}

fn heading(label: &str) -> Option<String> {
    (!label.is_empty()).then(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::{gradient_samples, size_block, EntryKind, Swatch};
    use crate::coding::{CodingFlags, GradientPoint, GradientSizeCoder};

    #[test]
    fn samples_eleven_values_across_range() {
        let points = vec![
            GradientPoint {
                value: 0.0,
                coded: 5u32,
            },
            GradientPoint {
                value: 100.0,
                coded: 25u32,
            },
        ];
        assert_eq!(
            gradient_samples(&points),
            vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
    }

    #[test]
    fn narrow_range_keeps_every_sample() {
        let points = vec![
            GradientPoint {
                value: 0.0,
                coded: 5u32,
            },
            GradientPoint {
                value: 2.0,
                coded: 25u32,
            },
        ];
        assert_eq!(
            gradient_samples(&points),
            vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 2]
        );
    }

    #[test]
    fn size_gradient_block_annotates_samples_with_sizes() {
        let coder = GradientSizeCoder::new(vec![
            GradientPoint {
                value: 0.0,
                coded: 10,
            },
            GradientPoint {
                value: 10.0,
                coded: 20,
            },
        ])
        .expect("valid gradient");
        let mut flags = CodingFlags::default();
        flags.missing = true;

        let block = size_block(&coder, &flags, "Population", "p?");
        assert_eq!(block.label.as_deref(), Some("Population"));
        assert_eq!(block.entries_of(EntryKind::Key).count(), 11);
        assert_eq!(block.entries[5].swatch, Swatch::Size(15));
        assert_eq!(block.entries[5].label, "5");
        assert_eq!(block.entries_of(EntryKind::Missing).count(), 1);
        assert_eq!(block.entries.last().map(|entry| entry.kind), Some(EntryKind::Missing));
    }
}
