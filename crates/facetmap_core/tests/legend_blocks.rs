use facetmap_core::coding::{GradientSizeCoder, GradientPoint, KeyedColorCoder};
use facetmap_core::legend::{Dimension, EntryKind, Swatch};
use facetmap_core::{build_legend, Coder, CodingFlags, ResolvedCoders};
use facetmap_core::legend::LegendInputs;
use std::collections::BTreeSet;
use std::rc::Rc;

const PREFIX: &str = "http://painter.test/?";

fn keys(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn keyed_legend_lists_seen_keys_then_raised_fallbacks_once() {
    let color = KeyedColorCoder::new([("red", "#FF0000"), ("blue", "#0000FF"), ("green", "#00FF00")])
        .expect("valid colors");
    let mut color_flags = CodingFlags::default();
    color.translate_set(&keys(&["red"]), &mut color_flags);
    color.translate_set(&keys(&["red", "blue"]), &mut color_flags);
    color.translate_set(&keys(&["blue", "purple"]), &mut color_flags);
    color.translate_set(&keys(&["blue", "red"]), &mut color_flags);

    let coders = ResolvedCoders {
        color: Some(Rc::new(color)),
        size: None,
    };
    let legend = build_legend(&LegendInputs {
        coders: &coders,
        color_flags: &color_flags,
        size_flags: &CodingFlags::default(),
        color_label: "Kind",
        size_label: "",
        url_prefix: PREFIX,
    });

    assert!(legend.block(Dimension::Size).is_none());
    let block = legend.block(Dimension::Color).expect("color block");
    assert_eq!(block.label.as_deref(), Some("Kind"));
    let kinds: Vec<EntryKind> = block.entries.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![EntryKind::Key, EntryKind::Key, EntryKind::Others, EntryKind::Mixed]
    );
    let labels: Vec<&str> = block.entries.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["blue", "red", "Others", "Mixed"]);
    assert_eq!(block.entries[0].swatch, Swatch::Color("#0000FF".to_string()));
    assert!(block.entries[0].swatch_url.starts_with(PREFIX));
    assert!(block.entries[0].swatch_url.ends_with("background=0000FF"));
}

#[test]
fn size_gradient_legend_samples_range_and_reports_missing() {
    let size = GradientSizeCoder::new(vec![
        GradientPoint { value: 0.0, coded: 10 },
        GradientPoint { value: 100.0, coded: 40 },
    ])
    .expect("ascending points");
    let mut size_flags = CodingFlags::default();
    size.translate_set(&BTreeSet::new(), &mut size_flags);

    let coders = ResolvedCoders {
        color: None,
        size: Some(Rc::new(size)),
    };
    let legend = build_legend(&LegendInputs {
        coders: &coders,
        color_flags: &CodingFlags::default(),
        size_flags: &size_flags,
        color_label: "",
        size_label: "",
        url_prefix: PREFIX,
    });

    let block = legend.block(Dimension::Size).expect("size block");
    assert_eq!(block.label, None);
    let samples: Vec<&str> = block
        .entries_of(EntryKind::Key)
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(
        samples,
        vec!["0", "10", "20", "30", "40", "50", "60", "70", "80", "90", "100"]
    );
    assert_eq!(block.entries_of(EntryKind::Missing).count(), 1);
    assert_eq!(block.entries_of(EntryKind::Mixed).count(), 0);
    assert_eq!(block.entries.first().map(|entry| &entry.swatch), Some(&Swatch::Size(10)));
}

#[test]
fn narrow_size_gradient_still_lists_eleven_samples() {
    let size = GradientSizeCoder::new(vec![
        GradientPoint { value: 0.0, coded: 5 },
        GradientPoint { value: 2.0, coded: 25 },
    ])
    .expect("ascending points");
    let coders = ResolvedCoders {
        color: None,
        size: Some(Rc::new(size)),
    };
    let legend = build_legend(&LegendInputs {
        coders: &coders,
        color_flags: &CodingFlags::default(),
        size_flags: &CodingFlags::default(),
        color_label: "",
        size_label: "",
        url_prefix: PREFIX,
    });

    let block = legend.block(Dimension::Size).expect("size block");
    let labels: Vec<&str> = block
        .entries_of(EntryKind::Key)
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, vec!["0", "0", "0", "0", "0", "1", "1", "1", "1", "1", "2"]);
}
