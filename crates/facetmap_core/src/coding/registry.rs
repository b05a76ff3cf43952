//! Named coder lookup and per-view coder resolution.
//!
//! # Invariants
//! - A view with a color accessor always ends up with a color coder.
//! - A view with a size accessor only gets size coding when the referenced
//!   size coder exists.

use super::color::CoderError;
use super::{
    ColorCoder, DefaultColorCoder, GradientColorCoder, GradientPoint, GradientSizeCoder,
    KeyedColorCoder, KeyedSizeCoder, SizeCoder,
};
use crate::accessor::Accessors;
use crate::config::ViewSettings;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Fallback override in a coder definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackDefinition<V> {
    pub value: V,
    pub label: String,
}

/// Declarative coder, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CoderDefinition {
    Color {
        entries: BTreeMap<String, String>,
        #[serde(default)]
        others: Option<FallbackDefinition<String>>,
        #[serde(default)]
        mixed: Option<FallbackDefinition<String>>,
        #[serde(default)]
        missing: Option<FallbackDefinition<String>>,
    },
    ColorGradient {
        points: Vec<ColorStop>,
    },
    Size {
        entries: BTreeMap<String, u32>,
        #[serde(default)]
        others: Option<FallbackDefinition<u32>>,
        #[serde(default)]
        mixed: Option<FallbackDefinition<u32>>,
        #[serde(default)]
        missing: Option<FallbackDefinition<u32>>,
    },
    SizeGradient {
        points: Vec<SizeStop>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeStop {
    pub value: f64,
    pub size: u32,
}

/// Coders addressable by component id (`colorCoder` / `sizeCoder` settings).
#[derive(Default)]
pub struct CoderRegistry {
    color: BTreeMap<String, Rc<ColorCoder>>,
    size: BTreeMap<String, Rc<SizeCoder>>,
}

impl CoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every definition; fails on the first invalid one.
    pub fn from_definitions(
        definitions: BTreeMap<String, CoderDefinition>,
    ) -> Result<Self, CoderError> {
        let mut registry = Self::new();
        for (id, definition) in definitions {
            registry.register_definition(id, definition)?;
        }
        Ok(registry)
    }

    pub fn register_definition(
        &mut self,
        id: impl Into<String>,
        definition: CoderDefinition,
    ) -> Result<(), CoderError> {
        let id = id.into();
        match definition {
            CoderDefinition::Color {
                entries,
                others,
                mixed,
                missing,
            } => {
                let mut coder = KeyedColorCoder::new(entries)?;
                if let Some(fallback) = others {
                    coder = coder.with_others(&fallback.value, &fallback.label)?;
                }
                if let Some(fallback) = mixed {
                    coder = coder.with_mixed(&fallback.value, &fallback.label)?;
                }
                if let Some(fallback) = missing {
                    coder = coder.with_missing(&fallback.value, &fallback.label)?;
                }
                self.register_color(id, Rc::new(coder));
            }
            CoderDefinition::ColorGradient { points } => {
                let points = points
                    .into_iter()
                    .map(|stop| GradientPoint {
                        value: stop.value,
                        coded: stop.color,
                    })
                    .collect();
                self.register_color(id, Rc::new(GradientColorCoder::new(points)?));
            }
            CoderDefinition::Size {
                entries,
                others,
                mixed,
                missing,
            } => {
                let mut coder = KeyedSizeCoder::new(entries);
                if let Some(fallback) = others {
                    coder = coder.with_others(fallback.value, &fallback.label);
                }
                if let Some(fallback) = mixed {
                    coder = coder.with_mixed(fallback.value, &fallback.label);
                }
                if let Some(fallback) = missing {
                    coder = coder.with_missing(fallback.value, &fallback.label);
                }
                self.register_size(id, Rc::new(coder));
            }
            CoderDefinition::SizeGradient { points } => {
                let points = points
                    .into_iter()
                    .map(|stop| GradientPoint {
                        value: stop.value,
                        coded: stop.size,
                    })
                    .collect();
                self.register_size(id, Rc::new(GradientSizeCoder::new(points)?));
            }
        }
        Ok(())
    }

    pub fn register_color(&mut self, id: impl Into<String>, coder: Rc<ColorCoder>) {
        self.color.insert(id.into(), coder);
    }

    pub fn register_size(&mut self, id: impl Into<String>, coder: Rc<SizeCoder>) {
        self.size.insert(id.into(), coder);
    }

    pub fn color(&self, id: &str) -> Option<Rc<ColorCoder>> {
        self.color.get(id.trim()).cloned()
    }

    pub fn size(&self, id: &str) -> Option<Rc<SizeCoder>> {
        self.size.get(id.trim()).cloned()
    }
}

/// Coders active for one view.
#[derive(Clone, Default)]
pub struct ResolvedCoders {
    pub color: Option<Rc<ColorCoder>>,
    pub size: Option<Rc<SizeCoder>>,
}

impl ResolvedCoders {
    /// Picks coders for the configured accessors.
    ///
    /// An unresolvable color reference falls back to `DefaultColorCoder`;
    /// an unresolvable size reference disables size coding.
    pub fn resolve(
        accessors: &Accessors,
        settings: &ViewSettings,
        registry: &CoderRegistry,
    ) -> Self {
        let color = accessors.color_key.as_ref().map(|_| {
            match settings.color_coder.as_deref().map(|id| (id, registry.color(id))) {
                Some((_, Some(coder))) => {
                    info!("event=coder_resolve module=coding status=ok dimension=color source=registry");
                    coder
                }
                Some((id, None)) => {
                    warn!(
                        "event=coder_resolve module=coding status=fallback dimension=color reason=unknown_coder coder_id={id}"
                    );
                    Rc::new(DefaultColorCoder::new()) as Rc<ColorCoder>
                }
                None => Rc::new(DefaultColorCoder::new()) as Rc<ColorCoder>,
            }
        });

        let size = accessors.size_key.as_ref().and_then(|_| {
            let Some(id) = settings.size_coder.as_deref() else {
                warn!("event=coder_resolve module=coding status=disabled dimension=size reason=no_coder");
                return None;
            };
            let coder = registry.size(id);
            if coder.is_none() {
                warn!(
                    "event=coder_resolve module=coding status=disabled dimension=size reason=unknown_coder coder_id={id}"
                );
            }
            coder
        });

        Self { color, size }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoderDefinition, CoderRegistry, ResolvedCoders};
    use crate::accessor::Accessors;
    use crate::coding::Coder;
    use crate::config::{AccessorConfig, ViewSettings};
    use std::collections::BTreeMap;

    fn accessors(color: bool, size: bool) -> Accessors {
        Accessors::from_config(&AccessorConfig {
            color_key: color.then(|| "kind".to_string()),
            size_key: size.then(|| "population".to_string()),
            ..AccessorConfig::default()
        })
    }

    #[test]
    fn builds_registry_from_json_definitions() {
        let definitions: BTreeMap<String, CoderDefinition> = serde_json::from_str(
            r##"{
                "kinds": { "kind": "color", "entries": { "museum": "#FF0000" },
                           "others": { "value": "#123456", "label": "Other kinds" } },
                "heat": { "kind": "colorGradient", "points": [
                    { "value": 0, "color": "#000000" }, { "value": 1, "color": "#FFFFFF" } ] },
                "pop": { "kind": "sizeGradient", "points": [
                    { "value": 0, "size": 8 }, { "value": 100, "size": 40 } ] }
            }"##,
        )
        .expect("definitions should parse");

        let registry = CoderRegistry::from_definitions(definitions).expect("registry");
        let kinds = registry.color("kinds").expect("kinds coder");
        assert_eq!(kinds.translate("museum"), "#FF0000");
        assert_eq!(kinds.others().label, "Other kinds");
        assert!(registry.color("heat").and_then(|c| c.gradient().map(|g| g.len())) == Some(2));
        assert_eq!(registry.size("pop").map(|coder| coder.translate("50")), Some(24));
        assert!(registry.size("kinds").is_none());
    }

    #[test]
    fn missing_color_coder_falls_back_to_default() {
        let mut settings = ViewSettings::default();
        settings.color_coder = Some("nope".to_string());
        let coders = ResolvedCoders::resolve(&accessors(true, false), &settings, &CoderRegistry::new());
        let color = coders.color.expect("default color coder");
        assert_eq!(color.translate("first"), "#FF9000");
        assert!(coders.size.is_none());
    }

    #[test]
    fn missing_size_coder_disables_size_coding() {
        let mut settings = ViewSettings::default();
        settings.size_coder = Some("absent".to_string());
        let coders = ResolvedCoders::resolve(&accessors(false, true), &settings, &CoderRegistry::new());
        assert!(coders.color.is_none());
        assert!(coders.size.is_none());
    }
}
