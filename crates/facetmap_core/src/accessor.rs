//! Item value accessors.
//!
//! # Responsibility
//! - Resolve items to coordinate points through an optional proxy attribute.
//! - Read color/size keys and icon URLs for items.
//!
//! # Invariants
//! - The coordinate binding shape is chosen once, at configuration time.
//! - Values that do not parse as finite coordinates are skipped silently.
//! - Proxy resolution defaults to the item itself.

use crate::config::AccessorConfig;
use crate::model::cluster::ItemId;
use crate::model::point::ResolvedPoint;
use crate::store::{Database, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const DEFAULT_LATLNG_PROPERTY: &str = "latlng";

static LATLNG_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*,\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$",
    )
    .expect("valid latlng regex")
});

/// How a proxy's coordinates are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatLngBinding {
    /// One attribute holding `"lat,lng"` text values.
    Pair { latlng: String },
    /// Two scalar attributes, zipped value by value.
    Split { lat: String, lng: String },
}

impl LatLngBinding {
    /// `latlng` wins over `lat`+`lng`; with neither, `latlng` is assumed.
    pub fn from_config(config: &AccessorConfig) -> Self {
        if let Some(latlng) = &config.latlng {
            return Self::Pair {
                latlng: latlng.clone(),
            };
        }
        match (&config.lat, &config.lng) {
            (Some(lat), Some(lng)) => Self::Split {
                lat: lat.clone(),
                lng: lng.clone(),
            },
            _ => Self::Pair {
                latlng: DEFAULT_LATLNG_PROPERTY.to_string(),
            },
        }
    }
}

/// Composes item → proxy → point resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateResolver {
    proxy: Option<String>,
    binding: LatLngBinding,
    max_auto_zoom: Option<String>,
}

impl CoordinateResolver {
    pub fn new(proxy: Option<String>, binding: LatLngBinding, max_auto_zoom: Option<String>) -> Self {
        Self {
            proxy,
            binding,
            max_auto_zoom,
        }
    }

    pub fn from_config(config: &AccessorConfig) -> Self {
        Self::new(
            config.proxy.clone(),
            LatLngBinding::from_config(config),
            config.max_auto_zoom.clone(),
        )
    }

    pub fn binding(&self) -> &LatLngBinding {
        &self.binding
    }

    /// Resolves every point of `item`; an empty result means unplottable.
    pub fn resolve(&self, item: &ItemId, db: &dyn Database) -> StoreResult<Vec<ResolvedPoint>> {
        let proxies = match &self.proxy {
            Some(property) => db.attribute_values(item, property)?,
            None => vec![item.clone()],
        };

        let mut points = Vec::new();
        for proxy in &proxies {
            self.resolve_proxy(proxy, db, &mut points)?;
        }
        Ok(points)
    }

    fn resolve_proxy(
        &self,
        proxy: &ItemId,
        db: &dyn Database,
        out: &mut Vec<ResolvedPoint>,
    ) -> StoreResult<()> {
        let ceiling = match &self.max_auto_zoom {
            Some(property) => db
                .attribute_values(proxy, property)?
                .iter()
                .find_map(|value| parse_finite(value))
                .unwrap_or(f64::INFINITY),
            None => f64::INFINITY,
        };

        match &self.binding {
            LatLngBinding::Pair { latlng } => {
                for value in db.attribute_values(proxy, latlng)? {
                    if let Some((lat, lng)) = parse_lat_lng_pair(&value) {
                        out.push(ResolvedPoint::with_max_auto_zoom(lat, lng, ceiling));
                    }
                }
            }
            LatLngBinding::Split { lat, lng } => {
                let lats = db.attribute_values(proxy, lat)?;
                let lngs = db.attribute_values(proxy, lng)?;
                for (lat, lng) in lats.iter().zip(lngs.iter()) {
                    if let (Some(lat), Some(lng)) = (parse_finite(lat), parse_finite(lng)) {
                        out.push(ResolvedPoint::with_max_auto_zoom(lat, lng, ceiling));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Reads one text attribute of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAccessor {
    property: String,
}

impl KeyAccessor {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }

    pub fn property(&self) -> &str {
        self.property.as_str()
    }

    /// Distinct values of the attribute.
    pub fn keys(&self, item: &ItemId, db: &dyn Database) -> StoreResult<BTreeSet<String>> {
        Ok(db.attribute_values(item, &self.property)?.into_iter().collect())
    }

    /// Last value of the attribute, mirroring "last visited wins".
    pub fn last(&self, item: &ItemId, db: &dyn Database) -> StoreResult<Option<String>> {
        Ok(db.attribute_values(item, &self.property)?.pop())
    }
}

/// All accessors a map view reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessors {
    pub coordinates: CoordinateResolver,
    pub color_key: Option<KeyAccessor>,
    pub size_key: Option<KeyAccessor>,
    pub icon: Option<KeyAccessor>,
}

impl Accessors {
    /// Builds accessors; `colorKey` takes precedence over legacy `marker`.
    pub fn from_config(config: &AccessorConfig) -> Self {
        let color_key = config
            .color_key
            .as_ref()
            .or(config.marker.as_ref())
            .map(KeyAccessor::new);
        Self {
            coordinates: CoordinateResolver::from_config(config),
            color_key,
            size_key: config.size_key.as_ref().map(KeyAccessor::new),
            icon: config.icon.as_ref().map(KeyAccessor::new),
        }
    }
}

/// Parses `"lat,lng"` text into finite coordinates.
pub fn parse_lat_lng_pair(value: &str) -> Option<(f64, f64)> {
    let captures = LATLNG_PAIR_RE.captures(value)?;
    let lat = parse_finite(captures.get(1)?.as_str())?;
    let lng = parse_finite(captures.get(2)?.as_str())?;
    Some((lat, lng))
}

fn parse_finite(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{parse_lat_lng_pair, Accessors, CoordinateResolver, LatLngBinding};
    use crate::config::AccessorConfig;
    use crate::store::{open_store_in_memory, SqliteItemStore};

    #[test]
    fn parses_lat_lng_pairs() {
        assert_eq!(parse_lat_lng_pair("42.36,-71.09"), Some((42.36, -71.09)));
        assert_eq!(parse_lat_lng_pair(" 10 , 20 "), Some((10.0, 20.0)));
        assert_eq!(parse_lat_lng_pair("1e1,.5"), Some((10.0, 0.5)));
        assert_eq!(parse_lat_lng_pair("north,south"), None);
        assert_eq!(parse_lat_lng_pair("10"), None);
        assert_eq!(parse_lat_lng_pair("10,20,30"), None);
    }

    #[test]
    fn binding_selection_prefers_pair_then_split() {
        let mut config = AccessorConfig::default();
        assert_eq!(
            LatLngBinding::from_config(&config),
            LatLngBinding::Pair {
                latlng: "latlng".to_string()
            }
        );

        config.lat = Some("latitude".to_string());
        assert!(matches!(
            LatLngBinding::from_config(&config),
            LatLngBinding::Pair { .. }
        ));

        config.lng = Some("longitude".to_string());
        assert_eq!(
            LatLngBinding::from_config(&config),
            LatLngBinding::Split {
                lat: "latitude".to_string(),
                lng: "longitude".to_string()
            }
        );

        config.latlng = Some("where".to_string());
        assert_eq!(
            LatLngBinding::from_config(&config),
            LatLngBinding::Pair {
                latlng: "where".to_string()
            }
        );
    }

    #[test]
    fn resolves_through_proxy_with_ceiling() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("talk", None).expect("insert");
        store.insert_item("venue-a", None).expect("insert");
        store.insert_item("venue-b", None).expect("insert");
        store.add_value("talk", "venue", "venue-a").expect("value");
        store.add_value("talk", "venue", "venue-b").expect("value");
        store.add_value("venue-a", "latlng", "1,2").expect("value");
        store.add_value("venue-a", "zoomCap", "7").expect("value");
        store.add_value("venue-b", "latlng", "3,4").expect("value");

        let resolver = CoordinateResolver::new(
            Some("venue".to_string()),
            LatLngBinding::Pair {
                latlng: "latlng".to_string(),
            },
            Some("zoomCap".to_string()),
        );
        let points = resolver
            .resolve(&"talk".to_string(), &store)
            .expect("resolve");

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].coordinate_key(), "1,2");
        assert_eq!(points[0].max_auto_zoom, 7.0);
        assert_eq!(points[1].coordinate_key(), "3,4");
        assert!(points[1].max_auto_zoom.is_infinite());
    }

    #[test]
    fn split_binding_skips_unparseable_values() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("a", None).expect("insert");
        store.add_value("a", "lat", "10").expect("value");
        store.add_value("a", "lng", "20").expect("value");
        store.add_value("a", "lat", "bogus").expect("value");
        store.add_value("a", "lng", "30").expect("value");

        let config = AccessorConfig {
            lat: Some("lat".to_string()),
            lng: Some("lng".to_string()),
            ..AccessorConfig::default()
        };
        let points = CoordinateResolver::from_config(&config)
            .resolve(&"a".to_string(), &store)
            .expect("resolve");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].coordinate_key(), "10,20");
    }

    #[test]
    fn color_key_prefers_new_name_over_legacy_marker() {
        let config = AccessorConfig {
            marker: Some("legacy".to_string()),
            color_key: Some("kind".to_string()),
            ..AccessorConfig::default()
        };
        let accessors = Accessors::from_config(&config);
        assert_eq!(
            accessors.color_key.as_ref().map(|accessor| accessor.property()),
            Some("kind")
        );
        assert!(accessors.size_key.is_none());
        assert!(accessors.icon.is_none());

        let legacy = Accessors::from_config(&AccessorConfig {
            marker: Some("legacy".to_string()),
            ..AccessorConfig::default()
        });
        assert_eq!(
            legacy.color_key.as_ref().map(|accessor| accessor.property()),
            Some("legacy")
        );
    }
}
