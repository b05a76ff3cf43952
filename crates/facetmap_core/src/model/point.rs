//! Resolved coordinates and bounding boxes.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One plottable location produced for an item during a reconstruction pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub lat: f64,
    pub lng: f64,
    /// Per-point auto-zoom ceiling. `f64::INFINITY` when unset.
    pub max_auto_zoom: f64,
}

impl ResolvedPoint {
    /// Creates a point without an auto-zoom ceiling.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            max_auto_zoom: f64::INFINITY,
        }
    }

    /// Creates a point capped at `max_auto_zoom`.
    pub fn with_max_auto_zoom(lat: f64, lng: f64, max_auto_zoom: f64) -> Self {
        Self {
            lat,
            lng,
            max_auto_zoom,
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Grouping key `"lat,lng"`; two points share a cluster iff keys match.
    ///
    /// Negative zero is folded into zero so equal coordinates share a key.
    pub fn coordinate_key(&self) -> String {
        format!("{},{}", self.lat + 0.0, self.lng + 0.0)
    }
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Degenerate bounds covering exactly one point.
    pub fn from_point(point: LatLng) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}
