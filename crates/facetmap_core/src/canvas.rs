//! Map canvas controller.
//!
//! # Responsibility
//! - Own the map drawing surface and every overlay placed on it.
//! - Track plotted bounds and fit zoom/center after each pass.
//! - Route marker clicks to info windows listing cluster members.
//!
//! # Invariants
//! - Only the controller mutates the surface.
//! - Auto-zoom/auto-center never override a configured zoom/center.
//! - Auto-zoom never drops below zero.

use crate::config::{ControlSize, MapType, ViewSettings};
use crate::marker::MarkerIconDescriptor;
use crate::model::cluster::{ItemId, LocationCluster};
use crate::model::point::{LatLng, LatLngBounds};
use crate::store::Database;
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// Identifier of one overlay placed on the surface.
pub type OverlayId = Uuid;

/// Widgets a surface can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapControl {
    SmallZoom,
    LargeZoom,
    Overview,
    Scale,
    MapType,
}

/// One marker overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOverlay {
    pub position: LatLng,
    pub icon: MarkerIconDescriptor,
}

/// One cluster member listed in an info window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub item: ItemId,
    pub label: String,
}

/// Info window content: the clicked cluster's members in visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoWindow {
    pub entries: Vec<InfoEntry>,
}

/// Map-rendering provider.
pub trait MapSurface {
    fn set_height(&mut self, pixels: u32);
    fn set_center(&mut self, center: LatLng);
    fn set_zoom(&mut self, zoom: f64);
    fn set_map_type(&mut self, map_type: MapType);
    fn add_control(&mut self, control: MapControl);
    fn add_overlay(&mut self, id: OverlayId, overlay: MarkerOverlay);
    fn clear_overlays(&mut self);
    /// Highest zoom level at which `bounds` is fully visible.
    fn bounds_zoom_level(&self, bounds: &LatLngBounds) -> f64;
    fn open_info_window(&mut self, anchor: OverlayId, window: InfoWindow);
    /// Releases provider resources; the surface is not used afterwards.
    fn unload(&mut self);
}

/// Framing applied at the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoFrame {
    pub zoom: Option<f64>,
    pub center: Option<LatLng>,
}

/// `max(0, min(fit - 1, point ceiling, configured ceiling))`.
pub fn auto_zoom(fit_zoom: f64, point_ceiling: f64, configured_ceiling: Option<f64>) -> f64 {
    (fit_zoom - 1.0)
        .min(point_ceiling)
        .min(configured_ceiling.unwrap_or(f64::INFINITY))
        .max(0.0)
}

pub struct MapCanvas<S: MapSurface> {
    surface: S,
    members: HashMap<OverlayId, Vec<ItemId>>,
    bounds: Option<LatLngBounds>,
    min_point_ceiling: f64,
}

impl<S: MapSurface> MapCanvas<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            members: HashMap::new(),
            bounds: None,
            min_point_ceiling: f64::INFINITY,
        }
    }

    /// Applies size, controls, map type and the initial frame.
    pub fn initialize(&mut self, settings: &ViewSettings) {
        self.surface.set_height(settings.map_height);
        self.surface.set_center(settings.initial_center());
        self.surface.set_zoom(settings.initial_zoom());
        self.surface.add_control(match settings.size {
            ControlSize::Small => MapControl::SmallZoom,
            ControlSize::Large => MapControl::LargeZoom,
        });
        if settings.overview_control {
            self.surface.add_control(MapControl::Overview);
        }
        if settings.scale_control {
            self.surface.add_control(MapControl::Scale);
        }
        self.surface.add_control(MapControl::MapType);
        self.surface.set_map_type(settings.map_type);
    }

    /// Removes every overlay and forgets the previous pass.
    pub fn clear(&mut self) {
        self.surface.clear_overlays();
        self.members.clear();
        self.bounds = None;
        self.min_point_ceiling = f64::INFINITY;
    }

    /// Adds a cluster's marker and folds its point into the pass bounds.
    pub fn place_marker(
        &mut self,
        cluster: &LocationCluster,
        icon: MarkerIconDescriptor,
    ) -> OverlayId {
        let position = cluster.point.lat_lng();
        match self.bounds.as_mut() {
            Some(bounds) => bounds.extend(position),
            None => self.bounds = Some(LatLngBounds::from_point(position)),
        }
        self.min_point_ceiling = self.min_point_ceiling.min(cluster.point.max_auto_zoom);

        let id = Uuid::new_v4();
        self.members.insert(id, cluster.items.clone());
        self.surface.add_overlay(id, MarkerOverlay { position, icon });
        id
    }

    /// Fits zoom and center to the pass bounds where not configured.
    pub fn fit_to_bounds(&mut self, settings: &ViewSettings) -> AutoFrame {
        let Some(bounds) = self.bounds else {
            return AutoFrame {
                zoom: None,
                center: None,
            };
        };

        let zoom = settings.zoom.is_none().then(|| {
            let fit = self.surface.bounds_zoom_level(&bounds);
            auto_zoom(fit, self.min_point_ceiling, settings.max_auto_zoom)
        });
        if let Some(zoom) = zoom {
            self.surface.set_zoom(zoom);
        }

        let center = settings.center.is_none().then(|| bounds.center());
        if let Some(center) = center {
            self.surface.set_center(center);
        }

        debug!(
            "event=canvas_fit module=canvas status=ok auto_zoom={} auto_center={}",
            zoom.is_some(),
            center.is_some()
        );
        AutoFrame { zoom, center }
    }

    /// Opens the info window of a clicked marker; `false` for unknown ids.
    ///
    /// Members whose label cannot be read are listed under their id.
    pub fn handle_marker_click(&mut self, overlay: OverlayId, db: &dyn Database) -> bool {
        let Some(items) = self.members.get(&overlay) else {
            return false;
        };
        let entries = items
            .iter()
            .map(|item| {
                let label = db.label(item).unwrap_or_else(|err| {
                    warn!(
                        "event=canvas_info_window module=canvas status=error error_code=label_lookup_failed error={err}"
                    );
                    item.clone()
                });
                InfoEntry {
                    item: item.clone(),
                    label,
                }
            })
            .collect();
        self.surface
            .open_info_window(overlay, InfoWindow { entries });
        true
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds
    }

    pub fn overlay_count(&self) -> usize {
        self.members.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Unloads the surface and hands it back to the host.
    pub fn release(mut self) -> S {
        self.members.clear();
        self.surface.unload();
        self.surface
    }
}
