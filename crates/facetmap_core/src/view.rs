//! Map view lifecycle.
//!
//! # Responsibility
//! - Wire configuration, coders and collaborators into one map view.
//! - Run reconstruction passes: aggregate, draw markers, legend, framing.
//! - Track collection changes through a `ChangeSignal` subscription.
//!
//! # Invariants
//! - Passes never overlap; every pass starts from a cleared canvas.
//! - `plotted + unplottable` equals the restricted count of each pass.
//! - `dispose` consumes the view and detaches its collection listener.

use crate::accessor::{Accessors, LatLngBinding};
use crate::aggregate::{aggregate, Aggregation};
use crate::canvas::{AutoFrame, MapCanvas, MapSurface, OverlayId};
use crate::coding::{Coder, CoderRegistry, CodingFlags, ResolvedCoders};
use crate::collection::{ChangeSignal, Collection, SubscriptionId};
use crate::config::{ConfigResult, MapViewConfig, ViewSettings};
use crate::legend::{build_legend, Legend, LegendInputs};
use crate::marker::{make_icon, MarkerGeometry, MarkerIconDescriptor, MarkerRequest};
use crate::model::cluster::{ItemId, LocationCluster};
use crate::store::Database;
use log::{info, warn};
use std::rc::Rc;

/// UI around the map: legend area and status line.
pub trait ViewChrome {
    fn clear_legend(&mut self);
    fn show_legend(&mut self, legend: &Legend);
    /// Reports how many items were in scope and which could not be placed.
    fn show_plot_summary(&mut self, restricted: usize, unplottable: &[ItemId]);
    fn dispose(&mut self);
}

/// Outcome of one reconstruction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructReport {
    pub restricted: usize,
    pub clusters: usize,
    pub plotted: usize,
    pub unplottable: Vec<ItemId>,
    pub frame: AutoFrame,
}

pub struct MapView<S: MapSurface, C: ViewChrome> {
    settings: ViewSettings,
    accessors: Accessors,
    coders: ResolvedCoders,
    geometry: MarkerGeometry,
    canvas: MapCanvas<S>,
    chrome: C,
    signal: ChangeSignal,
    subscription: SubscriptionId,
}

impl<S: MapSurface, C: ViewChrome> MapView<S, C> {
    /// Builds the view, subscribes to `collection` and runs the first pass.
    pub fn create(
        config: MapViewConfig,
        registry: &CoderRegistry,
        surface: S,
        chrome: C,
        collection: &mut dyn Collection,
        db: &dyn Database,
    ) -> ConfigResult<Self> {
        config.settings.validate()?;
        let MapViewConfig {
            settings,
            accessors,
        } = config;

        let accessors = Accessors::from_config(&accessors);
        let coders = ResolvedCoders::resolve(&accessors, &settings, registry);
        let geometry = MarkerGeometry::from_settings(&settings);
        let binding = match accessors.coordinates.binding() {
            LatLngBinding::Pair { .. } => "pair",
            LatLngBinding::Split { .. } => "split",
        };
        info!(
            "event=view_create module=view status=ok binding={} color_coding={} size_coding={}",
            binding,
            coders.color.is_some(),
            coders.size.is_some()
        );

        let mut canvas = MapCanvas::new(surface);
        canvas.initialize(&settings);

        let signal = ChangeSignal::new();
        let subscription = collection.add_listener(Rc::new(signal.clone()));

        let mut view = Self {
            settings,
            accessors,
            coders,
            geometry,
            canvas,
            chrome,
            signal,
            subscription,
        };
        view.reconstruct(collection, db);
        Ok(view)
    }

    /// Redraws everything from the current restricted item set.
    pub fn reconstruct(&mut self, collection: &dyn Collection, db: &dyn Database) -> ReconstructReport {
        self.canvas.clear();
        self.chrome.clear_legend();

        let restricted = collection.count_restricted();
        let mut aggregation = Aggregation::default();
        let mut frame = AutoFrame {
            zoom: None,
            center: None,
        };

        if restricted > 0 {
            aggregation = aggregate(collection, db, &self.accessors);

            let mut color_flags = CodingFlags::default();
            let mut size_flags = CodingFlags::default();
            for cluster in &aggregation.clusters {
                let icon = self.cluster_icon(cluster, db, &mut color_flags, &mut size_flags);
                self.canvas.place_marker(cluster, icon);
            }

            let legend = build_legend(&LegendInputs {
                coders: &self.coders,
                color_flags: &color_flags,
                size_flags: &size_flags,
                color_label: &self.settings.color_legend_label,
                size_label: &self.settings.size_legend_label,
                url_prefix: &self.geometry.url_prefix,
            });
            if !legend.is_empty() {
                self.chrome.show_legend(&legend);
            }

            frame = self.canvas.fit_to_bounds(&self.settings);
        }

        self.chrome
            .show_plot_summary(restricted, &aggregation.unplottable);

        info!(
            "event=view_reconstruct module=view status=ok restricted={} clusters={} plotted={} unplottable={}",
            restricted,
            aggregation.clusters.len(),
            aggregation.plotted,
            aggregation.unplottable.len()
        );

        ReconstructReport {
            restricted,
            clusters: aggregation.clusters.len(),
            plotted: aggregation.plotted,
            unplottable: aggregation.unplottable,
            frame,
        }
    }

    /// Reconstructs when the collection changed since the last pass.
    pub fn sync(&mut self, collection: &dyn Collection, db: &dyn Database) -> Option<ReconstructReport> {
        if self.signal.take() {
            Some(self.reconstruct(collection, db))
        } else {
            None
        }
    }

    /// Whether a collection change is waiting for `sync`.
    pub fn is_stale(&self) -> bool {
        self.signal.is_raised()
    }

    /// Lists the clicked cluster's members by label in an info window.
    pub fn handle_marker_click(&mut self, overlay: OverlayId, db: &dyn Database) -> bool {
        self.canvas.handle_marker_click(overlay, db)
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn canvas(&self) -> &MapCanvas<S> {
        &self.canvas
    }

    pub fn chrome(&self) -> &C {
        &self.chrome
    }

    /// Detaches from `collection` and releases chrome and surface.
    pub fn dispose(mut self, collection: &mut dyn Collection) -> (S, C) {
        let detached = collection.remove_listener(self.subscription);
        self.chrome.dispose();
        let surface = self.canvas.release();
        info!("event=view_dispose module=view status=ok listener_detached={detached}");
        (surface, self.chrome)
    }

    fn cluster_icon(
        &self,
        cluster: &LocationCluster,
        db: &dyn Database,
        color_flags: &mut CodingFlags,
        size_flags: &mut CodingFlags,
    ) -> MarkerIconDescriptor {
        let color = match (&self.coders.color, &cluster.color_keys) {
            (Some(coder), Some(keys)) => coder.translate_set(keys, color_flags),
            _ => self.settings.color.clone(),
        };
        let icon_size = match (&self.coders.size, &cluster.size_keys) {
            (Some(coder), Some(keys)) => coder.translate_set(keys, size_flags),
            _ => self.settings.icon_size,
        };
        let icon_url = self.single_item_icon(cluster, db);
        let label = cluster.label();

        make_icon(
            &MarkerRequest {
                shape: &self.settings.shape,
                color: &color,
                icon_size,
                label: &label,
                icon_url: icon_url.as_deref(),
            },
            &self.geometry,
        )
    }

    fn single_item_icon(&self, cluster: &LocationCluster, db: &dyn Database) -> Option<String> {
        let accessor = self.accessors.icon.as_ref()?;
        let [item] = cluster.items.as_slice() else {
            return None;
        };
        match accessor.last(item, db) {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    "event=view_icon module=view status=error error_code=icon_lookup_failed error={err}"
                );
                None
            }
        }
    }
}
