//! Map view core for faceted item browsing.
//! Turns a filtered item collection into clustered, coded map markers.

pub mod accessor;
pub mod aggregate;
pub mod canvas;
pub mod coding;
pub mod collection;
pub mod config;
pub mod geocode;
pub mod legend;
pub mod logging;
pub mod marker;
pub mod model;
pub mod store;
pub mod view;

pub use accessor::{Accessors, CoordinateResolver, KeyAccessor, LatLngBinding};
pub use aggregate::{aggregate, Aggregation};
pub use canvas::{auto_zoom, AutoFrame, MapCanvas, MapControl, MapSurface, OverlayId};
pub use coding::{Coder, CoderRegistry, CodingFlags, ResolvedCoders};
pub use collection::{ChangeSignal, Collection, CollectionListener, ItemCollection};
pub use config::{ConfigError, ConfigResult, MapViewConfig, ViewSettings};
pub use geocode::{lookup_lat_lng, GeocodeError, Geocoder, HttpGeocoder, Placemark};
pub use legend::{build_legend, Legend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use marker::{make_icon, MarkerGeometry, MarkerIconDescriptor, MarkerRequest};
pub use model::cluster::{ItemId, LocationCluster};
pub use model::point::{LatLng, LatLngBounds, ResolvedPoint};
pub use store::{open_store, open_store_in_memory, Database, SqliteItemStore, StoreError, StoreResult};
pub use view::{MapView, ReconstructReport, ViewChrome};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
