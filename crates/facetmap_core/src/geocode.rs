//! Batch address geocoding.
//!
//! # Responsibility
//! - Resolve item addresses to coordinates one request at a time.
//! - Render results as record lines ready to merge back into item data.
//!
//! # Invariants
//! - Requests are strictly sequential in queue order.
//! - A rejected address is retried without its first comma segment,
//!   ahead of every other pending job.
//! - Output keeps one record per job in completion order.

use crate::model::cluster::ItemId;
use crate::store::Database;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Minimum placemark accuracy accepted by default.
pub const DEFAULT_ACCURACY: u8 = 4;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type GeocodeResult<T> = Result<T, GeocodeError>;

/// One geocoder candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placemark {
    /// Provider precision level; higher is more precise.
    pub accuracy: u8,
    pub lat: f64,
    pub lng: f64,
}

/// Address lookup provider.
pub trait Geocoder {
    fn locate(&self, address: &str) -> GeocodeResult<Vec<Placemark>>;
}

#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    Status(u16),
    Parse(serde_json::Error),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "geocoder request failed: {err}"),
            Self::Status(code) => write!(f, "geocoder responded with status {code}"),
            Self::Parse(err) => write!(f, "geocoder response is not valid JSON: {err}"),
        }
    }
}

impl std::error::Error for GeocodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Geocodes the `address_property` of every item and renders one record
/// per item under `output_property`.
///
/// Items without an address are skipped. Failed lookups render a record
/// carrying only the item id.
pub fn lookup_lat_lng(
    items: &[ItemId],
    address_property: &str,
    output_property: &str,
    db: &dyn Database,
    geocoder: &dyn Geocoder,
    accuracy: Option<u8>,
) -> String {
    let threshold = accuracy.unwrap_or(DEFAULT_ACCURACY);

    let mut queue: VecDeque<(ItemId, String)> = VecDeque::new();
    for item in items {
        match db.attribute_values(item, address_property) {
            Ok(values) => {
                if let Some(address) = values.into_iter().find(|value| !value.trim().is_empty()) {
                    queue.push_back((item.clone(), address));
                }
            }
            Err(err) => warn!(
                "event=geocode_job module=geocode status=error error_code=address_lookup_failed error={err}"
            ),
        }
    }
    info!(
        "event=geocode_lookup module=geocode status=start jobs={} threshold={}",
        queue.len(),
        threshold
    );

    let mut records = Vec::new();
    let mut retries = 0usize;
    while let Some((item, address)) = queue.pop_front() {
        if let Some(best) = best_candidate(geocoder, &address, threshold) {
            records.push(format!(
                "\t{{ id: '{item}', {output_property}: '{},{}' }}",
                best.lat, best.lng
            ));
            continue;
        }

        match broaden_address(&address) {
            Some(broader) => {
                retries += 1;
                queue.push_front((item, broader));
            }
            None => records.push(format!("\t{{ id: '{item}' }}")),
        }
    }

    info!(
        "event=geocode_lookup module=geocode status=ok records={} retries={}",
        records.len(),
        retries
    );
    records.join(",\n")
}

fn best_candidate(geocoder: &dyn Geocoder, address: &str, threshold: u8) -> Option<Placemark> {
    let mut candidates = match geocoder.locate(address) {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!("event=geocode_request module=geocode status=error error={err}");
            return None;
        }
    };
    candidates.sort_by(|a, b| b.accuracy.cmp(&a.accuracy));
    let best = candidates.into_iter().next()?;
    debug!(
        "event=geocode_request module=geocode status=ok best_accuracy={}",
        best.accuracy
    );
    (best.accuracy >= threshold).then_some(best)
}

/// Drops the first comma segment; `None` for a single segment.
fn broaden_address(address: &str) -> Option<String> {
    let (_, rest) = address.split_once(',')?;
    Some(rest.trim_start().to_string())
}

/// JSON geocoding endpoint answering `{"Placemark":[...]}` documents.
pub struct HttpGeocoder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGeocoder {
    pub fn new(endpoint: impl Into<String>) -> GeocodeResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl Geocoder for HttpGeocoder {
    fn locate(&self, address: &str) -> GeocodeResult<Vec<Placemark>> {
        let mut query = vec![("q", address), ("output", "json")];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("key", key));
        }

        let response = self.client.get(&self.endpoint).query(&query).send()?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }
        let body = response.text()?;
        parse_placemarks(&body)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(rename = "Placemark", default)]
    placemarks: Vec<RawPlacemark>,
}

#[derive(Deserialize)]
struct RawPlacemark {
    #[serde(rename = "AddressDetails", default)]
    details: RawAddressDetails,
    #[serde(rename = "Point")]
    point: RawPoint,
}

#[derive(Deserialize, Default)]
struct RawAddressDetails {
    #[serde(rename = "Accuracy", default)]
    accuracy: u8,
}

#[derive(Deserialize)]
struct RawPoint {
    /// `[lng, lat, altitude]`
    coordinates: Vec<f64>,
}

/// Parses a provider response; placemarks without both coordinates are skipped.
pub fn parse_placemarks(body: &str) -> GeocodeResult<Vec<Placemark>> {
    let response: GeocodeResponse = serde_json::from_str(body)?;
    Ok(response
        .placemarks
        .into_iter()
        .filter_map(|raw| match raw.point.coordinates.as_slice() {
            [lng, lat, ..] => Some(Placemark {
                accuracy: raw.details.accuracy,
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        })
        .collect())
}
