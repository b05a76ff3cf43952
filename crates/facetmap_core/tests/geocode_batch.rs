use facetmap_core::geocode::GeocodeResult;
use facetmap_core::{
    lookup_lat_lng, open_store_in_memory, GeocodeError, Geocoder, Placemark, SqliteItemStore,
};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
struct ScriptedGeocoder {
    answers: HashMap<String, Vec<Placemark>>,
    failing: bool,
    calls: RefCell<Vec<String>>,
}

impl ScriptedGeocoder {
    fn answer(mut self, address: &str, placemarks: Vec<Placemark>) -> Self {
        self.answers.insert(address.to_string(), placemarks);
        self
    }
}

impl Geocoder for ScriptedGeocoder {
    fn locate(&self, address: &str) -> GeocodeResult<Vec<Placemark>> {
        self.calls.borrow_mut().push(address.to_string());
        if self.failing {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.answers.get(address).cloned().unwrap_or_default())
    }
}

fn placemark(accuracy: u8, lat: f64, lng: f64) -> Placemark {
    Placemark { accuracy, lat, lng }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn imprecise_match_retries_with_broader_address_first() {
    let conn = open_store_in_memory().expect("open store");
    let store = SqliteItemStore::new(&conn);
    store.insert_item("A", None).expect("insert");
    store.insert_item("B", None).expect("insert");
    store.insert_item("C", None).expect("insert");
    store
        .add_value("A", "address", "123 Main St, Springfield, USA")
        .expect("address");
    store.add_value("B", "address", "Nowhere").expect("address");

    let geocoder = ScriptedGeocoder::default()
        .answer(
            "123 Main St, Springfield, USA",
            vec![placemark(2, 0.0, 0.0)],
        )
        .answer(
            "Springfield, USA",
            vec![placemark(3, 1.0, 1.0), placemark(4, 39.78, -89.65)],
        );

    let output = lookup_lat_lng(
        &ids(&["A", "B", "C"]),
        "address",
        "latlng",
        &store,
        &geocoder,
        None,
    );

    assert_eq!(
        output,
        "\t{ id: 'A', latlng: '39.78,-89.65' },\n\t{ id: 'B' }"
    );
    assert_eq!(
        *geocoder.calls.borrow(),
        ids(&["123 Main St, Springfield, USA", "Springfield, USA", "Nowhere"])
    );
}

#[test]
fn custom_threshold_rejects_less_precise_matches() {
    let conn = open_store_in_memory().expect("open store");
    let store = SqliteItemStore::new(&conn);
    store.insert_item("A", None).expect("insert");
    store.add_value("A", "address", "Springfield").expect("address");

    let geocoder =
        ScriptedGeocoder::default().answer("Springfield", vec![placemark(6, 39.78, -89.65)]);

    let strict = lookup_lat_lng(&ids(&["A"]), "address", "where", &store, &geocoder, Some(8));
    assert_eq!(strict, "\t{ id: 'A' }");

    let default = lookup_lat_lng(&ids(&["A"]), "address", "where", &store, &geocoder, None);
    assert_eq!(default, "\t{ id: 'A', where: '39.78,-89.65' }");
}

#[test]
fn transport_failures_count_as_no_candidate() {
    let conn = open_store_in_memory().expect("open store");
    let store = SqliteItemStore::new(&conn);
    store.insert_item("A", None).expect("insert");
    store.add_value("A", "address", "Paris, France").expect("address");

    let geocoder = ScriptedGeocoder {
        failing: true,
        ..ScriptedGeocoder::default()
    };

    let output = lookup_lat_lng(&ids(&["A"]), "address", "latlng", &store, &geocoder, None);
    assert_eq!(output, "\t{ id: 'A' }");
    assert_eq!(*geocoder.calls.borrow(), ids(&["Paris, France", "France"]));
}

#[test]
fn no_addresses_yield_empty_output() {
    let conn = open_store_in_memory().expect("open store");
    let store = SqliteItemStore::new(&conn);
    store.insert_item("A", None).expect("insert");

    let geocoder = ScriptedGeocoder::default();
    let output = lookup_lat_lng(&ids(&["A"]), "address", "latlng", &store, &geocoder, None);
    assert!(output.is_empty());
    assert!(geocoder.calls.borrow().is_empty());
}

#[test]
fn address_rejected_at_every_level_yields_id_only_record() {
    let conn = open_store_in_memory().expect("open store");
    let store = SqliteItemStore::new(&conn);
    store.insert_item("A", None).expect("insert");
    store
        .add_value("A", "address", "123 Main St, Springfield, USA")
        .expect("address");

    let geocoder = ScriptedGeocoder::default()
        .answer(
            "123 Main St, Springfield, USA",
            vec![placemark(2, 39.0, -89.0)],
        )
        .answer("Springfield, USA", vec![placemark(3, 39.78, -89.65)])
        .answer("USA", vec![placemark(1, 38.0, -97.0)]);

    let output = lookup_lat_lng(&ids(&["A"]), "address", "latlng", &store, &geocoder, None);

    assert_eq!(output, "\t{ id: 'A' }");
    assert_eq!(
        *geocoder.calls.borrow(),
        ids(&["123 Main St, Springfield, USA", "Springfield, USA", "USA"])
    );
}
