//! Location aggregation.
//!
//! # Responsibility
//! - Resolve every restricted item to its points.
//! - Group items by coordinate key and merge their color/size keys.
//!
//! # Invariants
//! - Clusters appear in first-seen order; members keep visit order.
//! - `plotted + unplottable.len()` equals the restricted item count.
//! - An item with N distinct locations is a member of N clusters.

use crate::accessor::Accessors;
use crate::collection::Collection;
use crate::model::cluster::{ItemId, LocationCluster};
use crate::store::Database;
use log::warn;
use std::collections::{BTreeSet, HashMap};

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub clusters: Vec<LocationCluster>,
    /// Items that resolved to no point, in visit order.
    pub unplottable: Vec<ItemId>,
    /// Items that resolved to at least one point.
    pub plotted: usize,
}

impl Aggregation {
    pub fn visited(&self) -> usize {
        self.plotted + self.unplottable.len()
    }
}

/// Groups the collection's restricted items by location.
pub fn aggregate(
    collection: &dyn Collection,
    db: &dyn Database,
    accessors: &Accessors,
) -> Aggregation {
    let mut aggregation = Aggregation::default();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    collection.visit_restricted(&mut |item| {
        let points = match accessors.coordinates.resolve(item, db) {
            Ok(points) => points,
            Err(err) => {
                warn!(
                    "event=aggregate_item module=aggregate status=error error_code=coordinate_lookup_failed error={err}"
                );
                Vec::new()
            }
        };
        if points.is_empty() {
            aggregation.unplottable.push(item.clone());
            return;
        }
        aggregation.plotted += 1;

        let color_keys = accessors
            .color_key
            .as_ref()
            .map(|accessor| keys_or_empty(accessor.keys(item, db), "color"));
        let size_keys = accessors
            .size_key
            .as_ref()
            .map(|accessor| keys_or_empty(accessor.keys(item, db), "size"));

        for point in points {
            let key = point.coordinate_key();
            match index_by_key.get(&key) {
                Some(&index) => aggregation.clusters[index].merge(
                    item.clone(),
                    color_keys.as_ref(),
                    size_keys.as_ref(),
                ),
                None => {
                    index_by_key.insert(key, aggregation.clusters.len());
                    aggregation.clusters.push(LocationCluster::new(
                        point,
                        item.clone(),
                        color_keys.clone(),
                        size_keys.clone(),
                    ));
                }
            }
        }
    });

    aggregation
}

fn keys_or_empty(
    keys: crate::store::StoreResult<BTreeSet<String>>,
    dimension: &'static str,
) -> BTreeSet<String> {
    keys.unwrap_or_else(|err| {
        warn!(
            "event=aggregate_item module=aggregate status=error error_code=key_lookup_failed dimension={dimension} error={err}"
        );
        BTreeSet::new()
    })
}

#[cfg(test)]
mod tests {
    use super::aggregate;
    use crate::accessor::Accessors;
    use crate::collection::ItemCollection;
    use crate::config::AccessorConfig;
    use crate::store::{open_store_in_memory, SqliteItemStore};

    #[test]
    fn multi_location_item_joins_each_cluster() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("tour", None).expect("insert");
        store.insert_item("solo", None).expect("insert");
        store.add_value("tour", "latlng", "1,1").expect("value");
        store.add_value("tour", "latlng", "2,2").expect("value");
        store.add_value("solo", "latlng", "2,2").expect("value");

        let collection = ItemCollection::from_store(&store).expect("collection");
        let accessors = Accessors::from_config(&AccessorConfig::default());
        let result = aggregate(&collection, &store, &accessors);

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[0].items, vec!["tour".to_string()]);
        assert_eq!(
            result.clusters[1].items,
            vec!["tour".to_string(), "solo".to_string()]
        );
        assert_eq!(result.plotted, 2);
        assert!(result.unplottable.is_empty());
        assert!(result.clusters[0].color_keys.is_none());
    }

    #[test]
    fn items_without_points_are_unplottable() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("nowhere", None).expect("insert");
        store.insert_item("bad", None).expect("insert");
        store.add_value("bad", "latlng", "not a place").expect("value");

        let collection = ItemCollection::from_store(&store).expect("collection");
        let accessors = Accessors::from_config(&AccessorConfig::default());
        let result = aggregate(&collection, &store, &accessors);

        assert!(result.clusters.is_empty());
        assert_eq!(
            result.unplottable,
            vec!["nowhere".to_string(), "bad".to_string()]
        );
        assert_eq!(result.visited(), 2);
    }
}
