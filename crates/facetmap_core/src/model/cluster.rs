//! Location cluster built by the aggregator.

use crate::model::point::ResolvedPoint;
use std::collections::BTreeSet;

/// Opaque item identifier owned by the surrounding database.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = String;

/// Items sharing one resolved coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCluster {
    /// `"lat,lng"`; unique within one reconstruction pass.
    pub coordinate_key: String,
    /// First point seen for this key; its auto-zoom ceiling applies.
    pub point: ResolvedPoint,
    /// Members in collection visit order.
    pub items: Vec<ItemId>,
    /// `None` when no color accessor is configured.
    pub color_keys: Option<BTreeSet<String>>,
    /// `None` when no size accessor is configured.
    pub size_keys: Option<BTreeSet<String>>,
}

impl LocationCluster {
    pub fn new(
        point: ResolvedPoint,
        item: ItemId,
        color_keys: Option<BTreeSet<String>>,
        size_keys: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            coordinate_key: point.coordinate_key(),
            point,
            items: vec![item],
            color_keys,
            size_keys,
        }
    }

    /// Appends one member and unions its key sets into the cluster.
    ///
    /// An item repeating the same location right after itself is kept once.
    pub fn merge(
        &mut self,
        item: ItemId,
        color_keys: Option<&BTreeSet<String>>,
        size_keys: Option<&BTreeSet<String>>,
    ) {
        if self.items.last() != Some(&item) {
            self.items.push(item);
        }
        if let (Some(target), Some(keys)) = (self.color_keys.as_mut(), color_keys) {
            target.extend(keys.iter().cloned());
        }
        if let (Some(target), Some(keys)) = (self.size_keys.as_mut(), size_keys) {
            target.extend(keys.iter().cloned());
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count label drawn on the marker: empty for a single member.
    pub fn label(&self) -> String {
        if self.items.len() == 1 {
            String::new()
        } else {
            self.items.len().to_string()
        }
    }
}
