//! Filterable item collection and change subscription.
//!
//! # Responsibility
//! - Define the `Collection` contract consumed by the map view.
//! - Provide an in-memory collection with a facet restriction.
//!
//! # Invariants
//! - Visit order is insertion order, with or without a restriction.
//! - Every mutation that changes the restricted set notifies all listeners.
//! - Listeners only record the change; the host decides when to re-render.

use crate::model::cluster::ItemId;
use crate::store::{SqliteItemStore, StoreResult};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;
use uuid::Uuid;

/// Handle returned by `Collection::add_listener`.
pub type SubscriptionId = Uuid;

/// Receiver of collection change notifications.
pub trait CollectionListener {
    fn on_items_changed(&self);
}

/// Faceted item set as seen by a view.
pub trait Collection {
    /// Visits currently filtered-in items in stable order.
    fn visit_restricted(&self, visitor: &mut dyn FnMut(&ItemId));
    fn count_all(&self) -> usize;
    fn count_restricted(&self) -> usize;
    fn add_listener(&mut self, listener: Rc<dyn CollectionListener>) -> SubscriptionId;
    /// Returns `false` when `id` was not registered.
    fn remove_listener(&mut self, id: SubscriptionId) -> bool;
}

/// Shared dirty flag raised by collection notifications.
#[derive(Debug, Clone, Default)]
pub struct ChangeSignal {
    raised: Rc<Cell<bool>>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.set(true);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.get()
    }

    /// Returns whether the signal was raised and lowers it.
    pub fn take(&self) -> bool {
        self.raised.replace(false)
    }
}

impl CollectionListener for ChangeSignal {
    fn on_items_changed(&self) {
        self.raise();
    }
}

/// In-memory collection with an optional restriction set.
#[derive(Default)]
pub struct ItemCollection {
    items: Vec<ItemId>,
    restriction: Option<BTreeSet<ItemId>>,
    listeners: Vec<(SubscriptionId, Rc<dyn CollectionListener>)>,
}

impl ItemCollection {
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        let mut seen = BTreeSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.clone()))
            .collect();
        Self {
            items,
            restriction: None,
            listeners: Vec::new(),
        }
    }

    /// Loads every stored item in insertion order.
    pub fn from_store(store: &SqliteItemStore<'_>) -> StoreResult<Self> {
        Ok(Self::new(store.item_ids()?))
    }

    /// Keeps only `items` visible (facet filter result) and notifies listeners.
    pub fn restrict(&mut self, items: impl IntoIterator<Item = ItemId>) {
        self.restriction = Some(items.into_iter().collect());
        self.notify();
    }

    /// Removes the restriction so every item is visible again.
    pub fn clear_restriction(&mut self) {
        if self.restriction.take().is_some() {
            self.notify();
        }
    }

    /// Replaces the underlying item list and notifies listeners.
    pub fn replace_items(&mut self, items: impl IntoIterator<Item = ItemId>) {
        let listeners = std::mem::take(&mut self.listeners);
        let restriction = self.restriction.take();
        *self = Self::new(items);
        self.listeners = listeners;
        self.restriction = restriction;
        self.notify();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn is_visible(&self, item: &ItemId) -> bool {
        self.restriction
            .as_ref()
            .map_or(true, |restriction| restriction.contains(item))
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener.on_items_changed();
        }
    }
}

impl Collection for ItemCollection {
    fn visit_restricted(&self, visitor: &mut dyn FnMut(&ItemId)) {
        for item in self.items.iter().filter(|item| self.is_visible(item)) {
            visitor(item);
        }
    }

    fn count_all(&self) -> usize {
        self.items.len()
    }

    fn count_restricted(&self) -> usize {
        self.items.iter().filter(|item| self.is_visible(item)).count()
    }

    fn add_listener(&mut self, listener: Rc<dyn CollectionListener>) -> SubscriptionId {
        let id = Uuid::new_v4();
        self.listeners.push((id, listener));
        id
    }

    fn remove_listener(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeSignal, Collection, ItemCollection};
    use std::rc::Rc;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn visited(collection: &ItemCollection) -> Vec<String> {
        let mut out = Vec::new();
        collection.visit_restricted(&mut |item| out.push(item.clone()));
        out
    }

    #[test]
    fn restriction_filters_but_keeps_order() {
        let mut collection = ItemCollection::new(ids(&["c", "a", "b"]));
        collection.restrict(ids(&["b", "c"]));

        assert_eq!(visited(&collection), ids(&["c", "b"]));
        assert_eq!(collection.count_all(), 3);
        assert_eq!(collection.count_restricted(), 2);

        collection.clear_restriction();
        assert_eq!(collection.count_restricted(), 3);
    }

    #[test]
    fn duplicate_items_are_ignored() {
        let collection = ItemCollection::new(ids(&["a", "a", "b"]));
        assert_eq!(visited(&collection), ids(&["a", "b"]));
    }

    #[test]
    fn listeners_are_notified_until_removed() {
        let mut collection = ItemCollection::new(ids(&["a"]));
        let signal = ChangeSignal::new();
        let id = collection.add_listener(Rc::new(signal.clone()));

        collection.restrict(ids(&["a"]));
        assert!(signal.take());
        assert!(!signal.is_raised());

        assert!(collection.remove_listener(id));
        assert!(!collection.remove_listener(id));
        collection.clear_restriction();
        assert!(!signal.is_raised());
    }

    #[test]
    fn replace_items_keeps_listeners_and_restriction() {
        let mut collection = ItemCollection::new(ids(&["a"]));
        let signal = ChangeSignal::new();
        collection.add_listener(Rc::new(signal.clone()));
        collection.restrict(ids(&["b"]));
        signal.take();

        collection.replace_items(ids(&["a", "b", "c"]));
        assert!(signal.take());
        assert_eq!(collection.listener_count(), 1);
        assert_eq!(visited(&collection), ids(&["b"]));
    }
}
