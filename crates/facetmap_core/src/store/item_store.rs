//! SQLite-backed item store.
//!
//! # Responsibility
//! - Persist items with multi-valued string attributes.
//! - Serve attribute lookups for coordinate, color, size and icon accessors.
//!
//! # Invariants
//! - Item ids are trimmed and never empty.
//! - `item_ids()` preserves insertion order, which drives visit order.

use super::{Database, StoreError, StoreResult};
use crate::model::cluster::ItemId;
use rusqlite::{params, Connection, OptionalExtension};

/// Item store over a migrated connection (see `open_store`).
pub struct SqliteItemStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts one item; re-inserting an existing id only updates its label.
    pub fn insert_item(&self, id: &str, label: Option<&str>) -> StoreResult<ItemId> {
        let id = normalize_item_id(id)?;
        self.conn.execute(
            "INSERT INTO items (id, label, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM items))
             ON CONFLICT(id) DO UPDATE SET label = excluded.label;",
            params![id.as_str(), label],
        )?;
        Ok(id)
    }

    /// Appends one value to a (possibly multi-valued) attribute.
    pub fn add_value(&self, item: &str, property: &str, value: &str) -> StoreResult<()> {
        let item = normalize_item_id(item)?;
        self.conn.execute(
            "INSERT INTO item_values (item_id, property, value, ordinal)
             VALUES (?1, ?2, ?3, (
                SELECT COALESCE(MAX(ordinal), -1) + 1
                FROM item_values
                WHERE item_id = ?1 AND property = ?2
             ));",
            params![item.as_str(), property, value],
        )?;
        Ok(())
    }

    /// Replaces all values of one attribute in a single transaction.
    pub fn set_values(&self, item: &str, property: &str, values: &[&str]) -> StoreResult<()> {
        let item = normalize_item_id(item)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM item_values WHERE item_id = ?1 AND property = ?2;",
            params![item.as_str(), property],
        )?;
        for (ordinal, value) in values.iter().enumerate() {
            tx.execute(
                "INSERT INTO item_values (item_id, property, value, ordinal)
                 VALUES (?1, ?2, ?3, ?4);",
                params![item.as_str(), property, *value, ordinal as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns every item id in insertion order.
    pub fn item_ids(&self) -> StoreResult<Vec<ItemId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM items ORDER BY position ASC;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl Database for SqliteItemStore<'_> {
    fn label(&self, item: &ItemId) -> StoreResult<String> {
        let label = self
            .conn
            .query_row(
                "SELECT label FROM items WHERE id = ?1;",
                params![item.as_str()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(label.unwrap_or_else(|| item.clone()))
    }

    fn attribute_values(&self, item: &ItemId, property: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT value FROM item_values
             WHERE item_id = ?1 AND property = ?2
             ORDER BY ordinal ASC;",
        )?;
        let rows = stmt.query_map(params![item.as_str(), property], |row| {
            row.get::<_, String>(0)
        })?;
        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }
}

fn normalize_item_id(value: &str) -> StoreResult<ItemId> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidItemId(value.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::SqliteItemStore;
    use crate::store::{open_store_in_memory, Database, StoreError};

    #[test]
    fn values_keep_insertion_order() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("a", None).expect("insert a");
        store.add_value("a", "colorKey", "red").expect("value");
        store.add_value("a", "colorKey", "blue").expect("value");

        let values = store
            .attribute_values(&"a".to_string(), "colorKey")
            .expect("lookup");
        assert_eq!(values, vec!["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn unknown_property_returns_empty_list() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("a", None).expect("insert a");

        let values = store
            .attribute_values(&"a".to_string(), "latlng")
            .expect("lookup");
        assert!(values.is_empty());
    }

    #[test]
    fn rejects_blank_item_id() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        let err = store.insert_item("   ", None).expect_err("blank id must fail");
        assert!(matches!(err, StoreError::InvalidItemId(_)));
    }

    #[test]
    fn set_values_replaces_previous_values() {
        let conn = open_store_in_memory().expect("open store");
        let store = SqliteItemStore::new(&conn);
        store.insert_item("a", Some("Alpha")).expect("insert a");
        store.add_value("a", "sizeKey", "old").expect("value");
        store
            .set_values("a", "sizeKey", &["small", "large"])
            .expect("replace");

        let values = store
            .attribute_values(&"a".to_string(), "sizeKey")
            .expect("lookup");
        assert_eq!(values, vec!["small".to_string(), "large".to_string()]);
        assert_eq!(store.label(&"a".to_string()).expect("label"), "Alpha");
    }
}
