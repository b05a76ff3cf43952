//! Item database interface and its SQLite-backed implementation.
//!
//! # Responsibility
//! - Define the read-only `Database` contract consumed by accessors.
//! - Open and migrate SQLite item stores.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Attribute values are returned in insertion (`ordinal`) order.

use crate::model::cluster::ItemId;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod item_store;
pub mod migrations;
mod open;

pub use item_store::SqliteItemStore;
pub use open::{open_store, open_store_in_memory};

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only per-item attribute lookup.
///
/// Multi-valued attributes return every value; unknown items or properties
/// return an empty list rather than an error.
pub trait Database {
    fn attribute_values(&self, item: &ItemId, property: &str) -> StoreResult<Vec<String>>;

    /// Display label of an item; defaults to the id itself.
    fn label(&self, item: &ItemId) -> StoreResult<String> {
        Ok(item.clone())
    }
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    InvalidItemId(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "item store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidItemId(value) => write!(f, "item id is invalid: `{value}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
