//! Geographic data model shared by aggregation, markers and the map canvas.
//!
//! # Responsibility
//! - Define resolved points, bounds and location clusters.
//! - Keep coordinate-key derivation in one place.
//!
//! # Invariants
//! - A coordinate key is derived only from `lat` and `lng`.
//! - Clusters are rebuilt on every reconstruction pass and never persisted.

pub mod cluster;
pub mod point;
