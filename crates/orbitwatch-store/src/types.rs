//! Catalog row types.

use orbitwatch_core::{Category, ElementPair};
use serde::{Deserialize, Serialize};

/// A persisted catalog object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalObject {
    pub id: i64,
    pub name: String,
    pub elements: ElementPair,
    pub category: Category,
    /// Unix milliseconds of the write that last touched this row.
    pub last_updated: i64,
}

/// An accepted object on its way into the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObject {
    pub name: String,
    pub elements: ElementPair,
    pub category: Category,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_objects: i64,
    pub satellites: i64,
    pub debris: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
