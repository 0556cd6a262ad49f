//! OrbitWatch Store — durable SQLite catalog of accepted orbital objects.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::CatalogStore;
pub use types::*;
