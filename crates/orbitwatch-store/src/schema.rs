//! Database schema SQL.

/// Catalog table. `name` is unique: it keys the query index and keeps ids
/// stable across refreshes.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS orbital_objects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    tle1 TEXT NOT NULL,
    tle2 TEXT NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('satellite', 'debris')),
    last_updated INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orbital_objects_category ON orbital_objects(category);
"#;
