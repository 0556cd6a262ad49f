//! SQLite-backed catalog store.
//!
//! Every mutation runs inside a single transaction on one connection, so a
//! concurrent `list_all` observes either the complete old set or the
//! complete new set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use orbitwatch_core::{Category, ElementPair, Error, Result};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;

const SELECT_COLUMNS: &str = "SELECT id, name, tle1, tle2, category, last_updated FROM orbital_objects";

/// Durable record of accepted catalog objects.
pub struct CatalogStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl CatalogStore {
    /// Open or create the catalog store.
    ///
    /// `db_dir` is the directory (e.g., `data/catalog/`). The file will be `db_dir/orbitwatch.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("orbitwatch.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "CatalogStore initialized: {} objects, path={}",
            store.count()?,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    // ---------------------------------------------------------------
    // Mutations (refresh orchestrator only)
    // ---------------------------------------------------------------

    /// Discard all prior contents and install `objects`.
    ///
    /// Objects whose name already existed keep their id; new names get fresh
    /// ids. Returns the installed rows in id order.
    pub fn replace_all(&self, objects: &[NewObject]) -> Result<Vec<OrbitalObject>> {
        let now = now_millis();
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let existing = Self::name_ids(&tx)?;
        tx.execute("DELETE FROM orbital_objects", [])
            .map_err(db_err)?;

        {
            let mut insert = tx
                .prepare_cached(
                    "INSERT INTO orbital_objects (id, name, tle1, tle2, category, last_updated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(db_err)?;
            for obj in objects {
                let id = existing.get(&obj.name).copied();
                insert
                    .execute(params![
                        id,
                        obj.name,
                        obj.elements.line1,
                        obj.elements.line2,
                        obj.category.as_str(),
                        now
                    ])
                    .map_err(|e| Error::Database(format!("insert {}: {}", obj.name, e)))?;
            }
        }

        let rows = Self::select_all(&tx)?;
        tx.commit().map_err(db_err)?;

        info!(
            "Catalog replaced: {} objects ({} kept their id)",
            rows.len(),
            objects.iter().filter(|o| existing.contains_key(&o.name)).count()
        );
        Ok(rows)
    }

    /// Add `objects` without discarding existing rows. A name that is
    /// already present has its element lines and category updated in place.
    ///
    /// Returns the written rows.
    pub fn append(&self, objects: &[NewObject]) -> Result<Vec<OrbitalObject>> {
        let now = now_millis();
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let mut written = Vec::with_capacity(objects.len());
        {
            let mut upsert = tx
                .prepare_cached(
                    "INSERT INTO orbital_objects (name, tle1, tle2, category, last_updated)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(name) DO UPDATE SET
                        tle1 = excluded.tle1,
                        tle2 = excluded.tle2,
                        category = excluded.category,
                        last_updated = excluded.last_updated",
                )
                .map_err(db_err)?;
            let mut lookup = tx
                .prepare_cached(&format!("{} WHERE name = ?1", SELECT_COLUMNS))
                .map_err(db_err)?;

            for obj in objects {
                upsert
                    .execute(params![
                        obj.name,
                        obj.elements.line1,
                        obj.elements.line2,
                        obj.category.as_str(),
                        now
                    ])
                    .map_err(|e| Error::Database(format!("upsert {}: {}", obj.name, e)))?;
                let row = lookup
                    .query_row(params![obj.name], Self::row_to_object)
                    .map_err(db_err)?;
                written.push(row);
            }
        }

        tx.commit().map_err(db_err)?;
        debug!("Appended {} objects to catalog", written.len());
        Ok(written)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// All catalog objects in id order.
    pub fn list_all(&self) -> Result<Vec<OrbitalObject>> {
        let conn = self.conn.lock();
        Self::select_all(&conn)
    }

    /// Look up one object by exact name.
    pub fn get_by_name(&self, name: &str) -> Result<Option<OrbitalObject>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(&format!("{} WHERE name = ?1", SELECT_COLUMNS))
            .map_err(db_err)?
            .query_row(params![name], Self::row_to_object)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Count catalog rows.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM orbital_objects", [], |row| row.get(0))
            .map_err(db_err)
    }

    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT category, COUNT(*) FROM orbital_objects GROUP BY category")
            .map_err(db_err)?;
        let counts: HashMap<String, i64> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(db_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(db_err)?;
        drop(stmt);
        drop(conn);

        let satellites = counts.get(Category::Satellite.as_str()).copied().unwrap_or(0);
        let debris = counts.get(Category::Debris.as_str()).copied().unwrap_or(0);
        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            total_objects: satellites + debris,
            satellites,
            debris,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn name_ids(tx: &Transaction<'_>) -> Result<HashMap<String, i64>> {
        let mut stmt = tx
            .prepare_cached("SELECT name, id FROM orbital_objects")
            .map_err(db_err)?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(db_err)?
            .collect::<rusqlite::Result<HashMap<String, i64>>>()
            .map_err(db_err)?;
        Ok(map)
    }

    fn select_all(conn: &Connection) -> Result<Vec<OrbitalObject>> {
        let mut stmt = conn
            .prepare_cached(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], Self::row_to_object)
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    fn row_to_object(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrbitalObject> {
        let category: String = row.get("category")?;
        let category = category
            .parse::<Category>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(OrbitalObject {
            id: row.get("id")?,
            name: row.get("name")?,
            elements: ElementPair::new(
                row.get::<_, String>("tle1")?,
                row.get::<_, String>("tle2")?,
            ),
            category,
            last_updated: row.get("last_updated")?,
        })
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (CatalogStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn obj(name: &str, category: Category) -> NewObject {
        NewObject {
            name: name.to_string(),
            elements: ElementPair::new(format!("1 {}", name), format!("2 {}", name)),
            category,
        }
    }

    #[test]
    fn test_open_creates_empty_catalog() {
        let (store, dir) = test_store();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(store.db_path(), dir.path().join("orbitwatch.db"));
    }

    #[test]
    fn test_replace_all_discards_prior_contents() {
        let (store, _dir) = test_store();
        store
            .replace_all(&[obj("A", Category::Debris), obj("B", Category::Debris)])
            .unwrap();
        let rows = store
            .replace_all(&[obj("C", Category::Satellite)])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(store.count().unwrap(), 1);
        let all = store.list_all().unwrap();
        assert_eq!(all[0].name, "C");
        assert_eq!(all[0].category, Category::Satellite);
        assert!(all[0].last_updated > 0);
        assert!(store.get_by_name("A").unwrap().is_none());
    }

    #[test]
    fn test_replace_all_keeps_ids_for_matching_names() {
        let (store, _dir) = test_store();
        let first = store
            .replace_all(&[obj("A", Category::Debris), obj("B", Category::Debris)])
            .unwrap();
        let id_b = first.iter().find(|o| o.name == "B").unwrap().id;
        let id_a = first.iter().find(|o| o.name == "A").unwrap().id;

        let second = store
            .replace_all(&[obj("B", Category::Debris), obj("D", Category::Satellite)])
            .unwrap();
        let b = second.iter().find(|o| o.name == "B").unwrap();
        let d = second.iter().find(|o| o.name == "D").unwrap();
        assert_eq!(b.id, id_b);
        assert_ne!(d.id, id_a);
        assert_ne!(d.id, id_b);
    }

    #[test]
    fn test_append_adds_and_upserts() {
        let (store, _dir) = test_store();
        store.replace_all(&[obj("A", Category::Debris)]).unwrap();
        let id_a = store.get_by_name("A").unwrap().unwrap().id;

        let mut updated = obj("A", Category::Satellite);
        updated.elements.line1 = "1 updated".into();
        let written = store
            .append(&[updated, obj("B", Category::Debris)])
            .unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(store.count().unwrap(), 2);

        let a = store.get_by_name("A").unwrap().unwrap();
        assert_eq!(a.id, id_a);
        assert_eq!(a.elements.line1, "1 updated");
        assert_eq!(a.category, Category::Satellite);
    }

    #[test]
    fn test_failed_replace_leaves_previous_contents() {
        let (store, _dir) = test_store();
        store
            .replace_all(&[obj("A", Category::Debris), obj("B", Category::Debris)])
            .unwrap();

        // Duplicate names violate the UNIQUE constraint mid-transaction.
        let result = store.replace_all(&[obj("X", Category::Debris), obj("X", Category::Debris)]);
        assert!(matches!(result, Err(Error::Database(_))));

        let names: Vec<_> = store.list_all().unwrap().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        store
            .replace_all(&[
                obj("A", Category::Debris),
                obj("B", Category::Debris),
                obj("C", Category::Satellite),
            ])
            .unwrap();
        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_objects, 3);
        assert_eq!(stats.debris, 2);
        assert_eq!(stats.satellites, 1);
    }

    #[test]
    fn test_readers_never_see_partial_replace() {
        let (store, _dir) = test_store();
        let store = Arc::new(store);
        let small: Vec<_> = (0..3).map(|i| obj(&format!("S{}", i), Category::Debris)).collect();
        let large: Vec<_> = (0..40).map(|i| obj(&format!("L{}", i), Category::Debris)).collect();
        store.replace_all(&small).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut observed = Vec::new();
                while !done.load(Ordering::SeqCst) {
                    observed.push(store.list_all().unwrap().len());
                }
                observed
            })
        };

        for i in 0..20 {
            let set = if i % 2 == 0 { &large } else { &small };
            store.replace_all(set).unwrap();
        }
        done.store(true, Ordering::SeqCst);

        let observed = reader.join().unwrap();
        assert!(observed.iter().all(|&n| n == 3 || n == 40), "{:?}", observed);
    }
}
