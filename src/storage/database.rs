//! Database handle with scoped connections
//!
//! `Database` remembers where the catalog lives and how to open it, but holds
//! no connection between calls. Every operation acquires a connection through
//! `with_connection`, and the connection is closed before the call returns.

use std::fmt;
use std::path::{Path, PathBuf};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use crate::model::{Course, Instructor};
use crate::{Error, Result};
use super::entity::{Entity, EntityStore};
use super::offering::{DanglingPolicy, OfferingResolver};
use super::schema::{self, SchemaAction};

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// How a `Database` opens its connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    /// Version stamped on the schema; a different stored version triggers a rebuild
    pub schema_version: u32,
    /// Turn on `PRAGMA foreign_keys` so dangling offerings are refused at write time
    pub enforce_foreign_keys: bool,
    /// What reading all offerings does with an unresolved reference
    pub dangling: DanglingPolicy,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            enforce_foreign_keys: false,
            dangling: DanglingPolicy::Fail,
        }
    }
}

/// SQLite-backed course catalog
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    options: DatabaseOptions,
}

impl Database {
    /// Open a database file (creates if doesn't exist) with default options
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, DatabaseOptions::default())
    }

    /// Open a database file and bring its schema to `options.schema_version`
    pub fn open_with(path: impl Into<PathBuf>, options: DatabaseOptions) -> Result<Self> {
        if options.schema_version == 0 {
            return Err(Error::Config("schema version must be at least 1".to_string()));
        }
        let db = Self { path: path.into(), options };
        let action = db.with_connection(|conn| schema::migrate(conn, options.schema_version))?;
        match action {
            SchemaAction::Created => tracing::debug!("Created schema v{} in {}", options.schema_version, db.path.display()),
            SchemaAction::Unchanged => tracing::debug!("Opened {} (schema v{})", db.path.display(), options.schema_version),
            SchemaAction::Rebuilt { from, to } => tracing::warn!("Schema changed v{} -> v{}; all catalog data was dropped", from, to),
        }
        Ok(db)
    }

    /// Delete the database file so the next `open` starts empty
    pub fn destroy(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        for suffix in ["-journal", "-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_owned();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                std::fs::remove_file(sidecar)?;
            }
        }
        Ok(true)
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Run `f` on a freshly opened connection.
    ///
    /// The connection is released before this returns, whether `f` succeeds
    /// or fails.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = Connection::open(&self.path)?;
        if self.options.enforce_foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        let value = f(&conn)?;
        conn.close().map_err(|(_, e)| Error::Storage(e))?;
        Ok(value)
    }

    /// Course store
    pub fn courses(&self) -> EntityStore<'_, Course> {
        EntityStore::new(self)
    }

    /// Instructor store
    pub fn instructors(&self) -> EntityStore<'_, Instructor> {
        EntityStore::new(self)
    }

    /// Offering resolver using the configured dangling policy
    pub fn offerings(&self) -> OfferingResolver<'_> {
        OfferingResolver::new(self).with_policy(self.options.dangling)
    }

    /// Current schema version stored in the file
    pub fn schema_version(&self) -> Result<u32> {
        self.with_connection(schema::stored_version)
    }

    /// Drop and recreate every table at `new_version`
    pub fn rebuild(&mut self, new_version: u32) -> Result<()> {
        if new_version == 0 {
            return Err(Error::Config("schema version must be at least 1".to_string()));
        }
        self.with_connection(|conn| {
            let old = schema::stored_version(conn)?;
            schema::upgrade(conn, old, new_version)
        })?;
        self.options.schema_version = new_version;
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<CatalogStats> {
        self.with_connection(|conn| {
            Ok(CatalogStats {
                courses: count_rows(conn, Course::TABLE)?,
                instructors: count_rows(conn, Instructor::TABLE)?,
                offerings: count_rows(conn, schema::OFFERINGS_TABLE)?,
                dangling: super::offering::count_dangling(conn)?,
            })
        })
    }
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Row counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub courses: usize,
    pub instructors: usize,
    pub offerings: usize,
    /// Offerings whose course or instructor does not resolve
    pub dangling: usize,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Catalog Statistics:")?;
        writeln!(f, "  Courses: {}", self.courses)?;
        writeln!(f, "  Instructors: {}", self.instructors)?;
        writeln!(f, "  Offerings: {}", self.offerings)?;
        writeln!(f, "  Dangling offerings: {}", self.dangling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("catalog.db")).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let tables = db.with_connection(schema::existing_tables).unwrap();
        assert_eq!(tables, vec!["Courses", "Instructors", "Offerings"]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let db = Database::open(&path).unwrap();
            db.courses().add(&Course::new(1, "CS", "100", "Intro")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.courses().count().unwrap(), 1);
    }

    #[test]
    fn test_version_change_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let db = Database::open(&path).unwrap();
            db.courses().add(&Course::new(1, "CS", "100", "Intro")).unwrap();
            db.instructors().add(&Instructor::new(2, "Ada", "Lovelace", "ada@example.edu")).unwrap();
            db.offerings().add(3, 202380, 1, 2).unwrap();
        }

        let options = DatabaseOptions { schema_version: 2, ..DatabaseOptions::default() };
        let db = Database::open_with(&path, options).unwrap();
        assert_eq!(db.schema_version().unwrap(), 2);

        let stats = db.stats().unwrap();
        assert_eq!((stats.courses, stats.instructors, stats.offerings), (0, 0, 0));

        // Still usable after the rebuild
        db.courses().add(&Course::new(1, "CS", "100", "Intro")).unwrap();
        assert_eq!(db.courses().count().unwrap(), 1);
    }

    #[test]
    fn test_rebuild_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path().join("catalog.db")).unwrap();
        db.courses().add(&Course::new(1, "CS", "100", "Intro")).unwrap();

        db.rebuild(7).unwrap();
        assert_eq!(db.schema_version().unwrap(), 7);
        assert_eq!(db.options().schema_version, 7);
        assert!(db.courses().get_all().unwrap().is_empty());
    }

    #[test]
    fn test_zero_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = DatabaseOptions { schema_version: 0, ..DatabaseOptions::default() };
        let err = Database::open_with(dir.path().join("catalog.db"), options).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        assert!(!Database::destroy(&path).unwrap());

        Database::open(&path).unwrap();
        assert!(Database::destroy(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_stats_counts_dangling() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("catalog.db")).unwrap();
        db.courses().add(&Course::new(101, "CS", "273", "Intro to Mobile Dev")).unwrap();
        db.instructors().add(&Instructor::new(7, "Grace", "Hopper", "grace@example.edu")).unwrap();
        db.offerings().add(10000, 202380, 101, 7).unwrap();
        db.offerings().add(10001, 202380, 101, 55).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.courses, 1);
        assert_eq!(stats.instructors, 1);
        assert_eq!(stats.offerings, 2);
        assert_eq!(stats.dangling, 1);
        assert!(stats.to_string().contains("Dangling offerings: 1"));
    }
}
