//! # Coursedb - Relational course catalog
//!
//! Imports three comma-separated sources (courses, instructors and the
//! offerings that link them) into a small SQLite store and reads them back
//! as a resolved object graph.
//!
//! Coursedb provides:
//! - A typed row parser that reports malformed lines instead of failing
//! - A versioned three-table schema with destructive rebuild on version change
//! - Per-entity stores for courses and instructors
//! - An offering resolver that joins course and instructor on every read
//! - A batch importer that tolerates row defects and fails only on source defects

pub mod model;
pub mod parser;
pub mod source;
pub mod storage;
pub mod import;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Course, EntityKind, Instructor, Offering, OfferingRecord};
pub use parser::{MalformedRow, RowParser, RowRecord};
pub use source::{FileSource, LineSource, TextSource};
pub use storage::{Database, DatabaseOptions, DanglingPolicy, EntityStore, OfferingResolver};
pub use import::{BatchImporter, ImportReport, ImportState};

/// Result type alias for Coursedb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Coursedb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: i64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the storage engine refused a write because of a
    /// PRIMARY KEY, UNIQUE or FOREIGN KEY constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// True for a lookup that matched zero rows.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
