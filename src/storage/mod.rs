//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - Courses(id, alpha, number, title)
//! - Instructors(id, first_name, last_name, email)
//! - Offerings(crn, semester_code, course_id -> Courses.id, instructor_id -> Instructors.id)

pub mod schema;
pub mod database;
pub mod entity;
pub mod offering;

pub use database::{CatalogStats, Database, DatabaseOptions, SCHEMA_VERSION};
pub use entity::{Entity, EntityStore};
pub use offering::{DanglingPolicy, OfferingResolver};
pub use schema::SchemaAction;
