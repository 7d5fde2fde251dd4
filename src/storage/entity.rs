//! Entity store - CRUD for the tables keyed by a source-supplied integer id
//!
//! Courses and Instructors behave identically, so the SQL is generated from
//! the `Entity` description of each table. Rows are decoded by column name,
//! never by position.

use std::marker::PhantomData;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use crate::model::{Course, EntityKind, Instructor};
use crate::{Error, Result};
use super::database::{count_rows, Database};
use super::schema;

/// A table whose rows map one-to-one onto a domain type
pub trait Entity: Sized {
    const KIND: EntityKind;
    const TABLE: &'static str;
    /// Key column first, then the attribute columns in `attributes` order
    const COLUMNS: [&'static str; 4];

    fn id(&self) -> i64;

    /// Non-key values, in `COLUMNS[1..]` order
    fn attributes(&self) -> [&dyn ToSql; 3];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Entity for Course {
    const KIND: EntityKind = EntityKind::Course;
    const TABLE: &'static str = schema::COURSES_TABLE;
    const COLUMNS: [&'static str; 4] = ["id", "alpha", "number", "title"];

    fn id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> [&dyn ToSql; 3] {
        [&self.alpha, &self.number, &self.title]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Course {
            id: row.get("id")?,
            alpha: row.get::<_, Option<String>>("alpha")?.unwrap_or_default(),
            number: row.get::<_, Option<String>>("number")?.unwrap_or_default(),
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        })
    }
}

impl Entity for Instructor {
    const KIND: EntityKind = EntityKind::Instructor;
    const TABLE: &'static str = schema::INSTRUCTORS_TABLE;
    const COLUMNS: [&'static str; 4] = ["id", "first_name", "last_name", "email"];

    fn id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> [&dyn ToSql; 3] {
        [&self.first_name, &self.last_name, &self.email]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Instructor {
            id: row.get("id")?,
            first_name: row.get::<_, Option<String>>("first_name")?.unwrap_or_default(),
            last_name: row.get::<_, Option<String>>("last_name")?.unwrap_or_default(),
            email: row.get::<_, Option<String>>("email")?.unwrap_or_default(),
        })
    }
}

fn select_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

/// Insert one entity on an open connection
pub(crate) fn insert<E: Entity>(conn: &Connection, entity: &E) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4)",
        E::TABLE,
        E::COLUMNS.join(", ")
    );
    let id = entity.id();
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(E::COLUMNS.len());
    params.push(&id);
    params.extend(entity.attributes());
    conn.execute(&sql, params.as_slice())?;
    Ok(())
}

/// Look up one entity by primary key on an open connection
pub(crate) fn find_by_id<E: Entity>(conn: &Connection, id: i64) -> Result<Option<E>> {
    let sql = format!("{} WHERE {} = ?1", select_sql::<E>(), E::COLUMNS[0]);
    conn.query_row(&sql, [id], |row| E::from_row(row))
        .optional()
        .map_err(Into::into)
}

/// Like `find_by_id`, but a missing row is `Error::NotFound`
pub(crate) fn fetch_by_id<E: Entity>(conn: &Connection, id: i64) -> Result<E> {
    find_by_id(conn, id)?.ok_or(Error::NotFound { kind: E::KIND, key: id })
}

/// CRUD operations for one entity table
#[derive(Debug)]
pub struct EntityStore<'db, E> {
    db: &'db Database,
    _entity: PhantomData<E>,
}

impl<'db, E: Entity> EntityStore<'db, E> {
    pub fn new(db: &'db Database) -> Self {
        Self { db, _entity: PhantomData }
    }

    /// Insert a new row with every attribute.
    ///
    /// A duplicate id is refused by the primary key and surfaces as a
    /// constraint-violation `Error::Storage`.
    pub fn add(&self, entity: &E) -> Result<()> {
        self.db.with_connection(|conn| insert(conn, entity))
    }

    /// Every row, in physical order
    pub fn get_all(&self) -> Result<Vec<E>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", select_sql::<E>()))?;
            let entities = stmt
                .query_map([], |row| E::from_row(row))?
                .collect::<rusqlite::Result<Vec<E>>>()?;
            Ok(entities)
        })
    }

    /// The row with this primary key, or `Error::NotFound`
    pub fn get_by_id(&self, id: i64) -> Result<E> {
        self.db.with_connection(|conn| fetch_by_id(conn, id))
    }

    /// The row with this primary key, if any
    pub fn find_by_id(&self, id: i64) -> Result<Option<E>> {
        self.db.with_connection(|conn| find_by_id(conn, id))
    }

    /// Overwrite the attributes of the row with `entity`'s id.
    ///
    /// Returns the number of rows changed; 0 means no row had that id, which
    /// is not an error.
    pub fn update(&self, entity: &E) -> Result<usize> {
        let assignments = E::COLUMNS[1..]
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            E::TABLE,
            assignments,
            E::COLUMNS[0],
            E::COLUMNS.len()
        );
        let id = entity.id();

        self.db.with_connection(|conn| {
            let mut params: Vec<&dyn ToSql> = entity.attributes().to_vec();
            params.push(&id);
            let changed = conn.execute(&sql, params.as_slice())?;
            if changed == 0 {
                tracing::debug!("Update matched no {} with id {}", E::KIND, id);
            }
            Ok(changed)
        })
    }

    /// Remove the row with `entity`'s id. Referencing offerings are left in place.
    pub fn delete(&self, entity: &E) -> Result<usize> {
        self.delete_by_id(entity.id())
    }

    pub fn delete_by_id(&self, id: i64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", E::TABLE, E::COLUMNS[0]);
        self.db.with_connection(|conn| Ok(conn.execute(&sql, [id])?))
    }

    /// Empty the table, keeping its schema
    pub fn delete_all(&self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", E::TABLE);
        self.db.with_connection(|conn| Ok(conn.execute(&sql, [])?))
    }

    pub fn count(&self) -> Result<usize> {
        self.db.with_connection(|conn| count_rows(conn, E::TABLE))
    }
}
