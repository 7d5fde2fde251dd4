//! Offering resolver - the relationship table and its read-time joins
//!
//! Offerings store only integer references. Reads resolve the course and the
//! instructor by id every time, so an offering never carries a stale copy.
//! Offerings are matched on CRN for lookup, update and delete.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use crate::model::{Course, EntityKind, Instructor, Offering, OfferingRecord};
use crate::{Error, Result};
use super::database::{count_rows, Database};
use super::entity::fetch_by_id;
use super::schema::OFFERINGS_TABLE;

const SELECT_RECORDS: &str = "SELECT crn, semester_code, course_id, instructor_id FROM Offerings";

const SELECT_DANGLING: &str = r#"
SELECT o.crn AS crn, o.semester_code AS semester_code,
       o.course_id AS course_id, o.instructor_id AS instructor_id
FROM Offerings o
LEFT JOIN Courses c ON c.id = o.course_id
LEFT JOIN Instructors i ON i.id = o.instructor_id
WHERE c.id IS NULL OR i.id IS NULL
ORDER BY o.rowid
"#;

/// What reading all offerings does when a reference does not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Abort the read with the first `Error::NotFound`
    #[default]
    Fail,
    /// Leave the offering out and log a warning
    Skip,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<OfferingRecord> {
    Ok(OfferingRecord {
        crn: row.get("crn")?,
        semester_code: row.get("semester_code")?,
        course_id: row.get("course_id")?,
        instructor_id: row.get("instructor_id")?,
    })
}

/// Insert one offering record on an open connection.
///
/// References are not checked here; with foreign keys enforced the storage
/// engine refuses dangling ones.
pub(crate) fn insert(conn: &Connection, record: &OfferingRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO Offerings (crn, semester_code, course_id, instructor_id)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![record.crn, record.semester_code, record.course_id, record.instructor_id],
    )?;
    Ok(())
}

fn all_records(conn: &Connection) -> Result<Vec<OfferingRecord>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_RECORDS))?;
    let records = stmt
        .query_map([], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn record_by_crn(conn: &Connection, crn: i64) -> Result<Option<OfferingRecord>> {
    conn.query_row(
        &format!("{} WHERE crn = ?1 ORDER BY rowid LIMIT 1", SELECT_RECORDS),
        [crn],
        record_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Materialize a record by fetching its course and instructor
fn resolve(conn: &Connection, record: OfferingRecord) -> Result<Offering> {
    let course: Course = fetch_by_id(conn, record.course_id)?;
    let instructor: Instructor = fetch_by_id(conn, record.instructor_id)?;
    Ok(Offering::new(record.crn, record.semester_code, course, instructor))
}

pub(crate) fn count_dangling(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM ({})", SELECT_DANGLING),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// CRUD for offerings plus course/instructor resolution
#[derive(Debug)]
pub struct OfferingResolver<'db> {
    db: &'db Database,
    policy: DanglingPolicy,
}

impl<'db> OfferingResolver<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db, policy: DanglingPolicy::default() }
    }

    pub fn with_policy(mut self, policy: DanglingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DanglingPolicy {
        self.policy
    }

    pub fn add(&self, crn: i64, semester_code: i64, course_id: i64, instructor_id: i64) -> Result<()> {
        self.add_record(&OfferingRecord::new(crn, semester_code, course_id, instructor_id))
    }

    pub fn add_record(&self, record: &OfferingRecord) -> Result<()> {
        self.db.with_connection(|conn| insert(conn, record))
    }

    /// Stored records, without resolution
    pub fn records(&self) -> Result<Vec<OfferingRecord>> {
        self.db.with_connection(all_records)
    }

    /// Every offering with its course and instructor resolved.
    ///
    /// Under `DanglingPolicy::Fail` an unresolved reference aborts the whole
    /// read with `Error::NotFound`; under `Skip` that offering is omitted.
    pub fn get_all(&self) -> Result<Vec<Offering>> {
        self.db.with_connection(|conn| {
            let records = all_records(conn)?;
            let mut offerings = Vec::with_capacity(records.len());
            for record in records {
                match resolve(conn, record) {
                    Ok(offering) => offerings.push(offering),
                    Err(Error::NotFound { kind, key }) if self.policy == DanglingPolicy::Skip => {
                        tracing::warn!("Skipping offering {}: {} {} does not exist", record.crn, kind, key);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(offerings)
        })
    }

    /// The first offering with this CRN, resolved.
    ///
    /// `Error::NotFound` names the offering when the CRN is unknown, or the
    /// course/instructor when a reference does not resolve.
    pub fn get_by_crn(&self, crn: i64) -> Result<Offering> {
        self.db.with_connection(|conn| {
            let record = record_by_crn(conn, crn)?
                .ok_or(Error::NotFound { kind: EntityKind::Offering, key: crn })?;
            resolve(conn, record)
        })
    }

    /// Rewrite semester and references of every row with this CRN.
    ///
    /// Returns the number of rows changed; 0 is a silent no-match.
    pub fn update(&self, offering: impl Into<OfferingRecord>) -> Result<usize> {
        let record = offering.into();
        self.db.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE Offerings SET semester_code = ?1, course_id = ?2, instructor_id = ?3 WHERE crn = ?4",
                params![record.semester_code, record.course_id, record.instructor_id, record.crn],
            )?;
            if changed == 0 {
                tracing::debug!("Update matched no offering with crn {}", record.crn);
            }
            Ok(changed)
        })
    }

    pub fn delete(&self, offering: impl Into<OfferingRecord>) -> Result<usize> {
        self.delete_by_crn(offering.into().crn)
    }

    pub fn delete_by_crn(&self, crn: i64) -> Result<usize> {
        self.db.with_connection(|conn| Ok(conn.execute("DELETE FROM Offerings WHERE crn = ?1", [crn])?))
    }

    /// Empty the table, keeping its schema
    pub fn delete_all(&self) -> Result<usize> {
        self.db.with_connection(|conn| Ok(conn.execute("DELETE FROM Offerings", [])?))
    }

    pub fn count(&self) -> Result<usize> {
        self.db.with_connection(|conn| count_rows(conn, OFFERINGS_TABLE))
    }

    /// Records whose course or instructor does not exist
    pub fn dangling(&self) -> Result<Vec<OfferingRecord>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(SELECT_DANGLING)?;
            let records = stmt
                .query_map([], record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }
}
