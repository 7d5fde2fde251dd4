//! Domain types for the course catalog
//!
//! Three entities:
//! - `Course`: a catalog course, keyed by a source-supplied id
//! - `Instructor`: a course instructor, keyed by a source-supplied id
//! - `Offering`: one course taught by one instructor in one semester, keyed by CRN
//!
//! Offerings are stored as `OfferingRecord` (integer references only) and
//! materialized into `Offering` by the resolver on every read.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three kinds of rows the catalog stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    Instructor,
    Offering,
}

impl EntityKind {
    /// Get the string representation of the entity kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Instructor => "instructor",
            EntityKind::Offering => "offering",
        }
    }

    /// File name the host application ships this kind's data under
    pub fn default_file_name(&self) -> &'static str {
        match self {
            EntityKind::Course => "courses.csv",
            EntityKind::Instructor => "instructors.csv",
            EntityKind::Offering => "offerings.csv",
        }
    }

    /// All kinds, in the order they must be imported so references resolve
    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Course, EntityKind::Instructor, EntityKind::Offering]
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "course" | "courses" => Ok(EntityKind::Course),
            "instructor" | "instructors" => Ok(EntityKind::Instructor),
            "offering" | "offerings" => Ok(EntityKind::Offering),
            _ => Err(Error::Config(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog course such as `CS 273 Intro to Mobile Dev`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Primary key, supplied by the source data
    pub id: i64,
    /// Department code, e.g. `CS`
    pub alpha: String,
    /// Course number within the department; kept as text (`273L`, `100H`)
    pub number: String,
    pub title: String,
}

impl Course {
    pub fn new(
        id: i64,
        alpha: impl Into<String>,
        number: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            alpha: alpha.into(),
            number: number.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Course{{id={}, alpha={}, number={}, title={}}}", self.id, self.alpha, self.number, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    /// Primary key, supplied by the source data
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Instructor {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instructor{{id={}, first_name={}, last_name={}, email={}}}",
            self.id, self.first_name, self.last_name, self.email
        )
    }
}

/// Stored form of an offering: the natural key plus two foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferingRecord {
    /// Course reference number
    pub crn: i64,
    /// Semester code, e.g. `202380`
    pub semester_code: i64,
    pub course_id: i64,
    pub instructor_id: i64,
}

impl OfferingRecord {
    pub fn new(crn: i64, semester_code: i64, course_id: i64, instructor_id: i64) -> Self {
        Self { crn, semester_code, course_id, instructor_id }
    }
}

/// An offering with its course and instructor resolved.
///
/// The embedded values are snapshots taken at read time; they are never
/// written back through the offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub crn: i64,
    pub semester_code: i64,
    pub course: Course,
    pub instructor: Instructor,
}

impl Offering {
    pub fn new(crn: i64, semester_code: i64, course: Course, instructor: Instructor) -> Self {
        Self { crn, semester_code, course, instructor }
    }

    /// The stored form of this offering
    pub fn record(&self) -> OfferingRecord {
        OfferingRecord::new(self.crn, self.semester_code, self.course.id, self.instructor.id)
    }
}

impl From<&Offering> for OfferingRecord {
    fn from(offering: &Offering) -> Self {
        offering.record()
    }
}

impl From<Offering> for OfferingRecord {
    fn from(offering: Offering) -> Self {
        offering.record()
    }
}

impl fmt::Display for Offering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offering{{crn={}, semester_code={}, course={}, instructor={}}}",
            self.crn, self.semester_code, self.course, self.instructor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("Courses".parse::<EntityKind>().unwrap(), EntityKind::Course);
        assert_eq!("instructor".parse::<EntityKind>().unwrap(), EntityKind::Instructor);
        assert_eq!("OFFERINGS".parse::<EntityKind>().unwrap(), EntityKind::Offering);
        assert!("sections".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_offering_record_from_offering() {
        let offering = Offering::new(
            10001,
            202380,
            Course::new(101, "CS", "273", "Intro to Mobile Dev"),
            Instructor::new(55, "Ada", "Lovelace", "ada@example.edu"),
        );
        let record: OfferingRecord = (&offering).into();
        assert_eq!(record, OfferingRecord::new(10001, 202380, 101, 55));
    }

    #[test]
    fn test_display() {
        let course = Course::new(101, "CS", "273", "Intro to Mobile Dev");
        assert_eq!(course.to_string(), "Course{id=101, alpha=CS, number=273, title=Intro to Mobile Dev}");
        assert_eq!(EntityKind::Offering.to_string(), "offering");
    }
}
