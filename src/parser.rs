//! Row parser - one raw text line in, one typed record (or a diagnosis) out
//!
//! Every entity kind has a fixed arity of four fields. A line with any other
//! field count, or with a non-integer in a numeric column, is malformed. The
//! parser reports malformed lines as values; it never aborts a batch.

use crate::model::{Course, EntityKind, Instructor, OfferingRecord};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Why a line was rejected by the parser
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRow {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("column `{column}` is not an integer: {value:?}")]
    InvalidNumber { column: &'static str, value: String },

    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// A record that can be decoded from one delimited line.
///
/// Field order is the order of the source file, which is not necessarily the
/// order of the table columns.
pub trait RowRecord: Sized {
    const KIND: EntityKind;
    const ARITY: usize = 4;

    /// Decode already-trimmed fields. Arity has been checked by the caller.
    fn from_fields(fields: &StringRecord) -> Result<Self, MalformedRow>;
}

/// Splits lines on a single-byte delimiter and decodes them into records
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    delimiter: u8,
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl RowParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Split a line into trimmed fields.
    ///
    /// Quotes are ordinary characters, so every delimiter starts a new field.
    /// An empty line yields zero fields.
    pub fn split(&self, line: &str) -> Result<StringRecord, MalformedRow> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(line.as_bytes());

        match reader.records().next() {
            Some(Ok(record)) => Ok(record),
            Some(Err(e)) => Err(MalformedRow::Unreadable(e.to_string())),
            None => Ok(StringRecord::new()),
        }
    }

    /// Parse one line into a typed record
    pub fn parse<T: RowRecord>(&self, line: &str) -> Result<T, MalformedRow> {
        let fields = self.split(line)?;
        if fields.len() != T::ARITY {
            return Err(MalformedRow::Arity {
                expected: T::ARITY,
                found: fields.len(),
            });
        }
        T::from_fields(&fields)
    }
}

fn text(fields: &StringRecord, index: usize) -> String {
    fields.get(index).unwrap_or_default().to_string()
}

fn integer(fields: &StringRecord, index: usize, column: &'static str) -> Result<i64, MalformedRow> {
    let raw = fields.get(index).unwrap_or_default();
    raw.parse::<i64>().map_err(|_| MalformedRow::InvalidNumber {
        column,
        value: raw.to_string(),
    })
}

/// `id,alpha,number,title`
impl RowRecord for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn from_fields(fields: &StringRecord) -> Result<Self, MalformedRow> {
        Ok(Course {
            id: integer(fields, 0, "id")?,
            alpha: text(fields, 1),
            number: text(fields, 2),
            title: text(fields, 3),
        })
    }
}

/// `id,last_name,first_name,email`
impl RowRecord for Instructor {
    const KIND: EntityKind = EntityKind::Instructor;

    fn from_fields(fields: &StringRecord) -> Result<Self, MalformedRow> {
        Ok(Instructor {
            id: integer(fields, 0, "id")?,
            last_name: text(fields, 1),
            first_name: text(fields, 2),
            email: text(fields, 3),
        })
    }
}

/// `crn,semester_code,course_id,instructor_id`
impl RowRecord for OfferingRecord {
    const KIND: EntityKind = EntityKind::Offering;

    fn from_fields(fields: &StringRecord) -> Result<Self, MalformedRow> {
        Ok(OfferingRecord {
            crn: integer(fields, 0, "crn")?,
            semester_code: integer(fields, 1, "semester_code")?,
            course_id: integer(fields, 2, "course_id")?,
            instructor_id: integer(fields, 3, "instructor_id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_course() {
        let parser = RowParser::default();
        let course: Course = parser.parse("101,CS,273,Intro to Mobile Dev").unwrap();
        assert_eq!(course, Course::new(101, "CS", "273", "Intro to Mobile Dev"));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let parser = RowParser::default();
        let course: Course = parser.parse("  101 , CS ,273 ,  Intro to Mobile Dev  ").unwrap();
        assert_eq!(course.id, 101);
        assert_eq!(course.alpha, "CS");
        assert_eq!(course.number, "273");
        assert_eq!(course.title, "Intro to Mobile Dev");
    }

    #[test]
    fn test_instructor_file_order() {
        let parser = RowParser::default();
        let instructor: Instructor = parser.parse("55,Lovelace,Ada,ada@example.edu").unwrap();
        assert_eq!(instructor.first_name, "Ada");
        assert_eq!(instructor.last_name, "Lovelace");
        assert_eq!(instructor.email, "ada@example.edu");
    }

    #[test]
    fn test_arity_mismatch() {
        let parser = RowParser::default();
        assert_eq!(
            parser.parse::<Course>("x,y"),
            Err(MalformedRow::Arity { expected: 4, found: 2 })
        );
        assert_eq!(
            parser.parse::<OfferingRecord>("1,2,3,4,5"),
            Err(MalformedRow::Arity { expected: 4, found: 5 })
        );
        assert_eq!(
            parser.parse::<Instructor>(""),
            Err(MalformedRow::Arity { expected: 4, found: 0 })
        );
    }

    #[test]
    fn test_non_numeric_field() {
        let parser = RowParser::default();
        let err = parser.parse::<OfferingRecord>("10001,fall,101,55").unwrap_err();
        assert_eq!(
            err,
            MalformedRow::InvalidNumber {
                column: "semester_code",
                value: "fall".to_string()
            }
        );
        assert!(parser.parse::<Course>("abc,CS,273,Intro").is_err());
    }

    #[test]
    fn test_offering_record() {
        let parser = RowParser::default();
        let record: OfferingRecord = parser.parse("10001,202380,101,55").unwrap();
        assert_eq!(record, OfferingRecord::new(10001, 202380, 101, 55));
    }

    #[test]
    fn test_custom_delimiter() {
        let parser = RowParser::new(b'|');
        let course: Course = parser.parse("7|MATH|180|Calculus, Part 1").unwrap();
        assert_eq!(course.title, "Calculus, Part 1");
        assert!(parser.parse::<Course>("7,MATH,180,Calculus").is_err());
    }

    #[test]
    fn test_quoted_delimiter_still_splits() {
        let parser = RowParser::default();
        let err = parser.parse::<Course>("101,\"CS,273\",x,y").unwrap_err();
        assert_eq!(err, MalformedRow::Arity { expected: 4, found: 5 });

        let course: Course = parser.parse("101,CS,273,\"Intro\"").unwrap();
        assert_eq!(course.title, "\"Intro\"");
    }
}
