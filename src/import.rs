//! Batch importer - line source in, persisted rows out
//!
//! Row-level defects (malformed lines, rows the store refuses) are counted,
//! logged and skipped. Only source-level defects (the source cannot be
//! opened, or a read fails mid-batch) make an import unsuccessful. Rows
//! written before a failure stay written.

use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use rusqlite::Connection;
use serde::Serialize;
use crate::model::{Course, EntityKind, Instructor, OfferingRecord};
use crate::parser::{RowParser, RowRecord};
use crate::source::{FileSource, LineSource};
use crate::storage::{entity, offering, Database};
use crate::Result;

/// Lifecycle of one import call
///
/// `NotStarted -> Opening -> (OpenFailed | Reading) -> (ReadFailed | Done)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    NotStarted,
    Opening,
    OpenFailed,
    Reading,
    ReadFailed,
    Done,
}

impl ImportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportState::OpenFailed | ImportState::ReadFailed | ImportState::Done)
    }
}

/// Why a row did not make it into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowProblem {
    /// Failed arity or numeric parsing
    Malformed,
    /// Parsed, but refused by a storage constraint
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based line number in the source
    pub line: usize,
    pub problem: RowProblem,
    pub detail: String,
}

/// Outcome of importing one source
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub kind: EntityKind,
    pub source: String,
    pub state: ImportState,
    pub imported: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub issues: Vec<RowIssue>,
    /// Source-level failure message, when the state is `OpenFailed` or `ReadFailed`
    pub failure: Option<String>,
}

impl ImportReport {
    fn new(kind: EntityKind, source: String) -> Self {
        Self {
            kind,
            source,
            state: ImportState::NotStarted,
            imported: 0,
            skipped: 0,
            rejected: 0,
            issues: Vec::new(),
            failure: None,
        }
    }

    /// True unless the source itself could not be opened or read
    pub fn succeeded(&self) -> bool {
        self.state == ImportState::Done
    }

    fn record_issue(&mut self, line: usize, problem: RowProblem, detail: String) {
        match problem {
            RowProblem::Malformed => self.skipped += 1,
            RowProblem::Rejected => self.rejected += 1,
        }
        self.issues.push(RowIssue { line, problem, detail });
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} import from {}: {} imported, {} skipped, {} rejected",
            self.kind, self.source, self.imported, self.skipped, self.rejected
        )?;
        if let Some(failure) = &self.failure {
            write!(f, " ({:?}: {})", self.state, failure)?;
        }
        Ok(())
    }
}

/// A parsed record that knows which table it belongs in
trait Importable: RowRecord {
    fn persist(&self, conn: &Connection) -> Result<()>;
}

impl Importable for Course {
    fn persist(&self, conn: &Connection) -> Result<()> {
        entity::insert(conn, self)
    }
}

impl Importable for Instructor {
    fn persist(&self, conn: &Connection) -> Result<()> {
        entity::insert(conn, self)
    }
}

impl Importable for OfferingRecord {
    fn persist(&self, conn: &Connection) -> Result<()> {
        offering::insert(conn, self)
    }
}

/// Drives line sources through the parser into the store
#[derive(Debug)]
pub struct BatchImporter<'db> {
    db: &'db Database,
    parser: RowParser,
}

impl<'db> BatchImporter<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db, parser: RowParser::default() }
    }

    pub fn with_parser(mut self, parser: RowParser) -> Self {
        self.parser = parser;
        self
    }

    /// Import every line of `source` as rows of `kind`.
    ///
    /// Source failures are reported through the returned report's state;
    /// `Err` is reserved for storage failures other than constraint
    /// violations.
    pub fn import_all(&self, source: &dyn LineSource, kind: EntityKind) -> Result<ImportReport> {
        match kind {
            EntityKind::Course => self.run::<Course>(source),
            EntityKind::Instructor => self.run::<Instructor>(source),
            EntityKind::Offering => self.run::<OfferingRecord>(source),
        }
    }

    /// Import `courses.csv`, `instructors.csv` and `offerings.csv` from `dir`,
    /// in that order
    pub fn import_directory(&self, dir: &Path) -> Result<Vec<ImportReport>> {
        EntityKind::all()
            .iter()
            .map(|kind| {
                let source = FileSource::new(dir.join(kind.default_file_name()));
                self.import_all(&source, *kind)
            })
            .collect()
    }

    fn run<T: Importable>(&self, source: &dyn LineSource) -> Result<ImportReport> {
        let mut report = ImportReport::new(T::KIND, source.describe());

        report.state = ImportState::Opening;
        let reader = match source.open() {
            Ok(reader) => reader,
            Err(e) => {
                tracing::error!("Cannot open {} source {}: {}", T::KIND, report.source, e);
                report.state = ImportState::OpenFailed;
                report.failure = Some(e.to_string());
                return Ok(report);
            }
        };

        report.state = ImportState::Reading;
        self.db.with_connection(|conn| self.read_rows::<T>(conn, reader, &mut report))?;

        tracing::info!("{}", report);
        Ok(report)
    }

    fn read_rows<T: Importable>(
        &self,
        conn: &Connection,
        mut reader: Box<dyn BufRead + '_>,
        report: &mut ImportReport,
    ) -> Result<()> {
        let mut buf = Vec::new();
        let mut line_number = 0;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => line_number += 1,
                Err(e) => {
                    tracing::error!("Read failed in {} at line {}: {}", report.source, line_number + 1, e);
                    report.state = ImportState::ReadFailed;
                    report.failure = Some(e.to_string());
                    return Ok(());
                }
            }
            let line = decode_line(&buf);

            let record = match self.parser.parse::<T>(&line) {
                Ok(record) => record,
                Err(malformed) => {
                    tracing::warn!("Skipping bad CSV row {}:{}: {} ({:?})", report.source, line_number, malformed, line);
                    report.record_issue(line_number, RowProblem::Malformed, malformed.to_string());
                    continue;
                }
            };

            match record.persist(conn) {
                Ok(()) => {
                    tracing::debug!("Imported {} from line {}", T::KIND, line_number);
                    report.imported += 1;
                }
                Err(e) if e.is_constraint_violation() => {
                    tracing::warn!("Rejected row {}:{}: {}", report.source, line_number, e);
                    report.record_issue(line_number, RowProblem::Rejected, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        report.state = ImportState::Done;
        Ok(())
    }
}

/// Strip the line terminator; bytes that are not UTF-8 become U+FFFD
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
