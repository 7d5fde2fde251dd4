//! Database schema definitions and version handling
//!
//! The schema version lives in `PRAGMA user_version`. Any change of version,
//! in either direction, drops all three tables and recreates them empty.

use rusqlite::Connection;
use crate::Result;

pub const COURSES_TABLE: &str = "Courses";
pub const INSTRUCTORS_TABLE: &str = "Instructors";
pub const OFFERINGS_TABLE: &str = "Offerings";

/// SQL to create the courses table
pub const CREATE_COURSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS Courses (
    id INTEGER PRIMARY KEY,
    alpha TEXT,
    number TEXT,
    title TEXT
)
"#;

/// SQL to create the instructors table
pub const CREATE_INSTRUCTORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS Instructors (
    id INTEGER PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    email TEXT
)
"#;

/// SQL to create the offerings table
/// Both references are declared; enforcement depends on `PRAGMA foreign_keys`
pub const CREATE_OFFERINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS Offerings (
    crn INTEGER,
    semester_code INTEGER,
    course_id INTEGER,
    instructor_id INTEGER,
    FOREIGN KEY (course_id) REFERENCES Courses (id),
    FOREIGN KEY (instructor_id) REFERENCES Instructors (id)
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_offerings_crn ON Offerings(crn)",
];

/// All schema creation statements, referenced tables first
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_COURSES_TABLE,
        CREATE_INSTRUCTORS_TABLE,
        CREATE_OFFERINGS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// Tables in drop order (referencing table first)
pub const DROP_ORDER: &[&str] = &[OFFERINGS_TABLE, INSTRUCTORS_TABLE, COURSES_TABLE];

/// What `migrate` did to bring the schema to the requested version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    Created,
    Unchanged,
    Rebuilt { from: u32, to: u32 },
}

/// Create any missing tables and stamp the schema version
pub fn initialize(conn: &Connection, version: u32) -> Result<()> {
    for stmt in all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Drop every table and recreate the schema at `new_version`.
///
/// Nothing is carried across versions.
pub fn upgrade(conn: &Connection, old_version: u32, new_version: u32) -> Result<()> {
    tracing::info!("Rebuilding schema: version {} -> {}", old_version, new_version);
    let tx = conn.unchecked_transaction()?;
    for table in DROP_ORDER {
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    }
    initialize(&tx, new_version)?;
    tx.commit()?;
    Ok(())
}

/// Version currently stamped on the database (0 for a brand-new file)
pub fn stored_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Bring the database to `target`, creating or rebuilding as needed
pub fn migrate(conn: &Connection, target: u32) -> Result<SchemaAction> {
    let current = stored_version(conn)?;
    if current == 0 {
        initialize(conn, target)?;
        return Ok(SchemaAction::Created);
    }
    if current == target {
        initialize(conn, target)?;
        return Ok(SchemaAction::Unchanged);
    }
    upgrade(conn, current, target)?;
    Ok(SchemaAction::Rebuilt { from: current, to: target })
}

/// Names of the user tables that currently exist
pub fn existing_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 1).unwrap();

        assert_eq!(existing_tables(&conn).unwrap(), vec!["Courses", "Instructors", "Offerings"]);
        assert_eq!(stored_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 1).unwrap();
        conn.execute("INSERT INTO Courses (id, alpha, number, title) VALUES (1, 'CS', '100', 'Intro')", []).unwrap();
        initialize(&conn, 1).unwrap();
        assert_eq!(count(&conn, COURSES_TABLE), 1);
    }

    #[test]
    fn test_upgrade_empties_every_table() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 1).unwrap();
        conn.execute("INSERT INTO Courses (id, alpha, number, title) VALUES (1, 'CS', '100', 'Intro')", []).unwrap();
        conn.execute("INSERT INTO Instructors (id, first_name, last_name, email) VALUES (2, 'A', 'B', 'c@d')", []).unwrap();
        conn.execute("INSERT INTO Offerings (crn, semester_code, course_id, instructor_id) VALUES (3, 4, 1, 2)", []).unwrap();

        upgrade(&conn, 1, 2).unwrap();

        assert_eq!(existing_tables(&conn).unwrap(), vec!["Courses", "Instructors", "Offerings"]);
        for table in DROP_ORDER {
            assert_eq!(count(&conn, table), 0);
        }
        assert_eq!(stored_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_upgrade_with_foreign_keys_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        initialize(&conn, 1).unwrap();
        conn.execute("INSERT INTO Courses (id, alpha, number, title) VALUES (1, 'CS', '100', 'Intro')", []).unwrap();
        conn.execute("INSERT INTO Instructors (id, first_name, last_name, email) VALUES (2, 'A', 'B', 'c@d')", []).unwrap();
        conn.execute("INSERT INTO Offerings (crn, semester_code, course_id, instructor_id) VALUES (3, 4, 1, 2)", []).unwrap();

        upgrade(&conn, 1, 5).unwrap();
        assert_eq!(count(&conn, OFFERINGS_TABLE), 0);
    }

    #[test]
    fn test_migrate_actions() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&conn, 1).unwrap(), SchemaAction::Created);
        assert_eq!(migrate(&conn, 1).unwrap(), SchemaAction::Unchanged);
        assert_eq!(migrate(&conn, 3).unwrap(), SchemaAction::Rebuilt { from: 1, to: 3 });
        assert_eq!(migrate(&conn, 2).unwrap(), SchemaAction::Rebuilt { from: 3, to: 2 });
    }
}
