//! Line sources - where raw import text comes from
//!
//! The importer only needs something it can open and read line by line.
//! Opening is part of the import so that an unavailable source is reported
//! by the import call itself.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::PathBuf;

/// A sequential producer of raw text lines
pub trait LineSource {
    /// Human-readable name used in diagnostics
    fn describe(&self) -> String;

    /// Open the source for reading from the beginning
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;
}

/// A file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory text
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    text: String,
}

impl TextSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl LineSource for TextSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.text.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_source_lines() {
        let source = TextSource::new("inline", "a\nb\n");
        let lines: Vec<String> = source.open().unwrap().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(source.describe(), "inline");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.csv"));
        assert!(source.open().is_err());
    }
}
