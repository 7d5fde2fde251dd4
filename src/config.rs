use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::model::EntityKind;
use crate::parser::RowParser;
use crate::storage::{DanglingPolicy, DatabaseOptions, SCHEMA_VERSION};
use crate::ui::ColorMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursedbConfig {
    pub database: Option<String>,
    /// Directory the three CSV files are read from
    pub data_dir: Option<String>,
    pub courses: String,
    pub instructors: String,
    pub offerings: String,
    pub delimiter: char,
    pub schema_version: u32,
    pub enforce_foreign_keys: bool,
    pub dangling: DanglingPolicy,
    pub color: ColorMode,
}

impl Default for CoursedbConfig {
    fn default() -> Self {
        Self {
            database: None,
            data_dir: None,
            courses: EntityKind::Course.default_file_name().to_string(),
            instructors: EntityKind::Instructor.default_file_name().to_string(),
            offerings: EntityKind::Offering.default_file_name().to_string(),
            delimiter: ',',
            schema_version: SCHEMA_VERSION,
            enforce_foreign_keys: false,
            dangling: DanglingPolicy::Fail,
            color: ColorMode::Auto,
        }
    }
}

impl CoursedbConfig {
    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            schema_version: self.schema_version,
            enforce_foreign_keys: self.enforce_foreign_keys,
            dangling: self.dangling,
        }
    }

    /// The delimiter must be a single ASCII byte
    pub fn row_parser(&self) -> anyhow::Result<RowParser> {
        if !self.delimiter.is_ascii() {
            anyhow::bail!("delimiter must be an ASCII character, got {:?}", self.delimiter);
        }
        Ok(RowParser::new(self.delimiter as u8))
    }

    pub fn file_name(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Course => &self.courses,
            EntityKind::Instructor => &self.instructors,
            EntityKind::Offering => &self.offerings,
        }
    }

    /// Path of the source file for `kind`, relative to `data_dir` when set
    pub fn source_path(&self, kind: EntityKind) -> PathBuf {
        let name = self.file_name(kind);
        match &self.data_dir {
            Some(dir) => Path::new(dir).join(name),
            None => PathBuf::from(name),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("coursedb.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".coursedb").join("catalog.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CoursedbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CoursedbConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CoursedbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("coursedb.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coursedb.toml");
        std::fs::write(&path, "data_dir = \"assets\"\ndangling = \"skip\"\ncolor = \"never\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.data_dir.as_deref(), Some("assets"));
        assert_eq!(config.dangling, DanglingPolicy::Skip);
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.source_path(EntityKind::Offering), Path::new("assets").join("offerings.csv"));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coursedb.toml");
        let config = CoursedbConfig {
            database: Some("occ.db".to_string()),
            enforce_foreign_keys: true,
            ..CoursedbConfig::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap().unwrap(), config);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let config = CoursedbConfig { delimiter: '§', ..CoursedbConfig::default() };
        assert!(config.row_parser().is_err());

        let config = CoursedbConfig { delimiter: ';', ..CoursedbConfig::default() };
        assert_eq!(config.row_parser().unwrap().delimiter(), b';');
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = default_database_path_in(dir.path());
        ensure_db_dir(&db_path).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }
}
