//! Coursedb CLI - import and browse the course catalog

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use coursedb::config::{self, CoursedbConfig};
use coursedb::import::{BatchImporter, ImportReport};
use coursedb::source::FileSource;
use coursedb::storage::{DanglingPolicy, Database};
use coursedb::ui::{self, ColorMode, Icons};
use coursedb::EntityKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "coursedb")]
#[command(version)]
#[command(about = "Relational course catalog - CSV import into SQLite")]
#[command(long_about = r#"
Coursedb loads three CSV files into a SQLite catalog:
  • courses.csv      id,alpha,number,title
  • instructors.csv  id,last_name,first_name,email
  • offerings.csv    crn,semester_code,course_id,instructor_id

Malformed rows are skipped with a warning; an import only fails when a file
cannot be opened or read.

Example usage:
  coursedb import --data-dir ./assets
  coursedb list offerings
  coursedb stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// When to color output (overrides the config file)
    #[arg(long, global = true, value_enum)]
    color: Option<ColorMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import courses, instructors and offerings (starts from an empty database)
    Import {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory holding the CSV files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep the existing database instead of starting fresh
        #[arg(long)]
        keep: bool,

        /// Print every imported entity afterwards
        #[arg(long)]
        show: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List one kind of entity
    List {
        /// courses, instructors or offerings
        kind: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Leave out offerings whose course or instructor is missing
        #[arg(long)]
        skip_dangling: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show row counts
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Write a default coursedb.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    ui::init_theme(cli.color.unwrap_or(config.color));

    match cli.command {
        Commands::Import { database, data_dir, keep, show, format } => {
            let mut config = config;
            if let Some(dir) = data_dir {
                config.data_dir = Some(dir.to_string_lossy().to_string());
            }
            let db_path = resolve_database(database, &config)?;
            run_import(&config, &db_path, keep, show, format)?;
        }

        Commands::List { kind, database, skip_dangling, format } => {
            let kind: EntityKind = kind.parse()?;
            let db_path = resolve_database(database, &config)?;
            let db = Database::open_with(&db_path, config.database_options())?;
            let policy = if skip_dangling { DanglingPolicy::Skip } else { config.dangling };
            print_listing(&db, kind, policy, format)?;
        }

        Commands::Stats { database, format } => {
            let db_path = resolve_database(database, &config)?;
            let db = Database::open_with(&db_path, config.database_options())?;
            let stats = db.stats()?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Text => {
                    ui::header(&format!("{} Catalog {}", Icons::STATS, db_path.display()));
                    println!("{}", ui::stats_table(&stats));
                }
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &CoursedbConfig::default(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

/// Command-line flag, then config file, then `.coursedb/catalog.db`
fn resolve_database(flag: Option<PathBuf>, config: &CoursedbConfig) -> anyhow::Result<PathBuf> {
    let path = match flag {
        Some(path) => path,
        None => match &config.database {
            Some(path) => PathBuf::from(path),
            None => config::default_database_path_in(&std::env::current_dir()?),
        },
    };
    config::ensure_db_dir(&path)?;
    Ok(path)
}

fn run_import(config: &CoursedbConfig, db_path: &Path, keep: bool, show: bool, format: Format) -> anyhow::Result<()> {
    if !keep && Database::destroy(db_path)? {
        tracing::info!("Removed previous database {}", db_path.display());
    }

    let db = Database::open_with(db_path, config.database_options())?;
    let importer = BatchImporter::new(&db).with_parser(config.row_parser()?);

    if format == Format::Text {
        ui::header("Importing course catalog");
        ui::info(&format!("{} Database", Icons::DATABASE), &db_path.display().to_string());
    }

    let mut reports: Vec<ImportReport> = Vec::new();
    for kind in EntityKind::all() {
        let source = FileSource::new(config.source_path(*kind));
        let report = importer.import_all(&source, *kind)?;
        if format == Format::Text {
            ui::import_report(&report);
        }
        reports.push(report);
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => {
            let stats = db.stats()?;
            println!("{}", ui::stats_table(&stats));
            if stats.dangling > 0 {
                ui::warn(&format!("{} offering(s) reference a missing course or instructor", stats.dangling));
            }
            if show {
                for kind in EntityKind::all() {
                    print_listing(&db, *kind, config.dangling, Format::Text)?;
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} import(s) failed", failed, reports.len());
    }
    if format == Format::Text {
        ui::success("Import complete");
    }
    Ok(())
}

fn print_listing(db: &Database, kind: EntityKind, policy: DanglingPolicy, format: Format) -> anyhow::Result<()> {
    let (json, table) = match kind {
        EntityKind::Course => {
            let courses = db.courses().get_all()?;
            (serde_json::to_value(&courses)?, ui::course_table(&courses))
        }
        EntityKind::Instructor => {
            let instructors = db.instructors().get_all()?;
            (serde_json::to_value(&instructors)?, ui::instructor_table(&instructors))
        }
        EntityKind::Offering => {
            let offerings = db.offerings().with_policy(policy).get_all()?;
            (serde_json::to_value(&offerings)?, ui::offering_table(&offerings))
        }
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&json)?),
        Format::Text => {
            let icon = match kind {
                EntityKind::Course => Icons::BOOK,
                EntityKind::Instructor => Icons::PERSON,
                EntityKind::Offering => Icons::LINK,
            };
            ui::section(&format!(" {} {}s ", icon, kind));
            if table.is_empty() {
                println!("{} No {}s found.", Icons::EMPTY, kind);
            } else {
                println!("{}", table);
            }
        }
    }
    Ok(())
}
