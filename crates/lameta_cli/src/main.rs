//! `lameta-rocrate`: export a lameta project snapshot as an RO-Crate.
//!
//! # Responsibility
//! - Read the snapshot JSON and fill missing file sizes and timestamps from
//!   the file system.
//! - Write `ro-crate-metadata.json` and `ro-crate-preview.html` into `--out`.
//!
//! # Invariants
//! - Only this binary touches the file system; `lameta_core` stays pure.
//! - Exit code 0 means files were written and, with `--validate`, the
//!   document passed; 2 means it was written but failed validation.

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use lameta_core::{
    generate_rocrate_html, init_logging, ExportError, ExportOptions, ExportOutcome, FileRecord,
    GraphIntegrityValidator, LoggingError, Project, RoCrateExporter,
};
use log::{info, warn};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;

const METADATA_FILE_NAME: &str = "ro-crate-metadata.json";
const PREVIEW_FILE_NAME: &str = "ro-crate-preview.html";

#[derive(Parser, Debug)]
#[command(name = "lameta-rocrate", version = lameta_core::core_version())]
#[command(about = "Export a lameta project snapshot as an LDAC RO-Crate")]
struct Cli {
    /// Project snapshot JSON
    snapshot: PathBuf,

    /// Output directory, created when missing
    #[arg(short, long)]
    out: PathBuf,

    /// Export a single session by file prefix
    #[arg(long, conflicts_with = "person")]
    session: Option<String>,

    /// Export a single person by file prefix
    #[arg(long)]
    person: Option<String>,

    /// Skip ro-crate-preview.html
    #[arg(long)]
    no_html: bool,

    /// Run the graph-integrity check and print the report to stderr
    #[arg(long)]
    validate: bool,

    /// Fixed RFC 3339 publication date, for reproducible output
    #[arg(long)]
    date_published: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "LAMETA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when unset
    #[arg(long, env = "LAMETA_LOG_DIR")]
    log_dir: Option<String>,
}

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Io { path: PathBuf, source: std::io::Error },
    Snapshot(serde_json::Error),
    Export(ExportError),
    Serialize(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Snapshot(err) => write!(f, "invalid project snapshot: {err}"),
            Self::Export(err) => write!(f, "export failed: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize output: {err}"),
        }
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the document was written but failed validation.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(lameta_core::default_log_level());
    init_logging(level, cli.log_dir.as_deref()).map_err(CliError::Logging)?;

    let mut project = read_snapshot(&cli.snapshot)?;
    let base_dir = cli
        .snapshot
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    fill_file_metadata(&mut project, &base_dir);

    let options = match &cli.date_published {
        Some(date) => ExportOptions::with_date(date.clone()),
        None => ExportOptions::default(),
    };
    let mut exporter = RoCrateExporter::new()?;
    let outcome = if cli.validate {
        let validator = GraphIntegrityValidator;
        match (&cli.session, &cli.person) {
            (Some(prefix), _) => {
                exporter.export_session_validated(&project, prefix, &options, &validator)?
            }
            (None, Some(prefix)) => {
                exporter.export_person_validated(&project, prefix, &options, &validator)?
            }
            (None, None) => exporter.export_project_validated(&project, &options, &validator)?,
        }
    } else {
        let document = match (&cli.session, &cli.person) {
            (Some(prefix), _) => exporter.export_session(&project, prefix, &options)?,
            (None, Some(prefix)) => exporter.export_person(&project, prefix, &options)?,
            (None, None) => exporter.export_project(&project, &options)?,
        };
        ExportOutcome {
            document,
            report: None,
        }
    };

    write_outputs(cli, &outcome)?;

    let Some(report) = &outcome.report else {
        return Ok(true);
    };
    let rendered = serde_json::to_string_pretty(report).map_err(CliError::Serialize)?;
    eprintln!("{rendered}");
    if !report.valid {
        warn!(
            "event=cli_validation module=cli status=invalid run_id={} errors={}",
            options.run_id,
            report.errors.len()
        );
    }
    Ok(report.valid)
}

fn read_snapshot(path: &Path) -> Result<Project, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(CliError::Snapshot)
}

fn write_outputs(cli: &Cli, outcome: &ExportOutcome) -> Result<(), CliError> {
    fs::create_dir_all(&cli.out).map_err(|source| CliError::Io {
        path: cli.out.clone(),
        source,
    })?;

    let metadata = serde_json::to_string_pretty(&outcome.document).map_err(CliError::Serialize)?;
    write_file(&cli.out.join(METADATA_FILE_NAME), &metadata)?;
    if !cli.no_html {
        write_file(
            &cli.out.join(PREVIEW_FILE_NAME),
            &generate_rocrate_html(&outcome.document),
        )?;
    }
    info!("event=cli_write module=cli status=ok html={}", !cli.no_html);
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Fills size and timestamps the snapshot left empty. Missing files are
/// skipped; the export still lists them.
fn fill_file_metadata(project: &mut Project, base_dir: &Path) {
    let mut missing = 0usize;
    let folders = project
        .sessions
        .iter_mut()
        .flat_map(|session| session.files.iter_mut())
        .chain(project.people.iter_mut().flat_map(|person| person.files.iter_mut()))
        .chain(project.files.iter_mut())
        .chain(project.description_documents.iter_mut())
        .chain(project.other_documents.iter_mut());
    for file in folders {
        if !stat_into(file, base_dir) {
            missing += 1;
        }
    }
    if missing > 0 {
        warn!("event=file_stat module=cli status=missing count={missing}");
    }
}

fn stat_into(file: &mut FileRecord, base_dir: &Path) -> bool {
    let raw = file.path.strip_prefix("file://").unwrap_or(&file.path);
    let path = Path::new(raw);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    let Ok(metadata) = fs::metadata(&path) else {
        return false;
    };
    if file.size.is_none() {
        file.size = Some(metadata.len());
    }
    if file.date_created.is_none() {
        file.date_created = metadata.created().ok().map(rfc3339);
    }
    if file.date_modified.is_none() {
        file.date_modified = metadata.modified().ok().map(rfc3339);
    }
    true
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}
