//! RO-Crate export use cases.
//!
//! # Responsibility
//! - Own the catalogs and the license manager across exports.
//! - Provide collection, session and person export entry points, optionally
//!   followed by a validator pass.
//!
//! # Invariants
//! - An invalid document is still returned; validation only reports.
//! - File licenses recorded by one export stay cached until [`RoCrateExporter::reset`].

use crate::catalog::{CatalogError, FieldCatalog};
use crate::graph::{BuildOptions, GraphBuilder, GraphError};
use crate::license::LicenseManager;
use crate::model::Project;
use crate::validation::{DocumentValidator, ValidationReport, ValidationRequest, GRAPH_INTEGRITY_SCHEMA};
use crate::vocabulary::{VocabularyCatalog, VocabularyError};
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Export failure.
#[derive(Debug)]
pub enum ExportError {
    Catalog(CatalogError),
    Vocabulary(VocabularyError),
    Graph(GraphError),
    /// No session or person with the requested file prefix.
    NotFound(String),
    Serialize(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Vocabulary(err) => write!(f, "{err}"),
            Self::Graph(err) => write!(f, "graph assembly failed: {err}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Serialize(err) => write!(f, "failed to serialize document: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Vocabulary(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<CatalogError> for ExportError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<VocabularyError> for ExportError {
    fn from(value: VocabularyError) -> Self {
        Self::Vocabulary(value)
    }
}

impl From<GraphError> for ExportError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Caller-controlled clock and correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// RFC 3339 timestamp written to every `datePublished`.
    pub date_published: String,
    pub run_id: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            date_published: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl ExportOptions {
    /// Options with a fixed publication date, for reproducible output.
    pub fn with_date(date_published: impl Into<String>) -> Self {
        Self {
            date_published: date_published.into(),
            ..Self::default()
        }
    }
}

/// Exported document plus the validator report, when one was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub document: Value,
    pub report: Option<ValidationReport>,
}

/// What one export call builds.
#[derive(Debug, Clone, Copy)]
enum Target<'p> {
    Collection,
    Session(&'p str),
    Person(&'p str),
}

impl Target<'_> {
    fn kind(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Session(_) => "session",
            Self::Person(_) => "person",
        }
    }
}

/// Stateful RO-Crate exporter.
pub struct RoCrateExporter {
    catalog: FieldCatalog,
    vocabularies: VocabularyCatalog,
    licenses: LicenseManager,
}

impl RoCrateExporter {
    /// Exporter over the built-in field catalog and vocabularies.
    ///
    /// # Errors
    /// - Returns an error when an embedded catalog fails to parse.
    pub fn new() -> ExportResult<Self> {
        Ok(Self::with_catalogs(
            FieldCatalog::builtin()?,
            VocabularyCatalog::builtin()?,
        ))
    }

    pub fn with_catalogs(catalog: FieldCatalog, vocabularies: VocabularyCatalog) -> Self {
        Self {
            catalog,
            vocabularies,
            licenses: LicenseManager::new(),
        }
    }

    /// Drops cached file licenses.
    pub fn reset(&mut self) {
        self.licenses.clear();
    }

    pub fn licenses(&self) -> &LicenseManager {
        &self.licenses
    }

    /// Collection crate for the whole project.
    pub fn export_project(&mut self, project: &Project, options: &ExportOptions) -> ExportResult<Value> {
        self.run(project, Target::Collection, options)
    }

    /// Crate rooted at the session with `file_prefix`.
    pub fn export_session(
        &mut self,
        project: &Project,
        file_prefix: &str,
        options: &ExportOptions,
    ) -> ExportResult<Value> {
        self.run(project, Target::Session(file_prefix), options)
    }

    /// Crate rooted at the person with `file_prefix`.
    pub fn export_person(
        &mut self,
        project: &Project,
        file_prefix: &str,
        options: &ExportOptions,
    ) -> ExportResult<Value> {
        self.run(project, Target::Person(file_prefix), options)
    }

    pub fn export_project_validated(
        &mut self,
        project: &Project,
        options: &ExportOptions,
        validator: &dyn DocumentValidator,
    ) -> ExportResult<ExportOutcome> {
        let document = self.export_project(project, options)?;
        validated(document, validator, options)
    }

    pub fn export_session_validated(
        &mut self,
        project: &Project,
        file_prefix: &str,
        options: &ExportOptions,
        validator: &dyn DocumentValidator,
    ) -> ExportResult<ExportOutcome> {
        let document = self.export_session(project, file_prefix, options)?;
        validated(document, validator, options)
    }

    pub fn export_person_validated(
        &mut self,
        project: &Project,
        file_prefix: &str,
        options: &ExportOptions,
        validator: &dyn DocumentValidator,
    ) -> ExportResult<ExportOutcome> {
        let document = self.export_person(project, file_prefix, options)?;
        validated(document, validator, options)
    }

    fn run(&mut self, project: &Project, target: Target<'_>, options: &ExportOptions) -> ExportResult<Value> {
        let started_at = Instant::now();
        info!(
            "event=export_start module=export status=start kind={} run_id={}",
            target.kind(),
            options.run_id
        );
        let builder = GraphBuilder::new(
            project,
            &self.catalog,
            &self.vocabularies,
            &mut self.licenses,
            BuildOptions {
                date_published: options.date_published.clone(),
                run_id: options.run_id.clone(),
            },
        );
        let result = match target {
            Target::Collection => builder.build_collection().map_err(ExportError::from),
            Target::Session(prefix) => match project.find_session(prefix) {
                Some(session) => builder.build_session_export(session).map_err(ExportError::from),
                None => Err(ExportError::NotFound(format!("session `{prefix}`"))),
            },
            Target::Person(prefix) => match project.find_person_by_prefix(prefix) {
                Some(person) => builder.build_person_export(person).map_err(ExportError::from),
                None => Err(ExportError::NotFound(format!("person `{prefix}`"))),
            },
        };

        match &result {
            Ok(document) => info!(
                "event=export_finish module=export status=ok kind={} run_id={} entities={} duration_ms={}",
                target.kind(),
                options.run_id,
                document
                    .get("@graph")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=export_finish module=export status=error kind={} run_id={} error_kind={}",
                target.kind(),
                options.run_id,
                error_kind(err)
            ),
        }
        result
    }
}

fn validated(
    document: Value,
    validator: &dyn DocumentValidator,
    options: &ExportOptions,
) -> ExportResult<ExportOutcome> {
    let request = ValidationRequest::new(
        serde_json::to_string_pretty(&document)?,
        GRAPH_INTEGRITY_SCHEMA,
    );
    let report = validator.validate(&request);
    info!(
        "event=validation_finish module=export status={} run_id={} errors={} warnings={}",
        if report.valid { "ok" } else { "invalid" },
        options.run_id,
        report.errors.len(),
        report.warnings.len()
    );
    Ok(ExportOutcome {
        document,
        report: Some(report),
    })
}

fn error_kind(err: &ExportError) -> &'static str {
    match err {
        ExportError::Catalog(_) => "catalog",
        ExportError::Vocabulary(_) => "vocabulary",
        ExportError::Graph(_) => "graph",
        ExportError::NotFound(_) => "not_found",
        ExportError::Serialize(_) => "serialize",
    }
}
