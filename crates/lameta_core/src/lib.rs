//! RO-Crate export engine for lameta projects.
//!
//! Turns a project snapshot (sessions, people, documents) into an LDAC-profile
//! JSON-LD graph and a static HTML preview.

pub mod catalog;
pub mod contributor;
pub mod export;
pub mod graph;
pub mod html;
pub mod iri;
pub mod language;
pub mod license;
pub mod logging;
pub mod material;
pub mod model;
pub mod template;
pub mod validation;
pub mod vocabulary;

pub use catalog::{CatalogError, FieldCatalog, FieldDefinition, FieldScope};
pub use export::{ExportError, ExportOptions, ExportOutcome, ExportResult, RoCrateExporter};
pub use graph::{BuildOptions, Entity, GraphBuilder, GraphError, GraphResult};
pub use html::generate_rocrate_html;
pub use license::LicenseManager;
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::{
    AccessChoice, ArchiveConfiguration, Contribution, FieldValue, FileRecord, Person, Project,
    Properties, Session,
};
pub use validation::{
    DocumentValidator, GraphIntegrityValidator, ValidationIssue, ValidationReport,
    ValidationRequest, GRAPH_INTEGRITY_SCHEMA,
};
pub use vocabulary::{VocabularyCatalog, VocabularyError};

/// Version stamped into log lines and the CLI `--version` output.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(core_version().split('.').count(), 3);
    }
}
