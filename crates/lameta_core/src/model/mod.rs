//! Read-only project snapshot model.
//!
//! # Responsibility
//! - Define the serde shape of the metadata store handed to the exporter.
//! - Offer typed field access (`text`, `has_value`) over property bags.
//!
//! # Invariants
//! - Snapshots are inputs only; export never writes back.

pub mod project;
pub mod properties;

pub use project::{
    AccessChoice, ArchiveConfiguration, Contribution, FileRecord, Person, Project, Session,
    ARCHIVE_CONFIGURATION_KEY,
};
pub use properties::{FieldValue, Properties};
