//! RO-Crate graph assembly.
//!
//! # Responsibility
//! - Walk a project snapshot and emit a JSON-LD document that follows the
//!   LDAC profile.
//! - Keep per-export state (languages, term sets, material types, emitted
//!   persons) inside one [`GraphBuilder`].
//!
//! # Invariants
//! - Every `@id` in `@graph` is unique; data entities are strict-inserted.
//! - Supporting vocabularies are emitted only when something references them.
//! - Output depends only on the snapshot and [`BuildOptions`].

pub mod assembler;
pub mod entity_map;
pub mod fields;
pub mod files;
pub mod people;
pub mod places;
pub mod sessions;

use crate::catalog::FieldCatalog;
use crate::language::LanguageRegistry;
use crate::license::LicenseManager;
use crate::model::Project;
use crate::template::TemplateError;
use crate::vocabulary::{TermSetUsage, VocabularyCatalog};
use entity_map::EntityMap;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use entity_map::dedupe_has_part;

/// One JSON-LD node.
pub type Entity = Map<String, Value>;

pub const METADATA_DESCRIPTOR_ID: &str = "ro-crate-metadata.json";
pub const RO_CRATE_CONFORMS_TO: &str = "https://w3id.org/ro/crate/1.1";
pub const LDAC_COLLECTION_PROFILE: &str = "https://w3id.org/ldac/profile#Collection";
pub const LDAC_OBJECT_PROFILE: &str = "https://w3id.org/ldac/profile#Object";

/// Graph construction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An entity reached the store without `@id`.
    MissingId,
    /// Two different entities claimed the same `@id`.
    DuplicateEntity(String),
    /// A catalog template produced no usable entity.
    Template(TemplateError),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "entity has no @id"),
            Self::DuplicateEntity(id) => write!(f, "conflicting entities share @id `{id}`"),
            Self::Template(err) => write!(f, "template error: {err}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for GraphError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Clock and correlation values injected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// RFC 3339 timestamp written to every `datePublished`.
    pub date_published: String,
    /// Correlates log events of one export.
    pub run_id: String,
}

/// `{"@id": id}`.
pub fn reference(id: &str) -> Value {
    json!({ "@id": id })
}

pub fn entity_id(entity: &Entity) -> Option<&str> {
    entity.get("@id").and_then(Value::as_str)
}

/// True when `@type` equals or contains `wanted`.
pub fn has_type(entity: &Entity, wanted: &str) -> bool {
    match entity.get("@type") {
        Some(Value::String(kind)) => kind == wanted,
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Appends a reference to `property`, keeping it an array and skipping repeats.
pub fn append_reference(entity: &mut Entity, property: &str, id: &str) {
    let new_reference = reference(id);
    let slot = entity
        .entry(property.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        let previous = slot.take();
        *slot = Value::Array(vec![previous]);
    }
    if let Value::Array(items) = slot {
        if !items.contains(&new_reference) {
            items.push(new_reference);
        }
    }
}

/// JSON-LD `@context` of every exported crate.
pub fn rocrate_context() -> Value {
    json!([
        "https://w3id.org/ro/crate/1.1/context",
        "https://w3id.org/ldac/context",
        {
            "pcdm": "http://pcdm.org/models#",
            "ldac": "https://w3id.org/ldac/terms#",
            "dct": "http://purl.org/dc/terms/"
        }
    ])
}

/// The `ro-crate-metadata.json` descriptor node.
pub fn metadata_descriptor() -> Entity {
    let mut descriptor = Map::new();
    descriptor.insert("@id".into(), json!(METADATA_DESCRIPTOR_ID));
    descriptor.insert("@type".into(), json!("CreativeWork"));
    descriptor.insert("conformsTo".into(), reference(RO_CRATE_CONFORMS_TO));
    descriptor.insert("about".into(), reference("./"));
    descriptor
}

/// Per-export assembly state.
///
/// A builder is consumed by one `build_*` call; the license manager outlives
/// it and is owned by the exporter.
pub struct GraphBuilder<'a> {
    pub(crate) project: &'a Project,
    pub(crate) catalog: &'a FieldCatalog,
    pub(crate) vocabularies: &'a VocabularyCatalog,
    pub(crate) licenses: &'a mut LicenseManager,
    pub(crate) options: BuildOptions,
    pub(crate) languages: LanguageRegistry,
    pub(crate) entities: EntityMap,
    pub(crate) term_sets: TermSetUsage,
    pub(crate) materials: BTreeSet<String>,
    pub(crate) extra_access: Vec<String>,
    /// License ids placed on session files during this build.
    pub(crate) file_license_ids: BTreeSet<String>,
    /// Person id to the id of the dataset grouping that person's files.
    pub(crate) person_datasets: BTreeMap<String, String>,
    pub(crate) emitted_persons: BTreeSet<String>,
    /// Group person files under `#<prefix>-files` datasets (collection export).
    pub(crate) group_person_files: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        project: &'a Project,
        catalog: &'a FieldCatalog,
        vocabularies: &'a VocabularyCatalog,
        licenses: &'a mut LicenseManager,
        options: BuildOptions,
    ) -> Self {
        Self {
            project,
            catalog,
            vocabularies,
            licenses,
            options,
            languages: LanguageRegistry::new(catalog.language_template().cloned()),
            entities: EntityMap::new(),
            term_sets: TermSetUsage::default(),
            materials: BTreeSet::new(),
            extra_access: Vec::new(),
            file_license_ids: BTreeSet::new(),
            person_datasets: BTreeMap::new(),
            emitted_persons: BTreeSet::new(),
            group_person_files: false,
        }
    }

    /// Wraps a root node and the collected entities into a JSON-LD document.
    pub(crate) fn finish(self, mut root: Entity) -> Value {
        dedupe_has_part(&mut root);
        let mut graph = vec![Value::Object(root)];
        graph.extend(self.entities.into_graph());
        json!({
            "@context": rocrate_context(),
            "@graph": graph
        })
    }
}
