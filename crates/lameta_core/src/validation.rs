//! Validation boundary for exported documents.
//!
//! # Responsibility
//! - Define the seam an external schema validator plugs into.
//! - Ship a built-in graph-integrity check used by tests and the CLI.
//!
//! # Invariants
//! - Validation never fails; problems are reported, not raised.
//! - `valid` is true exactly when `errors` is empty.

use crate::graph::{has_type, METADATA_DESCRIPTOR_ID};
use crate::iri::{is_external_reference, ROOT_ID};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Schema name answered by [`GraphIntegrityValidator`].
pub const GRAPH_INTEGRITY_SCHEMA: &str = "lameta:graph-integrity";

const FILE_TYPES: [&str; 5] = [
    "File",
    "AudioObject",
    "VideoObject",
    "ImageObject",
    "DigitalDocument",
];
const OBJECT_TYPES: [&str; 4] = ["RepositoryObject", "pcdm:Object", "Event", "CollectionEvent"];

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    /// 1-based line in the serialized document, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Serialized document plus the schema it should satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub document: String,
    pub schema: String,
}

impl ValidationRequest {
    pub fn new(document: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            schema: schema.into(),
        }
    }
}

/// External validator seam.
pub trait DocumentValidator {
    fn validate(&self, request: &ValidationRequest) -> ValidationReport;
}

/// Checks referential closure, id uniqueness and LDAC basics.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphIntegrityValidator;

impl DocumentValidator for GraphIntegrityValidator {
    fn validate(&self, request: &ValidationRequest) -> ValidationReport {
        let document: Value = match serde_json::from_str(&request.document) {
            Ok(document) => document,
            Err(err) => {
                return ValidationReport::from_issues(
                    vec![ValidationIssue {
                        message: format!("document is not valid JSON: {err}"),
                        line: Some(err.line()),
                    }],
                    Vec::new(),
                );
            }
        };
        let Some(graph) = document.get("@graph").and_then(Value::as_array) else {
            return ValidationReport::from_issues(
                vec![ValidationIssue::new("RO-Crate must have a @graph array")],
                Vec::new(),
            );
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let entities: Vec<&Map<String, Value>> =
            graph.iter().filter_map(Value::as_object).collect();
        if entities.len() != graph.len() {
            errors.push(ValidationIssue::new("@graph contains a non-object item"));
        }

        let mut ids = BTreeSet::new();
        for (position, entity) in entities.iter().enumerate() {
            match entity.get("@id").and_then(Value::as_str) {
                Some(id) => {
                    if !ids.insert(id) {
                        errors.push(ValidationIssue::new(format!("duplicate @id `{id}`")));
                    }
                }
                None => errors.push(ValidationIssue::new(format!(
                    "entity at position {position} has no @id"
                ))),
            }
            if entity.get("@type").map_or(true, Value::is_null) {
                let id = entity.get("@id").and_then(Value::as_str).unwrap_or("?");
                errors.push(ValidationIssue::new(format!("entity `{id}` has no @type")));
            }
        }

        let mut referenced_by: BTreeMap<&str, usize> = BTreeMap::new();
        for entity in &entities {
            let owner = entity.get("@id").and_then(Value::as_str).unwrap_or("?");
            for (key, value) in entity.iter().filter(|(key, _)| *key != "@id") {
                let mut targets = Vec::new();
                collect_references(value, &mut targets);
                for target in targets {
                    if target != owner {
                        *referenced_by.entry(target).or_default() += 1;
                    }
                    if !ids.contains(target) && !is_external_reference(target) {
                        errors.push(ValidationIssue::new(format!(
                            "`{owner}` property `{key}` references missing entity `{target}`"
                        )));
                    }
                }
            }
        }

        for id in &ids {
            if *id == ROOT_ID || *id == METADATA_DESCRIPTOR_ID {
                continue;
            }
            if !referenced_by.contains_key(id) {
                errors.push(ValidationIssue::new(format!(
                    "entity `{id}` is not referenced by any other entity"
                )));
            }
        }

        check_ldac(&entities, &mut warnings);
        ValidationReport::from_issues(errors, warnings)
    }
}

fn collect_references<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Value::Object(object) => {
            if let Some(id) = object.get("@id").and_then(Value::as_str) {
                out.push(id);
            }
        }
        _ => {}
    }
}

fn check_ldac(entities: &[&Map<String, Value>], warnings: &mut Vec<ValidationIssue>) {
    for entity in entities {
        let id = entity.get("@id").and_then(Value::as_str).unwrap_or("?");
        let is_file = FILE_TYPES.iter().any(|kind| has_type(entity, kind));
        let is_root_collection = id == ROOT_ID && has_type(entity, "Dataset");
        let is_object = !is_file && OBJECT_TYPES.iter().any(|kind| has_type(entity, kind));
        let is_person_root = id == ROOT_ID && has_type(entity, "Person");

        if (is_root_collection || is_object) && !is_person_root {
            match entity.get("ldac:subjectLanguage") {
                Some(Value::Array(languages)) if !languages.is_empty() => {}
                Some(Value::Array(_)) => warnings.push(ValidationIssue::new(format!(
                    "`{id}` ldac:subjectLanguage array is empty"
                ))),
                Some(_) => warnings.push(ValidationIssue::new(format!(
                    "`{id}` ldac:subjectLanguage must be an array"
                ))),
                None => warnings.push(ValidationIssue::new(format!(
                    "`{id}` is missing ldac:subjectLanguage"
                ))),
            }
        }

        if is_file {
            match entity.get("license") {
                None => warnings.push(ValidationIssue::new(format!(
                    "file `{id}` does not declare a license"
                ))),
                Some(license) if license.get("@id").and_then(Value::as_str).is_none() => {
                    warnings.push(ValidationIssue::new(format!(
                        "file `{id}` license must be an object with @id"
                    )))
                }
                Some(_) => {}
            }
        }
    }
}
