//! Vocabulary term mapping.
//!
//! # Responsibility
//! - Map free-text field values (genre) onto vocabulary entries, LDAC terms or
//!   project-scoped custom terms.
//! - Build the `DefinedTerm` and `DefinedTermSet` entities for mapped values.
//!
//! # Invariants
//! - Every placeholder spelling of "unknown" maps to one shared id.
//! - A term set is emitted only after a term referencing it was recorded.

use crate::iri::UNKNOWN_TERM_ID;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BUILTIN_GENRES: &str = include_str!("../vocabularies/genres.json");

/// Term set for LDAC-mapped genres.
pub const LDAC_GENRE_TERM_SET: &str = "ldac:LinguisticGenreTerms";
/// Term set for project-specific genres.
pub const CUSTOM_GENRE_TERM_SET: &str = "#CustomGenreTerms";

const PLACEHOLDER_VALUES: [&str; 6] = [
    "unknown",
    "unspecified",
    "<unknown>",
    "",
    "null",
    "undefined",
];

/// Vocabulary table failure.
#[derive(Debug)]
pub enum VocabularyError {
    /// No table registered under this file name.
    NotFound(String),
    /// Table JSON is malformed.
    Parse {
        file: String,
        source: serde_json::Error,
    },
}

impl Display for VocabularyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(file) => write!(f, "vocabulary file not found: {file}"),
            Self::Parse { file, source } => {
                write!(f, "failed to parse vocabulary file {file}: {source}")
            }
        }
    }
}

impl Error for VocabularyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Parse { source, .. } => Some(source),
        }
    }
}

pub type VocabularyResult<T> = Result<T, VocabularyError>;

/// Link from a vocabulary entry into an external vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTerm {
    /// Vocabulary name such as `LDAC`.
    pub vocabulary: String,
    /// Compact term id such as `ldac:Dialogue`.
    pub term: String,
}

/// One row of a vocabulary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub mapping: Vec<ExternalTerm>,
}

impl VocabularyTerm {
    /// Term id in the LDAC vocabulary, if mapped.
    pub fn ldac_term(&self) -> Option<&str> {
        self.mapping
            .iter()
            .find(|entry| entry.vocabulary == "LDAC")
            .map(|entry| entry.term.as_str())
    }
}

/// Result of mapping one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMapping {
    /// Canonical `@id` of the term entity.
    pub id: String,
    /// Value as entered by the user.
    pub original_term: String,
    /// Vocabulary row the value matched, if any.
    pub definition: Option<VocabularyTerm>,
}

impl TermMapping {
    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_TERM_ID
    }

    pub fn is_ldac(&self) -> bool {
        self.id.starts_with("ldac:")
    }
}

/// True for the closed set of "no value" spellings.
pub fn is_placeholder_term(term: &str) -> bool {
    let normalized = term.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&normalized.as_str())
}

/// Vocabulary tables keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct VocabularyCatalog {
    tables: BTreeMap<String, Vec<VocabularyTerm>>,
}

impl VocabularyCatalog {
    /// Catalog with the embedded `genres.json`.
    pub fn builtin() -> VocabularyResult<Self> {
        let mut catalog = Self::default();
        catalog.register_json("genres.json", BUILTIN_GENRES)?;
        Ok(catalog)
    }

    pub fn register(&mut self, file: impl Into<String>, terms: Vec<VocabularyTerm>) {
        self.tables.insert(file.into(), terms);
    }

    /// Parses and registers a table.
    pub fn register_json(&mut self, file: &str, raw: &str) -> VocabularyResult<()> {
        let terms: Vec<VocabularyTerm> =
            serde_json::from_str(raw).map_err(|source| VocabularyError::Parse {
                file: file.to_string(),
                source,
            })?;
        self.register(file, terms);
        Ok(())
    }

    pub fn load(&self, file: &str) -> VocabularyResult<&[VocabularyTerm]> {
        self.tables
            .get(file)
            .map(Vec::as_slice)
            .ok_or_else(|| VocabularyError::NotFound(file.to_string()))
    }

    /// Maps `term` through `file`.
    ///
    /// Placeholders short-circuit to the shared unknown id before the table is
    /// consulted, so they resolve even when the table is missing.
    pub fn get_vocabulary_mapping(
        &self,
        term: &str,
        file: &str,
        project_title: Option<&str>,
    ) -> VocabularyResult<TermMapping> {
        if is_placeholder_term(term) {
            return Ok(unknown_mapping(term));
        }
        let table = self.load(file)?;
        let found = table.iter().find(|entry| entry.id == term).or_else(|| {
            let wanted = term.to_lowercase();
            table
                .iter()
                .find(|entry| entry.label.to_lowercase() == wanted)
        });
        let Some(entry) = found else {
            return Ok(custom_mapping(term, project_title));
        };
        let id = match entry.ldac_term() {
            Some(ldac) => ldac.to_string(),
            None => custom_term_id(&entry.label, project_title),
        };
        Ok(TermMapping {
            id,
            original_term: term.to_string(),
            definition: Some(entry.clone()),
        })
    }
}

/// Mapping used when no table applies to a value.
pub fn custom_mapping(term: &str, project_title: Option<&str>) -> TermMapping {
    if is_placeholder_term(term) {
        return unknown_mapping(term);
    }
    TermMapping {
        id: custom_term_id(term, project_title),
        original_term: term.to_string(),
        definition: None,
    }
}

fn unknown_mapping(term: &str) -> TermMapping {
    TermMapping {
        id: UNKNOWN_TERM_ID.to_string(),
        original_term: term.to_string(),
        definition: None,
    }
}

fn custom_term_id(label: &str, project_title: Option<&str>) -> String {
    get_custom_uri(&format!("genre/{label}"), project_title)
}

/// `tag:lameta,<title>:<path>`, or a TitleCased fragment when there is no title.
pub fn get_custom_uri(path: &str, project_title: Option<&str>) -> String {
    if let Some(title) = project_title.filter(|title| !title.is_empty()) {
        return format!("tag:lameta,{title}:{path}");
    }
    let last = path.rsplit('/').next().unwrap_or(path);
    let title_cased: String = last
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    format!("#{title_cased}")
}

/// Builds the `DefinedTerm` entity for a mapping.
pub fn create_term_definition(mapping: &TermMapping) -> Map<String, Value> {
    let set = if mapping.is_ldac() {
        LDAC_GENRE_TERM_SET
    } else {
        CUSTOM_GENRE_TERM_SET
    };
    let mut entity = Map::new();
    entity.insert("@id".into(), json!(mapping.id));
    entity.insert("@type".into(), json!("DefinedTerm"));
    match &mapping.definition {
        Some(definition) if !mapping.is_unknown() => {
            entity.insert("name".into(), json!(definition.label));
            entity.insert("description".into(), json!(definition.definition));
            if !definition.examples.is_empty() {
                entity.insert("ldac:examples".into(), json!(definition.examples));
            }
        }
        _ => {
            let name = if mapping.is_unknown() {
                "Unknown".to_string()
            } else {
                mapping.original_term.trim().to_string()
            };
            entity.insert("description".into(), json!(format!("Custom term: {name}")));
            entity.insert("name".into(), json!(name));
        }
    }
    entity.insert("inDefinedTermSet".into(), json!({ "@id": set }));
    entity
}

/// Which genre term sets were referenced during one export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermSetUsage {
    pub ldac: bool,
    pub custom: bool,
}

impl TermSetUsage {
    /// Records the set a term id belongs to.
    pub fn record(&mut self, id: &str) {
        if id.starts_with("ldac:") {
            self.ldac = true;
        } else {
            self.custom = true;
        }
    }

    /// Term-set entities for the recorded usage only.
    pub fn term_sets(&self) -> Vec<Map<String, Value>> {
        let mut sets = Vec::new();
        if self.ldac {
            sets.push(term_set(LDAC_GENRE_TERM_SET, "Linguistic Genre Terms"));
        }
        if self.custom {
            sets.push(term_set(CUSTOM_GENRE_TERM_SET, "Custom Project Genres"));
        }
        sets
    }
}

fn term_set(id: &str, name: &str) -> Map<String, Value> {
    let mut entity = Map::new();
    entity.insert("@id".into(), json!(id));
    entity.insert("@type".into(), json!("DefinedTermSet"));
    entity.insert("name".into(), json!(name));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VocabularyCatalog {
        VocabularyCatalog::builtin().expect("builtin genres should parse")
    }

    #[test]
    fn exact_id_and_label_matches_use_ldac_mapping() {
        let catalog = catalog();
        let by_id = catalog
            .get_vocabulary_mapping("dialog", "genres.json", Some("Edolo"))
            .unwrap();
        assert_eq!(by_id.id, "ldac:Dialogue");
        let by_label = catalog
            .get_vocabulary_mapping("PERSONAL NARRATIVE", "genres.json", None)
            .unwrap();
        assert_eq!(by_label.id, "ldac:Narrative");
        assert!(by_label.definition.is_some());
    }

    #[test]
    fn entries_without_ldac_mapping_become_custom_ids() {
        let mapping = catalog()
            .get_vocabulary_mapping("elicitation", "genres.json", Some("Edolo"))
            .unwrap();
        assert_eq!(mapping.id, "tag:lameta,Edolo:genre/Elicitation");
        let entity = create_term_definition(&mapping);
        assert_eq!(entity["name"], "Elicitation");
        assert_eq!(entity["inDefinedTermSet"]["@id"], CUSTOM_GENRE_TERM_SET);
    }

    #[test]
    fn unmatched_terms_without_title_use_title_cased_fragment() {
        let mapping = catalog()
            .get_vocabulary_mapping("fishing stories", "genres.json", None)
            .unwrap();
        assert_eq!(mapping.id, "#FishingStories");
        let entity = create_term_definition(&mapping);
        assert_eq!(entity["description"], "Custom term: fishing stories");
    }

    #[test]
    fn placeholder_values_share_one_unknown_id() {
        let catalog = catalog();
        for value in ["unknown", "Unknown", "<Unknown>", "unspecified", "", "null", "undefined"] {
            let mapping = catalog
                .get_vocabulary_mapping(value, "genres.json", Some("Edolo"))
                .unwrap();
            assert_eq!(mapping.id, UNKNOWN_TERM_ID, "value {value:?}");
            assert_eq!(create_term_definition(&mapping)["name"], "Unknown");
        }
    }

    #[test]
    fn missing_table_is_not_found_and_bad_json_is_parse_error() {
        let mut catalog = VocabularyCatalog::default();
        assert!(matches!(
            catalog.get_vocabulary_mapping("dialog", "nope.json", None),
            Err(VocabularyError::NotFound(_))
        ));
        assert!(matches!(
            catalog.register_json("bad.json", "{"),
            Err(VocabularyError::Parse { .. })
        ));
    }

    #[test]
    fn term_sets_follow_recorded_usage() {
        let mut usage = TermSetUsage::default();
        assert!(usage.term_sets().is_empty());
        usage.record("ldac:Dialogue");
        let sets = usage.term_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0]["name"], "Linguistic Genre Terms");
        usage.record("#FishingStories");
        assert_eq!(usage.term_sets().len(), 2);
    }
}
