//! Field-definition catalog.
//!
//! # Responsibility
//! - Describe which metadata keys exist per folder type and how each maps to
//!   RO-Crate (property key, handler, template, PII flag).
//! - Load the built-in catalog embedded from `config/fields.json`.
//!
//! # Invariants
//! - Every template is compiled when the catalog loads; a bad placeholder is a
//!   load error, never an export-time surprise.

use crate::template::{Template, TemplateKind};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BUILTIN_FIELDS: &str = include_str!("../config/fields.json");

/// Catalog load failure.
#[derive(Debug)]
pub enum CatalogError {
    /// JSON is malformed or a template fails to compile.
    Parse(serde_json::Error),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid field catalog: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Folder type a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    Project,
    Session,
    Person,
}

/// Special-purpose handler named by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldHandlerKind {
    /// `;`-separated language codes resolved through the language registry.
    Languages,
}

/// RO-Crate mapping of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoCrateMapping {
    /// Output property; defaults to the field key.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub handler: Option<FieldHandlerKind>,
    /// Emit an array of references instead of one.
    #[serde(default)]
    pub array: Option<bool>,
    #[serde(default)]
    pub template: Option<Template>,
}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default)]
    pub english_label: Option<String>,
    /// lameta field type such as `languageChoices` or `date`.
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    /// Vocabulary table used to map values, e.g. `genres.json`.
    #[serde(default)]
    pub vocabulary_file: Option<String>,
    /// Deprecation note; `migrated...` fields are never exported.
    #[serde(default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub personally_identifiable_information: bool,
    #[serde(default)]
    pub is_custom: bool,
    /// Added by an archive configuration rather than lameta itself.
    #[serde(default)]
    pub is_additional: bool,
    #[serde(default)]
    pub omit_export: bool,
    #[serde(default)]
    pub rocrate: Option<RoCrateMapping>,
}

impl FieldDefinition {
    /// Output property name.
    pub fn property_key(&self) -> &str {
        self.rocrate
            .as_ref()
            .and_then(|mapping| mapping.key.as_deref())
            .unwrap_or(self.key.as_str())
    }

    pub fn template(&self) -> Option<&Template> {
        self.rocrate.as_ref().and_then(|mapping| mapping.template.as_ref())
    }

    pub fn template_kind(&self) -> TemplateKind {
        TemplateKind::of(
            self.template().is_some(),
            self.rocrate.as_ref().and_then(|mapping| mapping.array),
        )
    }

    pub fn is_migrated(&self) -> bool {
        self.deprecated
            .as_deref()
            .is_some_and(|note| note.contains("migrated"))
    }

    /// True for fields resolved through the language registry.
    pub fn is_language_field(&self) -> bool {
        let explicit = self
            .rocrate
            .as_ref()
            .is_some_and(|mapping| mapping.handler == Some(FieldHandlerKind::Languages));
        let by_template = self.field_type.as_deref() == Some("languageChoices")
            && self.template().is_some_and(Template::is_language);
        explicit || by_template
    }

    pub fn label(&self) -> &str {
        self.english_label.as_deref().unwrap_or(self.key.as_str())
    }
}

/// Per-folder field definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldCatalog {
    #[serde(default)]
    pub project: Vec<FieldDefinition>,
    #[serde(default)]
    pub session: Vec<FieldDefinition>,
    #[serde(default)]
    pub person: Vec<FieldDefinition>,
    /// Shared definitions (`language`).
    #[serde(default)]
    pub common: Vec<FieldDefinition>,
}

impl FieldCatalog {
    /// Loads the embedded catalog.
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_json(BUILTIN_FIELDS)
    }

    /// Parses a catalog document, compiling every template.
    pub fn from_json(raw: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn fields(&self, scope: FieldScope) -> &[FieldDefinition] {
        match scope {
            FieldScope::Project => &self.project,
            FieldScope::Session => &self.session,
            FieldScope::Person => &self.person,
        }
    }

    pub fn find(&self, scope: FieldScope, key: &str) -> Option<&FieldDefinition> {
        self.fields(scope).iter().find(|field| field.key == key)
    }

    /// Template used to build Language entities.
    pub fn language_template(&self) -> Option<&Template> {
        self.common
            .iter()
            .find(|field| field.key == "language")
            .and_then(FieldDefinition::template)
    }
}
