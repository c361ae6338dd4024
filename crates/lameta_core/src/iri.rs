//! IRI sanitizing and identifier builders.
//!
//! # Responsibility
//! - Turn human-entered names into IRI-safe path segments and fragments.
//! - Build every `@id` the graph assembler emits for folders and files.
//!
//! # Invariants
//! - Callers sanitize each raw value exactly once; sanitizing is not idempotent.
//! - Different underlying bytes never produce the same unresolved-contributor id.
//! - Empty prefixes fall back to a literal (`person`, `session`).

use once_cell::sync::Lazy;
use regex::Regex;

/// Root dataset id of every exported crate.
pub const ROOT_ID: &str = "./";
/// Shared id for contributors with an empty reference.
pub const UNKNOWN_CONTRIBUTOR_ID: &str = "#unknown-contributor";
/// Collection-wide license id.
pub const COLLECTION_LICENSE_ID: &str = "#collection-license";
/// Canonical id for placeholder vocabulary values.
pub const UNKNOWN_TERM_ID: &str = "tag:lameta/unknown";

const LDAC_PREFIX: &str = "ldac:";
const LDAC_NAMESPACE: &str = "https://w3id.org/ldac/terms#";

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static FRAGMENT_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid fragment regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Folder that owns a file, resolved once when files are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderKind {
    /// Project root files, rooted at `./`.
    Project,
    /// Files of the session with this file prefix.
    Session(String),
    /// Files of the person with this file prefix.
    Person(String),
    /// Project description documents.
    DescriptionDocuments,
    /// Project miscellaneous documents.
    OtherDocuments,
}

impl FolderKind {
    /// Builds the path-style `@id` for `file_name` inside this folder.
    pub fn file_id(&self, file_name: &str) -> String {
        let file = sanitize_for_iri(file_name);
        match self {
            Self::Project => format!("{ROOT_ID}{file}"),
            Self::Session(prefix) => format!("Sessions/{}/{file}", sanitize_for_iri(prefix)),
            Self::Person(prefix) => format!("People/{}/{file}", sanitize_for_iri(prefix)),
            Self::DescriptionDocuments => format!("DescriptionDocuments/{file}"),
            Self::OtherDocuments => format!("OtherDocuments/{file}"),
        }
    }
}

/// Path-style `@id` of a file owned by `kind`.
pub fn create_file_id(kind: &FolderKind, file_name: &str) -> String {
    kind.file_id(file_name)
}

/// Percent-encodes `input` for use inside an IRI.
///
/// Component encoding plus `(`, `)` and `!`, which are legal but break
/// downstream tooling. Each whitespace character is encoded on its own.
pub fn sanitize_for_iri(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    urlencoding::encode(input)
        .replace("%2A", "*")
        .replace("%27", "'")
}

/// `People/<prefix>/`, or `People/person/` for an empty prefix.
pub fn create_person_id(file_prefix: &str) -> String {
    format!("People/{}/", sanitized_or(file_prefix, "person"))
}

/// `#session-<prefix>`, or `#session-session` for an empty prefix.
pub fn create_session_id(file_prefix: &str) -> String {
    format!("#session-{}", sanitized_or(file_prefix, "session"))
}

/// Id of the dataset grouping one person's files.
pub fn create_person_files_dataset_id(file_prefix: &str) -> String {
    format!("#{}-files", sanitized_or(file_prefix, "person"))
}

/// Builds `#prefix-fragment` from free text, or `#prefix` when nothing survives.
pub fn create_fragment_id(prefix: &str, value: &str) -> String {
    let underscored = WHITESPACE_RUN_RE.replace_all(value.trim(), "_");
    let fragment = FRAGMENT_STRIP_RE.replace_all(&underscored, "");
    if fragment.is_empty() {
        format!("#{prefix}")
    } else {
        format!("#{prefix}-{fragment}")
    }
}

/// Placeholder id for a contribution whose name matches no Person record.
///
/// Whitespace runs become `_` like [`create_fragment_id`], but the remaining
/// characters are percent-encoded instead of stripped so that accented and
/// plain spellings of a name stay distinct.
pub fn create_unresolved_contributor_id(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return UNKNOWN_CONTRIBUTOR_ID.to_string();
    }
    let underscored = WHITESPACE_RUN_RE.replace_all(trimmed, "_");
    format!("#contributor-{}", urlencoding::encode(&underscored))
}

/// Lowercase dash slug used by publisher and depositor ids.
pub fn slug(value: &str) -> String {
    let lowered = value.to_lowercase();
    let slug = SLUG_RE.replace_all(&lowered, "-");
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// True for `ldac:` compact ids and expanded LDAC term IRIs.
pub fn is_ldac_identifier(id: &str) -> bool {
    id.starts_with(LDAC_PREFIX) || id.starts_with(LDAC_NAMESPACE)
}

/// True for references that resolve outside the graph.
pub fn is_external_reference(id: &str) -> bool {
    is_ldac_identifier(id) || id.starts_with("http://") || id.starts_with("https://")
}

fn sanitized_or(value: &str, fallback: &str) -> String {
    let sanitized = sanitize_for_iri(value);
    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}
