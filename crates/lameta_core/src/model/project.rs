//! Project snapshot consumed by the exporter.
//!
//! # Responsibility
//! - Mirror lameta's project tree (sessions, people, document folders) as
//!   read-only serde structs.
//! - Provide the lookups the graph assembler needs (`find_person`, archive
//!   configuration, access choices).
//!
//! # Invariants
//! - The exporter never mutates a snapshot.
//! - Field names are camelCase on the wire.

use super::properties::Properties;
use crate::iri::FolderKind;
use serde::{Deserialize, Serialize};

/// Property key naming the archive configuration of a project.
pub const ARCHIVE_CONFIGURATION_KEY: &str = "archiveConfigurationName";

/// One `personReference` + `role` entry on a session or file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    /// Free-text person name or code, matched against Person records.
    pub person_reference: String,
    /// Role such as `speaker` or `recorder`.
    #[serde(default)]
    pub role: String,
    /// Free-text comments, never exported.
    #[serde(default)]
    pub comments: String,
}

impl Contribution {
    pub fn new(person_reference: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            person_reference: person_reference.into(),
            role: role.into(),
            comments: String::new(),
        }
    }
}

/// File entry inside a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute or folder-relative path; the basename becomes the file name.
    pub path: String,
    /// File-level metadata (`license`, `access`, ...).
    #[serde(default)]
    pub properties: Properties,
    /// Contributions recorded on this file.
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    /// Size in bytes, filled by the file-system adapter.
    #[serde(default)]
    pub size: Option<u64>,
    /// ISO-8601 creation timestamp.
    #[serde(default)]
    pub date_created: Option<String>,
    /// ISO-8601 modification timestamp.
    #[serde(default)]
    pub date_modified: Option<String>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Basename of `path`, accepting both separators.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> String {
        let name = self.file_name();
        match name.rfind('.') {
            Some(index) if index + 1 < name.len() => name[index + 1..].to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    /// True for exporter output files that must never be re-exported.
    pub fn is_rocrate_output(&self) -> bool {
        self.file_name().starts_with("ro-crate")
    }
}

/// A recording session folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub file_prefix: String,
    #[serde(default)]
    pub properties: Properties,
    /// User-defined fields outside the field catalog.
    #[serde(default)]
    pub custom_properties: Properties,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl Session {
    pub fn new(file_prefix: impl Into<String>) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            ..Self::default()
        }
    }

    /// Session contributions followed by every file's contributions.
    pub fn all_contributions(&self) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .chain(self.files.iter().flat_map(|file| file.contributions.iter()))
            .collect()
    }

    /// Raw `access` value.
    pub fn access(&self) -> String {
        self.properties.text("access")
    }

    pub fn folder_kind(&self) -> FolderKind {
        FolderKind::Session(self.file_prefix.clone())
    }
}

/// A person folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub file_prefix: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub custom_properties: Properties,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

impl Person {
    pub fn new(file_prefix: impl Into<String>) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            ..Self::default()
        }
    }

    /// Full name, falling back to the file prefix.
    pub fn display_name(&self) -> String {
        self.properties.text_or("name", &self.file_prefix)
    }

    /// True when `reference` names this person by full name or file prefix.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let wanted = reference.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }
        self.properties.text("name").trim().to_lowercase() == wanted
            || self.file_prefix.trim().to_lowercase() == wanted
    }

    pub fn folder_kind(&self) -> FolderKind {
        FolderKind::Person(self.file_prefix.clone())
    }
}

/// One access label offered by an archive configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChoice {
    /// Stored access code, e.g. `U` or `Strategic partners`.
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: String,
    /// `ldac:OpenAccess` or `ldac:AuthorizedAccess` when the archive maps it.
    #[serde(default)]
    pub ldac_access_category: Option<String>,
}

/// Archive configuration (REAP, ELAR, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveConfiguration {
    /// Short name stored in `archiveConfigurationName`.
    pub name: String,
    #[serde(default)]
    pub configuration_full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access_choices: Vec<AccessChoice>,
}

/// Whole project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub custom_properties: Properties,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub people: Vec<Person>,
    /// Files stored at the project root.
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub description_documents: Vec<FileRecord>,
    #[serde(default)]
    pub other_documents: Vec<FileRecord>,
    #[serde(default)]
    pub archive_configurations: Vec<ArchiveConfiguration>,
}

impl Project {
    /// Trimmed project title, empty when unset.
    pub fn title(&self) -> String {
        self.properties.text("title").trim().to_string()
    }

    /// Trimmed `archiveConfigurationName`, empty when unset.
    pub fn archive_configuration_name(&self) -> String {
        self.properties
            .text(ARCHIVE_CONFIGURATION_KEY)
            .trim()
            .to_string()
    }

    /// Finds the Person record a contribution refers to.
    pub fn find_person(&self, reference: &str) -> Option<&Person> {
        self.people
            .iter()
            .find(|person| person.matches_reference(reference))
    }

    /// Configuration selected by `archiveConfigurationName`.
    pub fn archive_configuration(&self) -> Option<&ArchiveConfiguration> {
        let name = self.archive_configuration_name();
        if name.is_empty() {
            return None;
        }
        self.archive_configurations
            .iter()
            .find(|config| config.name.eq_ignore_ascii_case(&name))
    }

    /// Access choices of the selected archive configuration.
    pub fn access_choices(&self) -> &[AccessChoice] {
        self.archive_configuration()
            .map(|config| config.access_choices.as_slice())
            .unwrap_or(&[])
    }

    /// Finds a session by file prefix.
    pub fn find_session(&self, file_prefix: &str) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|session| session.file_prefix == file_prefix)
    }

    /// Finds a person by file prefix.
    pub fn find_person_by_prefix(&self, file_prefix: &str) -> Option<&Person> {
        self.people
            .iter()
            .find(|person| person.file_prefix == file_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_person_matches_name_or_prefix_ignoring_case() {
        let mut project = Project::default();
        project.people.push(Person {
            file_prefix: "Awi_Heole".into(),
            properties: Properties::new().with("name", "Awi Heole"),
            ..Person::default()
        });
        assert!(project.find_person(" awi heole ").is_some());
        assert!(project.find_person("AWI_HEOLE").is_some());
        assert!(project.find_person("").is_none());
        assert!(project.find_person("Someone").is_none());
    }

    #[test]
    fn all_contributions_include_file_contributions() {
        let mut session = Session::new("ETR009");
        session.contributions.push(Contribution::new("Awi", "speaker"));
        let mut file = FileRecord::new("/s/ETR009.wav");
        file.contributions.push(Contribution::new("Ilawi", "recorder"));
        session.files.push(file);
        let references: Vec<_> = session
            .all_contributions()
            .into_iter()
            .map(|c| c.person_reference.as_str())
            .collect();
        assert_eq!(references, vec!["Awi", "Ilawi"]);
    }

    #[test]
    fn file_name_and_extension() {
        let file = FileRecord::new("C:\\corpus\\Sessions\\ETR009\\ETR009.WAV");
        assert_eq!(file.file_name(), "ETR009.WAV");
        assert_eq!(file.extension(), "wav");
        assert!(FileRecord::new("/x/ro-crate-metadata.json").is_rocrate_output());
    }

    #[test]
    fn archive_configuration_lookup_ignores_case() {
        let project = Project {
            properties: Properties::new().with(ARCHIVE_CONFIGURATION_KEY, "reap"),
            archive_configurations: vec![ArchiveConfiguration {
                name: "REAP".into(),
                access_choices: vec![AccessChoice {
                    id: "Strategic partners".into(),
                    ..AccessChoice::default()
                }],
                ..ArchiveConfiguration::default()
            }],
            ..Project::default()
        };
        assert_eq!(project.access_choices().len(), 1);
    }
}
