//! Per-export file license registry.

use super::access::{is_raw_access_value, normalized_license_id, session_license_id};
use crate::model::{FileRecord, Project, Session};
use std::collections::BTreeMap;

/// File path to license id, owned by one exporter.
///
/// Entries survive across exports until [`LicenseManager::clear`] runs.
#[derive(Debug, Clone, Default)]
pub struct LicenseManager {
    file_licenses: BTreeMap<String, String>,
}

impl LicenseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and stores the license of a session file.
    ///
    /// - A raw access label on the file is replaced by the session license
    ///   when a project is known.
    /// - Any other explicit license is kept as-is.
    /// - A file without a license inherits the session license.
    pub fn ensure_file_license(
        &mut self,
        file: &FileRecord,
        session: &Session,
        project: Option<&Project>,
    ) -> Option<String> {
        let own = file.properties.text("license").trim().to_string();
        let resolved = if own.is_empty() {
            session_license_id(session, project)
        } else if is_raw_access_value(&own) && project.is_some() {
            session_license_id(session, project)
        } else {
            Some(own)
        };
        if let Some(id) = &resolved {
            self.set_file_license(&file.path, id.clone());
        }
        resolved
    }

    /// Normalizes a project document's `access` property into its license.
    pub fn ensure_document_access_license(
        &mut self,
        file: &FileRecord,
        project: &Project,
    ) -> Option<String> {
        let access = file.properties.meaningful("access")?;
        let id = normalized_license_id(&access, project);
        self.set_file_license(&file.path, id.clone());
        Some(id)
    }

    pub fn set_file_license(&mut self, path: &str, license_id: String) {
        self.file_licenses.insert(path.to_string(), license_id);
    }

    pub fn file_license(&self, path: &str) -> Option<&str> {
        self.file_licenses.get(path).map(String::as_str)
    }

    pub fn all_file_licenses(&self) -> &BTreeMap<String, String> {
        &self.file_licenses
    }

    pub fn clear(&mut self) {
        self.file_licenses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Properties, ARCHIVE_CONFIGURATION_KEY};

    fn project() -> Project {
        Project {
            properties: Properties::new().with(ARCHIVE_CONFIGURATION_KEY, "REAP"),
            ..Project::default()
        }
    }

    fn session(access: &str) -> Session {
        let mut session = Session::new("ETR009");
        session.properties.insert("access", access);
        session
    }

    #[test]
    fn file_without_license_inherits_session_license() {
        let mut manager = LicenseManager::new();
        let file = FileRecord::new("/s/ETR009.wav");
        let id = manager.ensure_file_license(&file, &session("Strategic partners"), Some(&project()));
        assert_eq!(id.as_deref(), Some("#license-reap-strategic-partners"));
        assert_eq!(
            manager.file_license("/s/ETR009.wav"),
            Some("#license-reap-strategic-partners")
        );
    }

    #[test]
    fn raw_file_license_is_normalized_and_normalized_is_kept() {
        let mut manager = LicenseManager::new();
        let mut raw = FileRecord::new("/s/a.wav");
        raw.properties.insert("license", "Strategic partners");
        let mut normalized = FileRecord::new("/s/b.wav");
        normalized.properties.insert("license", "#license-reap-u");
        let session = session("Strategic partners");
        manager.ensure_file_license(&raw, &session, Some(&project()));
        manager.ensure_file_license(&normalized, &session, Some(&project()));
        assert_eq!(
            manager.file_license("/s/a.wav"),
            Some("#license-reap-strategic-partners")
        );
        assert_eq!(manager.file_license("/s/b.wav"), Some("#license-reap-u"));
    }

    #[test]
    fn normalizing_twice_is_idempotent() {
        let mut manager = LicenseManager::new();
        let session = session("U");
        let mut file = FileRecord::new("/s/a.wav");
        let first = manager
            .ensure_file_license(&file, &session, Some(&project()))
            .unwrap();
        file.properties.insert("license", first.clone());
        let second = manager
            .ensure_file_license(&file, &session, Some(&project()))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn document_access_and_clear() {
        let mut manager = LicenseManager::new();
        let mut doc = FileRecord::new("/d/protocol.pdf");
        doc.properties.insert("access", "U");
        assert_eq!(
            manager.ensure_document_access_license(&doc, &project()).as_deref(),
            Some("#license-reap-u")
        );
        assert_eq!(manager.all_file_licenses().len(), 1);
        manager.clear();
        assert!(manager.all_file_licenses().is_empty());
    }
}
