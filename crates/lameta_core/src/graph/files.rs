//! File data entities.

use super::{reference, Entity, GraphBuilder};
use crate::iri::FolderKind;
use crate::material::{mime_type, MediaKind};
use crate::model::FileRecord;
use serde_json::json;

/// Builds the `File` entity for `file` inside `kind`.
///
/// Callers attach `license`, `isPartOf` and relationship properties.
pub fn file_entity(file: &FileRecord, kind: &FolderKind) -> Entity {
    let name = file.file_name();
    let extension = file.extension();
    let media = MediaKind::from_extension(&extension);

    let mut entity = Entity::new();
    entity.insert("@id".into(), json!(kind.file_id(name)));
    let types = match media.schema_type() {
        Some(media_type) => json!(["File", media_type]),
        None => json!("File"),
    };
    entity.insert("@type".into(), types);
    if let Some(size) = file.size {
        entity.insert("contentSize".into(), json!(size));
    }
    if let Some(created) = &file.date_created {
        entity.insert("dateCreated".into(), json!(created));
    }
    if let Some(modified) = &file.date_modified {
        entity.insert("dateModified".into(), json!(modified));
    }
    entity.insert("encodingFormat".into(), json!(mime_type(&extension)));
    entity.insert("name".into(), json!(name));
    entity
}

impl GraphBuilder<'_> {
    /// Builds one project document under `kind`, licensed by its `access`
    /// property or `fallback_license`.
    pub(crate) fn document_entity(
        &mut self,
        file: &FileRecord,
        kind: &FolderKind,
        parent_id: &str,
        fallback_license: &str,
    ) -> Entity {
        let mut entity = file_entity(file, kind);
        let license = match self
            .licenses
            .ensure_document_access_license(file, self.project)
        {
            Some(id) => {
                self.extra_access
                    .push(file.properties.text("access").trim().to_string());
                id
            }
            None => fallback_license.to_string(),
        };
        entity.insert("license".into(), reference(&license));
        entity.insert("isPartOf".into(), reference(parent_id));
        entity
    }
}
