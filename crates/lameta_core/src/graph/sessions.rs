//! Session Event/Dataset entities.
//!
//! # Invariants
//! - Role properties are arrays of references; unresolved names become
//!   placeholder Person entities in the same graph.
//! - Every session file carries `isPartOf`, a license and a material type.

use super::files::file_entity;
use super::people::PersonFileParent;
use super::{append_reference, reference, Entity, GraphBuilder, GraphResult, LDAC_OBJECT_PROFILE};
use crate::catalog::FieldScope;
use crate::contributor::ContributorResolver;
use crate::iri::{create_session_id, COLLECTION_LICENSE_ID, ROOT_ID};
use crate::license::normalized_license_id;
use crate::material::MediaKind;
use crate::model::Session;
use serde_json::json;

const NO_TITLE: &str = "No title provided for this session.";
const NO_DESCRIPTION: &str = "No description provided for this session.";

impl GraphBuilder<'_> {
    /// Builds the session node and emits its files, contributors and persons.
    ///
    /// A `standalone` session is the root (`./`) of its own crate.
    pub(crate) fn build_session_entity(
        &mut self,
        session: &Session,
        standalone: bool,
    ) -> GraphResult<Entity> {
        let project = self.project;
        let id = if standalone {
            ROOT_ID.to_string()
        } else {
            create_session_id(&session.file_prefix)
        };
        let license_id = normalized_license_id(&session.access(), project);
        let date = session.properties.meaningful("date");

        let mut entity = Entity::new();
        entity.insert("@id".into(), json!(id));
        entity.insert("@type".into(), json!(["Dataset", "pcdm:Object", "Event"]));
        entity.insert("conformsTo".into(), reference(LDAC_OBJECT_PROFILE));
        entity.insert(
            "name".into(),
            json!(session
                .properties
                .meaningful("title")
                .unwrap_or_else(|| NO_TITLE.to_string())),
        );
        entity.insert(
            "description".into(),
            json!(session
                .properties
                .meaningful("description")
                .unwrap_or_else(|| NO_DESCRIPTION.to_string())),
        );
        entity.insert(
            "datePublished".into(),
            json!(self.options.date_published.clone()),
        );
        if !standalone {
            entity.insert("pcdm:memberOf".into(), reference(ROOT_ID));
            if let Some(date) = &date {
                entity.insert("startDate".into(), json!(date));
            }
            if let Some(keywords) = session.properties.meaningful("keyword") {
                entity.insert("keywords".into(), json!(keywords));
            }
        }

        self.apply_fields(
            FieldScope::Session,
            &session.properties,
            &session.custom_properties,
            &mut entity,
        )?;

        let contributors = ContributorResolver::resolve(session, project);
        contributors.apply_roles(&mut entity);
        for placeholder in contributors.placeholders.iter().cloned() {
            self.entities.upsert(placeholder)?;
        }
        let (parent, person_license) = if self.group_person_files {
            (PersonFileParent::Grouped, COLLECTION_LICENSE_ID)
        } else {
            (PersonFileParent::Detached, license_id.as_str())
        };
        for person in &contributors.resolved {
            self.emit_person(person, date.as_deref(), parent, person_license)?;
        }

        let kind = session.folder_kind();
        for file in session.files.iter().filter(|file| !file.is_rocrate_output()) {
            let mut file_node = file_entity(file, &kind);
            let file_id = kind.file_id(file.file_name());
            file_node.insert("isPartOf".into(), reference(&id));
            if let Some(file_license) =
                self.licenses
                    .ensure_file_license(file, session, Some(project))
            {
                file_node.insert("license".into(), reference(&file_license));
                self.file_license_ids.insert(file_license);
            }
            let material = MediaKind::from_extension(&file.extension()).material_type();
            self.materials.insert(material.to_string());
            file_node.insert("ldac:materialType".into(), reference(material));
            self.entities.insert(file_node)?;
            append_reference(&mut entity, "hasPart", &file_id);
        }

        entity.insert("license".into(), reference(&license_id));
        Ok(entity)
    }
}
