//! Entry points that assemble whole crates.
//!
//! # Responsibility
//! - Build the collection crate (root `./` over every session and person).
//! - Build standalone session and person crates.
//!
//! # Invariants
//! - The root node is always first in `@graph`.
//! - Supporting vocabularies are appended last and only for used terms.

use super::people::{first_session_year, PersonFileParent};
use super::places::project_content_location;
use super::{
    append_reference, metadata_descriptor, reference, Entity, GraphBuilder, GraphResult,
    LDAC_COLLECTION_PROFILE, LDAC_OBJECT_PROFILE,
};
use crate::catalog::FieldScope;
use crate::contributor::unknown_contributor_entity;
use crate::iri::{slug, FolderKind, COLLECTION_LICENSE_ID, ROOT_ID, UNKNOWN_CONTRIBUTOR_ID};
use crate::license::{
    collection_license, create_access_license, create_distinct_licenses,
    create_ldac_access_type_definitions, create_referenced_license,
};
use crate::material::create_ldac_material_type_definitions;
use crate::model::{FileRecord, Person, Session};
use log::info;
use serde_json::{json, Value};
use std::collections::BTreeSet;

pub const DESCRIPTION_DOCUMENTS_ID: &str = "DescriptionDocuments/";
pub const OTHER_DOCUMENTS_ID: &str = "OtherDocuments/";
pub const COLLECTION_PROTOCOL_ID: &str = "#descriptionDocuments";

const NO_PROJECT_TITLE: &str = "No title provided for this project.";
const NO_PROJECT_DESCRIPTION: &str = "No description provided for this project.";
const PROTOCOL_FALLBACK_DESCRIPTION: &str =
    "DescriptionDocuments exported from lameta summarizing how this collection was gathered.";
const UNNAMED_ARCHIVES: [&str; 3] = ["default", "unknown", ""];

impl GraphBuilder<'_> {
    /// Builds the collection crate for the whole project.
    pub fn build_collection(mut self) -> GraphResult<Value> {
        let project = self.project;
        self.group_person_files = true;
        self.entities.insert(metadata_descriptor())?;

        let mut root = Entity::new();
        root.insert("@id".into(), json!(ROOT_ID));
        root.insert("@type".into(), json!(["Dataset", "RepositoryCollection"]));
        root.insert("conformsTo".into(), reference(LDAC_COLLECTION_PROFILE));
        let title = project.title();
        root.insert(
            "name".into(),
            json!(if title.is_empty() {
                NO_PROJECT_TITLE.to_string()
            } else {
                title.clone()
            }),
        );
        let description = project
            .properties
            .meaningful("collectionDescription")
            .unwrap_or_else(|| NO_PROJECT_DESCRIPTION.to_string());
        root.insert("description".into(), json!(description));
        root.insert(
            "datePublished".into(),
            json!(self.options.date_published.clone()),
        );
        let contact = self.contact_reference()?;
        for property in ["author", "accountablePerson", "dct:rightsHolder"] {
            root.insert(property.into(), contact.clone());
        }
        root.insert("license".into(), reference(COLLECTION_LICENSE_ID));

        self.apply_fields(
            FieldScope::Project,
            &project.properties,
            &project.custom_properties,
            &mut root,
        )?;

        for file in project.files.iter().filter(|file| !file.is_rocrate_output()) {
            let document =
                self.document_entity(file, &FolderKind::Project, ROOT_ID, COLLECTION_LICENSE_ID);
            let id = FolderKind::Project.file_id(file.file_name());
            self.entities.insert(document)?;
            append_reference(&mut root, "hasPart", &id);
        }

        self.link_publisher(&mut root)?;
        self.link_depositor(&mut root)?;
        if let Some((location, place)) = project_content_location(project) {
            self.entities.upsert(place)?;
            root.insert("contentLocation".into(), location);
        }

        for session in &project.sessions {
            let entity = self.build_session_entity(session, false)?;
            let id = super::entity_id(&entity).unwrap_or_default().to_string();
            self.entities.insert(entity)?;
            append_reference(&mut root, "pcdm:hasMember", &id);
        }

        if !project.description_documents.is_empty() {
            self.build_description_documents(&mut root, &contact)?;
        }
        if !project.other_documents.is_empty() {
            let (folder, _, _) = self.document_folder(
                OTHER_DOCUMENTS_ID,
                "Other Documents",
                "Additional documents associated with this collection.",
                &project.other_documents,
                &FolderKind::OtherDocuments,
            )?;
            self.entities.insert(folder)?;
            append_reference(&mut root, "hasPart", OTHER_DOCUMENTS_ID);
        }
        if let Some(people) = self.people_directory(COLLECTION_LICENSE_ID) {
            self.entities.insert(people)?;
            append_reference(&mut root, "hasPart", super::people::PEOPLE_DATASET_ID);
        }

        let sessions: Vec<&Session> = project.sessions.iter().collect();
        let mut licenses = create_distinct_licenses(&sessions, project, &self.extra_access);
        licenses.push(collection_license());
        self.emit_licenses(licenses)?;
        self.emit_supporting_entities()?;

        info!(
            "event=graph_built module=graph status=ok kind=collection run_id={} sessions={} entities={}",
            self.options.run_id,
            project.sessions.len(),
            self.entities.len() + 1
        );
        Ok(self.finish(root))
    }

    /// Builds a crate whose root is one session.
    pub fn build_session_export(mut self, session: &Session) -> GraphResult<Value> {
        let project = self.project;
        self.group_person_files = false;
        self.entities.insert(metadata_descriptor())?;
        let root = self.build_session_entity(session, true)?;
        let license = create_access_license(Some(&session.access()), project);
        self.emit_licenses(vec![license])?;
        self.emit_supporting_entities()?;
        info!(
            "event=graph_built module=graph status=ok kind=session run_id={} entities={}",
            self.options.run_id,
            self.entities.len() + 1
        );
        Ok(self.finish(root))
    }

    /// Builds a crate whose root is one person.
    pub fn build_person_export(mut self, person: &Person) -> GraphResult<Value> {
        let project = self.project;
        self.entities.insert(metadata_descriptor())?;

        let mut root = Entity::new();
        root.insert("@id".into(), json!(ROOT_ID));
        root.insert("@type".into(), json!(["Dataset", "pcdm:Object", "Person"]));
        root.insert("conformsTo".into(), reference(LDAC_OBJECT_PROFILE));
        root.insert(
            "datePublished".into(),
            json!(self.options.date_published.clone()),
        );
        self.apply_fields(
            FieldScope::Person,
            &person.properties,
            &person.custom_properties,
            &mut root,
        )?;
        self.apply_ldac_person_fields(person, first_session_year(project), &mut root);
        root.insert("license".into(), reference(COLLECTION_LICENSE_ID));
        self.attach_person_files(person, &mut root, PersonFileParent::Root, COLLECTION_LICENSE_ID)?;

        self.emit_licenses(vec![collection_license()])?;
        self.emit_supporting_entities()?;
        info!(
            "event=graph_built module=graph status=ok kind=person run_id={} entities={}",
            self.options.run_id,
            self.entities.len() + 1
        );
        Ok(self.finish(root))
    }

    /// Contact person text, or a reference to the shared unknown contributor.
    fn contact_reference(&mut self) -> GraphResult<Value> {
        match self.project.properties.meaningful("contactPerson") {
            Some(contact) => Ok(json!(contact)),
            None => {
                self.entities.upsert(unknown_contributor_entity())?;
                Ok(reference(UNKNOWN_CONTRIBUTOR_ID))
            }
        }
    }

    fn link_publisher(&mut self, root: &mut Entity) -> GraphResult<()> {
        let name = self.project.archive_configuration_name();
        if UNNAMED_ARCHIVES.contains(&name.to_lowercase().as_str()) {
            return Ok(());
        }
        let id = format!("#publisher-{}", slug(&name));
        let configuration = self.project.archive_configuration();
        let mut organization = Entity::new();
        organization.insert("@id".into(), json!(id));
        organization.insert("@type".into(), json!("Organization"));
        let display_name = configuration
            .and_then(|config| config.configuration_full_name.clone())
            .filter(|full| !full.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        organization.insert("name".into(), json!(display_name));
        if let Some(description) = configuration.and_then(|config| config.description.as_ref()) {
            organization.insert("description".into(), json!(description));
        }
        if let Some(url) = configuration.and_then(|config| config.url.as_ref()) {
            organization.insert("url".into(), json!(url));
        }
        self.entities.upsert(organization)?;
        root.insert("publisher".into(), reference(&id));
        root.insert("holdingArchive".into(), reference(&id));
        Ok(())
    }

    fn link_depositor(&mut self, root: &mut Entity) -> GraphResult<()> {
        let Some(depositor) = self.project.properties.meaningful("depositor") else {
            return Ok(());
        };
        let id = format!("#depositor-{}", slug(&depositor));
        let mut person = Entity::new();
        person.insert("@id".into(), json!(id));
        person.insert("@type".into(), json!("Person"));
        person.insert("name".into(), json!(depositor));
        self.entities.upsert(person)?;
        root.insert("ldac:depositor".into(), reference(&id));
        Ok(())
    }

    /// Emits one document folder dataset and its files.
    ///
    /// Returns the dataset, its file ids and the earliest file `dateCreated`.
    fn document_folder(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
        files: &[FileRecord],
        kind: &FolderKind,
    ) -> GraphResult<(Entity, Vec<String>, Option<String>)> {
        let mut folder = Entity::new();
        folder.insert("@id".into(), json!(id));
        folder.insert("@type".into(), json!("Dataset"));
        folder.insert("name".into(), json!(name));
        folder.insert("description".into(), json!(description));
        folder.insert("isPartOf".into(), reference(ROOT_ID));
        folder.insert("license".into(), reference(COLLECTION_LICENSE_ID));

        let mut file_ids = Vec::new();
        let mut earliest: Option<String> = None;
        for file in files.iter().filter(|file| !file.is_rocrate_output()) {
            let document = self.document_entity(file, kind, id, COLLECTION_LICENSE_ID);
            let file_id = kind.file_id(file.file_name());
            if let Some(created) = &file.date_created {
                if earliest.as_ref().map_or(true, |known| created < known) {
                    earliest = Some(created.clone());
                }
            }
            self.entities.insert(document)?;
            append_reference(&mut folder, "hasPart", &file_id);
            file_ids.push(file_id);
        }
        Ok((folder, file_ids, earliest))
    }

    fn build_description_documents(&mut self, root: &mut Entity, contact: &Value) -> GraphResult<()> {
        let project = self.project;
        let (folder, file_ids, earliest) = self.document_folder(
            DESCRIPTION_DOCUMENTS_ID,
            "Description Documents",
            "Documents describing the collection methodology and protocols.",
            &project.description_documents,
            &FolderKind::DescriptionDocuments,
        )?;
        self.entities.insert(folder)?;
        append_reference(root, "hasPart", DESCRIPTION_DOCUMENTS_ID);

        let title = project.title();
        let mut protocol = Entity::new();
        protocol.insert("@id".into(), json!(COLLECTION_PROTOCOL_ID));
        protocol.insert("@type".into(), json!("ldac:CollectionProtocol"));
        protocol.insert(
            "name".into(),
            json!(if title.is_empty() {
                "Collection protocol documents".to_string()
            } else {
                format!("{title} collection protocol")
            }),
        );
        protocol.insert(
            "description".into(),
            json!(project
                .properties
                .meaningful("collectionDescription")
                .unwrap_or_else(|| PROTOCOL_FALLBACK_DESCRIPTION.to_string())),
        );
        protocol.insert("author".into(), contact.clone());
        protocol.insert(
            "datePublished".into(),
            json!(earliest.unwrap_or_else(|| self.options.date_published.clone())),
        );
        protocol.insert(
            "hasPart".into(),
            json!(file_ids.iter().map(|id| reference(id)).collect::<Vec<_>>()),
        );
        protocol.insert("isPartOf".into(), reference(ROOT_ID));
        self.entities.insert(protocol)?;
        append_reference(root, "ldac:hasCollectionProtocol", COLLECTION_PROTOCOL_ID);
        Ok(())
    }

    /// Upserts license entities and the access terms they use.
    ///
    /// File license ids with no matching entity get one of their own, so every
    /// `license` reference resolves.
    fn emit_licenses(&mut self, mut licenses: Vec<Entity>) -> GraphResult<()> {
        let emitted: BTreeSet<String> = licenses
            .iter()
            .filter_map(|license| super::entity_id(license).map(str::to_string))
            .collect();
        let missing: Vec<Entity> = self
            .file_license_ids
            .iter()
            .filter(|id| id.starts_with('#'))
            .filter(|id| !emitted.contains(*id) && !self.entities.contains(id))
            .map(|id| create_referenced_license(id, self.project))
            .collect();
        licenses.extend(missing);

        let mut used_access = BTreeSet::new();
        for license in licenses {
            if let Some(access) = license
                .get("ldac:access")
                .and_then(|access| access.get("@id"))
                .and_then(Value::as_str)
            {
                used_access.insert(access.to_string());
            }
            self.entities.upsert(license)?;
        }
        for definition in create_ldac_access_type_definitions(&used_access) {
            self.entities.upsert(definition)?;
        }
        Ok(())
    }

    /// Material types, languages and term sets referenced during the build.
    fn emit_supporting_entities(&mut self) -> GraphResult<()> {
        for definition in create_ldac_material_type_definitions(&self.materials) {
            self.entities.upsert(definition)?;
        }
        for language in self.languages.used_entities() {
            self.entities.upsert(language)?;
        }
        for set in self.term_sets.term_sets() {
            self.entities.upsert(set)?;
        }
        Ok(())
    }
}
