//! Person entities, their files and the `People/` directory.
//!
//! # Invariants
//! - A Person record is emitted at most once per export, keyed by
//!   `People/<prefix>/`.
//! - Person files never list the person under `hasPart`; they point back with
//!   `about` and are reached through `image`/`subjectOf`.
//! - Personally identifiable and custom fields never reach the entity.

use super::files::file_entity;
use super::{append_reference, reference, Entity, GraphBuilder, GraphResult};
use crate::catalog::FieldScope;
use crate::iri::{create_person_files_dataset_id, create_person_id, ROOT_ID};
use crate::model::{Person, Project};
use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::json;

pub const PEOPLE_DATASET_ID: &str = "People/";

/// Where a person's files hang in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonFileParent {
    /// Under a `#<prefix>-files` dataset inside `People/`.
    Grouped,
    /// Directly under the root of a person export.
    Root,
    /// Linked from the person only (standalone session export).
    Detached,
}

/// Year of an ISO date or RFC 3339 timestamp.
pub fn year_of(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.year());
    }
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|date| date.year())
}

/// Year of the first session that carries a parseable date.
pub fn first_session_year(project: &Project) -> Option<i32> {
    project
        .sessions
        .iter()
        .find_map(|session| year_of(&session.properties.text("date")))
}

impl GraphBuilder<'_> {
    /// Emits `person` and its files the first time it is referenced.
    ///
    /// `session_date` is the date of the referencing session; age falls back
    /// to the project's first dated session.
    pub(crate) fn emit_person(
        &mut self,
        person: &Person,
        session_date: Option<&str>,
        parent: PersonFileParent,
        file_license: &str,
    ) -> GraphResult<()> {
        let id = create_person_id(&person.file_prefix);
        if !self.emitted_persons.insert(id.clone()) {
            return Ok(());
        }
        let mut entity = Entity::new();
        entity.insert("@id".into(), json!(id));
        entity.insert("@type".into(), json!("Person"));
        let reference_year = session_date
            .and_then(year_of)
            .or_else(|| first_session_year(self.project));
        self.apply_ldac_person_fields(person, reference_year, &mut entity);
        self.attach_person_files(person, &mut entity, parent, file_license)?;
        self.entities.upsert(entity)
    }

    /// Writes the LDAC-profile subset of a person's fields.
    pub(crate) fn apply_ldac_person_fields(
        &self,
        person: &Person,
        reference_year: Option<i32>,
        entity: &mut Entity,
    ) {
        entity.insert("name".into(), json!(person.display_name()));
        if let Some(gender) = person.properties.meaningful("gender") {
            entity.insert("gender".into(), json!(gender));
        }
        if let Some(age) = age_in(person, reference_year) {
            entity.insert("ldac:age".into(), json!(age.to_string()));
        }

        let mut description = Vec::new();
        if let Some(own) = person.properties.meaningful("description") {
            description.push(own);
        }
        for key in ["education", "primaryOccupation"] {
            let Some(value) = person.properties.meaningful(key) else {
                continue;
            };
            let label = self
                .catalog
                .find(FieldScope::Person, key)
                .map_or(key, |field| field.label());
            description.push(format!("{label}: {value}."));
        }
        if !description.is_empty() {
            entity.insert("description".into(), json!(description.join(" ")));
        }
    }

    /// Emits the person's files and links them to `entity`.
    pub(crate) fn attach_person_files(
        &mut self,
        person: &Person,
        entity: &mut Entity,
        parent: PersonFileParent,
        file_license: &str,
    ) -> GraphResult<()> {
        let person_id = entity
            .get("@id")
            .and_then(|id| id.as_str())
            .unwrap_or(ROOT_ID)
            .to_string();
        let dataset_id = create_person_files_dataset_id(&person.file_prefix);
        let kind = person.folder_kind();
        let mut file_ids = Vec::new();

        for file in person.files.iter().filter(|file| !file.is_rocrate_output()) {
            let mut file_node = file_entity(file, &kind);
            let file_id = kind.file_id(file.file_name());
            let property = if super::has_type(&file_node, "ImageObject") {
                "image"
            } else {
                "subjectOf"
            };
            append_reference(entity, property, &file_id);
            file_node.insert("about".into(), reference(&person_id));
            file_node.insert("license".into(), reference(file_license));
            match parent {
                PersonFileParent::Grouped => {
                    file_node.insert("isPartOf".into(), reference(&dataset_id));
                }
                PersonFileParent::Root => {
                    file_node.insert("isPartOf".into(), reference(ROOT_ID));
                    append_reference(entity, "hasPart", &file_id);
                }
                PersonFileParent::Detached => {}
            }
            self.entities.insert(file_node)?;
            file_ids.push(file_id);
        }

        if parent != PersonFileParent::Grouped || file_ids.is_empty() {
            return Ok(());
        }
        let mut dataset = Entity::new();
        dataset.insert("@id".into(), json!(dataset_id));
        dataset.insert("@type".into(), json!("Dataset"));
        dataset.insert("name".into(), json!(format!("{} files", person.file_prefix)));
        dataset.insert(
            "description".into(),
            json!(format!("Files associated with {}.", person.file_prefix)),
        );
        dataset.insert("about".into(), reference(&person_id));
        dataset.insert(
            "hasPart".into(),
            json!(file_ids.iter().map(|id| reference(id)).collect::<Vec<_>>()),
        );
        dataset.insert("isPartOf".into(), reference(PEOPLE_DATASET_ID));
        dataset.insert("license".into(), reference(file_license));
        self.entities.insert(dataset)?;
        append_reference(entity, "subjectOf", &dataset_id);
        self.person_datasets.insert(person_id, dataset_id);
        Ok(())
    }

    /// `People/` directory listing every person-files dataset, sorted.
    pub(crate) fn people_directory(&self, license: &str) -> Option<Entity> {
        if self.emitted_persons.is_empty() {
            return None;
        }
        let mut dataset_ids: Vec<&String> = self.person_datasets.values().collect();
        dataset_ids.sort();
        let mut directory = Entity::new();
        directory.insert("@id".into(), json!(PEOPLE_DATASET_ID));
        directory.insert("@type".into(), json!("Dataset"));
        directory.insert("name".into(), json!("People"));
        directory.insert(
            "description".into(),
            json!("Directory of people associated with this collection."),
        );
        directory.insert(
            "hasPart".into(),
            json!(dataset_ids.iter().map(|id| reference(id)).collect::<Vec<_>>()),
        );
        directory.insert("isPartOf".into(), reference(ROOT_ID));
        directory.insert("license".into(), reference(license));
        Some(directory)
    }
}

fn age_in(person: &Person, reference_year: Option<i32>) -> Option<i32> {
    let birth_year: i32 = person.properties.meaningful("birthYear")?.parse().ok()?;
    let reference_year = reference_year?;
    if !(0..=reference_year).contains(&birth_year) {
        return None;
    }
    reference_year.checked_sub(birth_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Properties, Session};

    #[test]
    fn year_of_accepts_dates_and_timestamps() {
        assert_eq!(year_of("2010-06-06"), Some(2010));
        assert_eq!(year_of("2019-03-01T10:00:00Z"), Some(2019));
        assert_eq!(year_of("sometime"), None);
    }

    #[test]
    fn first_session_year_skips_undated_sessions() {
        let mut undated = Session::new("a");
        undated.properties.insert("date", "");
        let mut dated = Session::new("b");
        dated.properties.insert("date", "2011-01-01");
        let project = Project {
            sessions: vec![undated, dated],
            ..Project::default()
        };
        assert_eq!(first_session_year(&project), Some(2011));
    }

    #[test]
    fn age_requires_numeric_birth_year() {
        let person = Person {
            properties: Properties::new().with("birthYear", "1960"),
            ..Person::default()
        };
        assert_eq!(age_in(&person, Some(2010)), Some(50));
        assert_eq!(age_in(&person, None), None);
        let unknown = Person {
            properties: Properties::new().with("birthYear", "?"),
            ..Person::default()
        };
        assert_eq!(age_in(&unknown, Some(2010)), None);
    }

    #[test]
    fn implausible_birth_years_have_no_age() {
        for year in ["-2147483000", "-5", "2011", "2147483647"] {
            let person = Person {
                properties: Properties::new().with("birthYear", year),
                ..Person::default()
            };
            assert_eq!(age_in(&person, Some(2010)), None, "birthYear {year}");
        }
    }
}
