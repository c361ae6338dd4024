//! Contributor resolution.
//!
//! # Responsibility
//! - Group a session's contributions into LDAC role properties.
//! - Link names to Person records, or synthesize placeholder persons.
//!
//! # Invariants
//! - Role values are always arrays of `{"@id"}` references.
//! - One placeholder per distinct unresolved id per session.

use crate::iri::{create_person_id, create_unresolved_contributor_id, UNKNOWN_CONTRIBUTOR_ID};
use crate::model::{Person, Project, Session};
use serde_json::{json, Map, Value};

const DEFAULT_ROLE: &str = "participant";

/// Contributors of one session.
#[derive(Debug, Clone, Default)]
pub struct SessionContributors<'a> {
    /// `(ldac:<role>, [ids])` in first-seen role order.
    pub roles: Vec<(String, Vec<String>)>,
    /// Person entities standing in for unresolved names.
    pub placeholders: Vec<Map<String, Value>>,
    /// Person records referenced by the session, first-seen order.
    pub resolved: Vec<&'a Person>,
}

impl SessionContributors<'_> {
    /// Writes every role property onto `entity`.
    pub fn apply_roles(&self, entity: &mut Map<String, Value>) {
        for (property, ids) in &self.roles {
            let references: Vec<Value> = ids.iter().map(|id| json!({ "@id": id })).collect();
            entity.insert(property.clone(), Value::Array(references));
        }
    }
}

/// Resolves contributions against the project's people.
pub struct ContributorResolver;

impl ContributorResolver {
    pub fn resolve<'a>(session: &Session, project: &'a Project) -> SessionContributors<'a> {
        let mut result = SessionContributors::default();
        for contribution in session.all_contributions() {
            let name = contribution.person_reference.trim();
            let role = match contribution.role.trim().to_lowercase() {
                role if role.is_empty() => DEFAULT_ROLE.to_string(),
                role => role,
            };
            let id = match project.find_person(name) {
                Some(person) => {
                    if !result
                        .resolved
                        .iter()
                        .any(|known| known.file_prefix == person.file_prefix)
                    {
                        result.resolved.push(person);
                    }
                    create_person_id(&person.file_prefix)
                }
                None => {
                    let id = create_unresolved_contributor_id(name);
                    let known = result
                        .placeholders
                        .iter()
                        .any(|entity| entity.get("@id").and_then(Value::as_str) == Some(&id));
                    if !known {
                        result.placeholders.push(placeholder_entity(&id, name));
                    }
                    id
                }
            };

            let property = format!("ldac:{role}");
            match result.roles.iter_mut().find(|(key, _)| *key == property) {
                Some((_, ids)) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                None => result.roles.push((property, vec![id])),
            }
        }
        result
    }
}

fn placeholder_entity(id: &str, name: &str) -> Map<String, Value> {
    if id == UNKNOWN_CONTRIBUTOR_ID {
        let mut entity = unknown_contributor_entity();
        entity.insert(
            "description".into(),
            json!("Contribution recorded without a person name."),
        );
        return entity;
    }
    let mut entity = Map::new();
    entity.insert("@id".into(), json!(id));
    entity.insert("@type".into(), json!("Person"));
    entity.insert("name".into(), json!(name));
    entity.insert(
        "description".into(),
        json!(format!(
            "No Person record named '{name}' was found in this project; this entry could not find a matching Person folder."
        )),
    );
    entity
}

/// Shared `#unknown-contributor` Person.
pub fn unknown_contributor_entity() -> Map<String, Value> {
    let mut entity = Map::new();
    entity.insert("@id".into(), json!(UNKNOWN_CONTRIBUTOR_ID));
    entity.insert("@type".into(), json!("Person"));
    entity.insert("name".into(), json!("Unknown"));
    entity
}
