//! Catalog-driven field mapping onto folder entities.
//!
//! Handlers run in a fixed order and the first that claims a field wins:
//! languages, vocabulary, place, template, rocrate key, plain value.

use super::{entity_id, reference, Entity, GraphBuilder, GraphError, GraphResult};
use crate::catalog::{FieldDefinition, FieldScope};
use crate::iri::{create_fragment_id, ROOT_ID};
use crate::language::UNDETERMINED_CODE;
use crate::model::{Properties, ARCHIVE_CONFIGURATION_KEY};
use crate::template::TemplateKind;
use crate::vocabulary::{create_term_definition, custom_mapping};
use log::warn;
use serde_json::{json, Value};

const DEPOSITOR_KEY: &str = "depositor";
const UNKNOWN_PROJECT_TITLE: &str = "unknown-project";

/// Plain fields carried by other mechanisms (license, places, root defaults).
const PLAIN_SKIPPED_KEYS: [&str; 10] = [
    "access",
    "collectionDescription",
    "status",
    "topic",
    "id",
    "locationRegion",
    "locationCountry",
    "locationContinent",
    "country",
    "continent",
];

impl GraphBuilder<'_> {
    /// Applies every catalog field of `scope` found in `properties`.
    ///
    /// Custom properties are copied as text for projects and sessions; person
    /// custom fields may hold personal data and are never exported.
    pub(crate) fn apply_fields(
        &mut self,
        scope: FieldScope,
        properties: &Properties,
        custom: &Properties,
        entity: &mut Entity,
    ) -> GraphResult<()> {
        let catalog = self.catalog;
        for field in catalog.fields(scope) {
            if scope == FieldScope::Person && !field.is_language_field() {
                continue;
            }
            let values = field_values(field, properties);
            if should_skip(field, scope, &values) {
                continue;
            }
            let key = field.property_key().to_string();
            if self.apply_language_field(field, &values, &key, entity) {
                continue;
            }
            if self.apply_vocabulary_field(field, &values, &key, entity)? {
                continue;
            }
            if self.apply_place_field(field, &values, &key, properties, entity)? {
                continue;
            }
            if self.apply_template_field(field, &values, &key, entity)? {
                continue;
            }
            if apply_rocrate_key_field(field, &values, &key, entity) {
                continue;
            }
            apply_plain_field(field, &values, &key, entity);
        }

        if scope != FieldScope::Person {
            copy_custom_properties(catalog.fields(scope), custom, entity);
        }
        Ok(())
    }

    fn apply_language_field(
        &mut self,
        field: &FieldDefinition,
        values: &[String],
        key: &str,
        entity: &mut Entity,
    ) -> bool {
        if !field.is_language_field() {
            return false;
        }
        let user = entity_id(entity).unwrap_or(ROOT_ID).to_string();
        let mut references: Vec<Value> = values
            .iter()
            .filter(|value| !value.split(':').next().unwrap_or_default().trim().is_empty())
            .map(|value| self.languages.reference(value, &user))
            .collect();
        if references.is_empty() {
            references.push(self.languages.reference(UNDETERMINED_CODE, &user));
        }
        let single = field.rocrate.as_ref().and_then(|mapping| mapping.array) == Some(false);
        let value = if single {
            references.swap_remove(0)
        } else {
            Value::Array(references)
        };
        entity.insert(key.to_string(), value);
        true
    }

    fn apply_vocabulary_field(
        &mut self,
        field: &FieldDefinition,
        values: &[String],
        key: &str,
        entity: &mut Entity,
    ) -> GraphResult<bool> {
        let Some(file) = field.vocabulary_file.as_deref() else {
            return Ok(false);
        };
        let title = match self.project.title() {
            title if title.is_empty() => UNKNOWN_PROJECT_TITLE.to_string(),
            title => title,
        };
        let terms = values
            .first()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut references = Vec::new();
        for term in terms {
            let mapping = match self
                .vocabularies
                .get_vocabulary_mapping(&term, file, Some(&title))
            {
                Ok(mapping) => mapping,
                Err(err) => {
                    warn!(
                        "event=vocabulary_fallback module=graph status=warn field={} error={}",
                        field.key, err
                    );
                    custom_mapping(&term, Some(&title))
                }
            };
            self.term_sets.record(&mapping.id);
            self.entities.upsert(create_term_definition(&mapping))?;
            if !references.contains(&reference(&mapping.id)) {
                references.push(reference(&mapping.id));
            }
        }
        if !references.is_empty() {
            entity.insert(key.to_string(), Value::Array(references));
        }
        Ok(true)
    }

    fn apply_place_field(
        &mut self,
        field: &FieldDefinition,
        values: &[String],
        key: &str,
        properties: &Properties,
        entity: &mut Entity,
    ) -> GraphResult<bool> {
        let Some(template) = field.template() else {
            return Ok(false);
        };
        if !template.is_place() || field.key != "location" {
            return Ok(false);
        }
        let parts: Vec<String> = ["locationRegion", "locationCountry", "locationContinent"]
            .iter()
            .filter_map(|part| properties.meaningful(part))
            .collect();
        for value in values {
            let mut place = template.render(value);
            if !place.contains_key("@id") {
                place.insert("@id".into(), json!(create_fragment_id("place", value)));
            }
            if !parts.is_empty() {
                place.insert(
                    "description".into(),
                    json!(format!("Located in {}", parts.join(", "))),
                );
            }
            let id = entity_id(&place).ok_or(GraphError::MissingId)?.to_string();
            self.entities.upsert(place)?;
            link(field.template_kind(), key, &id, entity);
        }
        Ok(true)
    }

    fn apply_template_field(
        &mut self,
        field: &FieldDefinition,
        values: &[String],
        key: &str,
        entity: &mut Entity,
    ) -> GraphResult<bool> {
        let Some(template) = field.template() else {
            return Ok(false);
        };
        for value in values {
            let leaf = template.render(value);
            let id = entity_id(&leaf).ok_or(GraphError::MissingId)?.to_string();
            self.entities.upsert(leaf)?;
            link(field.template_kind(), key, &id, entity);
        }
        Ok(true)
    }
}

fn link(kind: TemplateKind, key: &str, id: &str, entity: &mut Entity) {
    match kind {
        TemplateKind::Array => super::append_reference(entity, key, id),
        _ => {
            entity.insert(key.to_string(), reference(id));
        }
    }
}

fn apply_rocrate_key_field(
    field: &FieldDefinition,
    values: &[String],
    key: &str,
    entity: &mut Entity,
) -> bool {
    let Some(mapping) = &field.rocrate else {
        return false;
    };
    if mapping.template.is_some() || mapping.handler.is_some() || field.vocabulary_file.is_some()
    {
        return false;
    }
    if let Some(value) = values.first() {
        entity.insert(key.to_string(), json!(value));
    }
    true
}

fn apply_plain_field(field: &FieldDefinition, values: &[String], key: &str, entity: &mut Entity) {
    let Some(value) = values.first() else {
        return;
    };
    if PLAIN_SKIPPED_KEYS.contains(&field.key.as_str()) {
        return;
    }
    if field.key == "title" && entity.get("name").and_then(Value::as_str) == Some(value) {
        return;
    }
    if field.is_additional {
        warn!(
            "event=field_skipped module=graph status=warn field={} reason=no_rocrate_definition",
            field.key
        );
        return;
    }
    let target = if field.key == "date" { "dateCreated" } else { key };
    entity.insert(target.to_string(), json!(value));
}

fn copy_custom_properties(
    known: &[FieldDefinition],
    custom: &Properties,
    entity: &mut Entity,
) {
    for (key, value) in custom.values() {
        if key == ARCHIVE_CONFIGURATION_KEY || key == DEPOSITOR_KEY {
            continue;
        }
        if known.iter().any(|field| field.key == key) {
            continue;
        }
        let text = value.as_text();
        let text = text.trim();
        if text.is_empty() || text == "unspecified" {
            continue;
        }
        entity.insert(key.to_string(), json!(text));
    }
}

/// Values of `field`, split on `;` for language fields.
fn field_values(field: &FieldDefinition, properties: &Properties) -> Vec<String> {
    if field.omit_export {
        return Vec::new();
    }
    let raw = properties.text(&field.key);
    if field.is_language_field() {
        return raw
            .split(';')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

fn should_skip(field: &FieldDefinition, scope: FieldScope, values: &[String]) -> bool {
    if field.is_migrated() {
        return true;
    }
    if field.key == ARCHIVE_CONFIGURATION_KEY || field.key == DEPOSITOR_KEY {
        return true;
    }
    let empty = values.first().map_or(true, |value| value == "unspecified");
    if empty && !field.is_language_field() {
        return true;
    }
    scope == FieldScope::Person && field.personally_identifiable_information
}
