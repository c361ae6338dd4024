//! Language entity registry.
//!
//! # Responsibility
//! - Produce exactly one `Language` entity per ISO 639-3 code per export.
//! - Track which entities reference each language so unused ones are not
//!   emitted.
//!
//! # Invariants
//! - `und` always resolves to the Lexvo IRI, never a local fragment.
//! - Used entities are emitted in first-registration order.

use crate::template::{language_code, Template};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Code used when no language was recorded.
pub const UNDETERMINED_CODE: &str = "und";
/// Globally resolvable id of the undetermined language.
pub const UNDETERMINED_LANGUAGE_ID: &str = "https://lexvo.org/id/iso639-3/und";

#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    template: Option<Template>,
    order: Vec<String>,
    entities: BTreeMap<String, Map<String, Value>>,
    usage: BTreeMap<String, BTreeSet<String>>,
}

impl LanguageRegistry {
    /// Registry rendering entities through the catalog's language template.
    pub fn new(template: Option<Template>) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    /// Returns the entity for a `code` or `code: Name` value, creating it once.
    pub fn entity(&mut self, value: &str) -> &Map<String, Value> {
        let code = language_code(value);
        if !self.entities.contains_key(&code) {
            let entity = self.build(&code, value);
            self.order.push(code.clone());
            self.entities.insert(code.clone(), entity);
        }
        &self.entities[&code]
    }

    /// Registers `value` as used by `user_id` and returns a `{"@id"}` reference.
    pub fn reference(&mut self, value: &str, user_id: &str) -> Value {
        let id = self
            .entity(value)
            .get("@id")
            .cloned()
            .unwrap_or(Value::Null);
        self.usage
            .entry(language_code(value))
            .or_default()
            .insert(user_id.to_string());
        json!({ "@id": id })
    }

    /// Entities referenced at least once, in registration order.
    pub fn used_entities(&self) -> Vec<Map<String, Value>> {
        self.order
            .iter()
            .filter(|code| self.usage_count(code) > 0)
            .filter_map(|code| self.entities.get(code).cloned())
            .collect()
    }

    pub fn usage_count(&self, code: &str) -> usize {
        self.usage
            .get(&language_code(code))
            .map_or(0, BTreeSet::len)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entities.clear();
        self.usage.clear();
    }

    fn build(&self, code: &str, value: &str) -> Map<String, Value> {
        if code == UNDETERMINED_CODE {
            let mut entity = Map::new();
            entity.insert("@id".into(), json!(UNDETERMINED_LANGUAGE_ID));
            entity.insert("@type".into(), json!("Language"));
            entity.insert("code".into(), json!(UNDETERMINED_CODE));
            entity.insert("name".into(), json!("Undetermined"));
            entity.insert(
                "description".into(),
                json!("Language marked as undetermined because no working language was specified in lameta"),
            );
            return entity;
        }
        match &self.template {
            Some(template) => template.render(value),
            None => {
                let mut entity = Map::new();
                entity.insert("@id".into(), json!(format!("#language_{code}")));
                entity.insert("@type".into(), json!("Language"));
                entity.insert("code".into(), json!(code));
                entity.insert("name".into(), json!(code));
                entity
            }
        }
    }
}
