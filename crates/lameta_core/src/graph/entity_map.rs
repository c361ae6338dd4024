//! Insertion-ordered, id-indexed entity store.
//!
//! # Invariants
//! - Each `@id` appears at most once.
//! - Strict inserts never overwrite; conflicting content is an error.

use super::{entity_id, Entity, GraphError, GraphResult};
use log::warn;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a data entity.
    ///
    /// Re-inserting identical content is a no-op. Different content under an
    /// existing id means two builders disagree about one entity.
    pub fn insert(&mut self, entity: Entity) -> GraphResult<()> {
        let id = entity_id(&entity).ok_or(GraphError::MissingId)?.to_string();
        match self.index.get(&id) {
            Some(&position) if self.entities[position] == entity => Ok(()),
            Some(_) => Err(GraphError::DuplicateEntity(id)),
            None => {
                self.push(id, entity);
                Ok(())
            }
        }
    }

    /// Adds or merges a contextual entity.
    ///
    /// Missing properties are filled in; on conflicting values the first one
    /// is kept.
    pub fn upsert(&mut self, entity: Entity) -> GraphResult<()> {
        let id = entity_id(&entity).ok_or(GraphError::MissingId)?.to_string();
        let Some(&position) = self.index.get(&id) else {
            self.push(id, entity);
            return Ok(());
        };
        let existing = &mut self.entities[position];
        for (key, value) in entity {
            match existing.get(&key) {
                None => {
                    existing.insert(key, value);
                }
                Some(current) if *current != value => {
                    warn!(
                        "event=entity_conflict module=graph status=kept_first property={}",
                        key
                    );
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&position| &self.entities[position])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.index
            .get(id)
            .copied()
            .map(move |position| &mut self.entities[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Entities in insertion order with `hasPart` arrays deduped.
    pub fn into_graph(self) -> Vec<Value> {
        self.entities
            .into_iter()
            .map(|mut entity| {
                dedupe_has_part(&mut entity);
                Value::Object(entity)
            })
            .collect()
    }

    fn push(&mut self, id: String, entity: Entity) {
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
    }
}

/// Drops repeated `{"@id"}` references from `hasPart`, keeping first occurrences.
pub fn dedupe_has_part(entity: &mut Entity) {
    if let Some(Value::Array(parts)) = entity.get_mut("hasPart") {
        let mut seen = BTreeSet::new();
        parts.retain(|part| match part.get("@id").and_then(Value::as_str) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        });
    }
}
