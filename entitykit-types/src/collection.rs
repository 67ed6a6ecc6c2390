//! Normalized entity storage: a map by ID plus the ID ordering.
//!
//! Every operation keeps the two halves consistent: an ID is in `ids` exactly
//! when its record is in `entities`, and `ids` holds no duplicates. Reducers
//! clone the collection and apply operations to the clone, so a snapshot held
//! elsewhere is never modified.

use crate::{Entity, EntityId, EntityUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The outcome of an update addressed to an existing entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// The ID the update was addressed to.
    pub from: EntityId,
    /// The ID after the update (differs from `from` on a rename).
    pub to: EntityId,
}

impl AppliedUpdate {
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.from != self.to
    }
}

/// The outcome of an upsert for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Ordered, normalized entity collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    ids: Vec<EntityId>,
    entities: HashMap<EntityId, Entity>,
}

impl EntityCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The IDs in collection order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// The map of records by ID.
    pub fn entities(&self) -> &HashMap<EntityId, Entity> {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Iterates records in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    /// All records in collection order.
    #[must_use]
    pub fn all(&self) -> Vec<Entity> {
        self.iter().cloned().collect()
    }

    /// Replaces the whole collection. A repeated ID keeps its first position
    /// and its last record.
    pub fn set_all(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.ids.clear();
        self.entities.clear();
        for entity in entities {
            self.upsert_one(entity);
        }
    }

    /// Appends records whose IDs are not already present. Returns the IDs
    /// that were actually added.
    pub fn add_many(&mut self, entities: impl IntoIterator<Item = Entity>) -> Vec<EntityId> {
        let mut added = Vec::new();
        for entity in entities {
            if self.entities.contains_key(entity.id()) {
                continue;
            }
            added.push(entity.id().clone());
            self.ids.push(entity.id().clone());
            self.entities.insert(entity.id().clone(), entity);
        }
        added
    }

    /// Inserts new records and replaces existing ones in place.
    pub fn upsert_many(
        &mut self,
        entities: impl IntoIterator<Item = Entity>,
    ) -> Vec<(EntityId, UpsertOutcome)> {
        entities
            .into_iter()
            .map(|entity| {
                let id = entity.id().clone();
                (id, self.upsert_one(entity))
            })
            .collect()
    }

    fn upsert_one(&mut self, entity: Entity) -> UpsertOutcome {
        let id = entity.id().clone();
        if self.entities.insert(id.clone(), entity).is_some() {
            UpsertOutcome::Replaced
        } else {
            self.ids.push(id);
            UpsertOutcome::Inserted
        }
    }

    /// Applies partial updates to existing records.
    ///
    /// Updates addressed to unknown IDs are skipped, as are renames onto an
    /// ID held by a different record. A rename keeps the record's position.
    pub fn update_many(&mut self, updates: &[EntityUpdate]) -> Vec<AppliedUpdate> {
        let mut applied = Vec::new();
        for update in updates {
            let Some(current) = self.entities.get(&update.id) else {
                continue;
            };
            let next = current.apply_changes(&update.changes);
            let to = next.id().clone();
            if to != update.id && self.entities.contains_key(&to) {
                continue;
            }
            if to != update.id {
                self.entities.remove(&update.id);
                if let Some(slot) = self.ids.iter_mut().find(|id| **id == update.id) {
                    *slot = to.clone();
                }
            }
            self.entities.insert(to.clone(), next);
            applied.push(AppliedUpdate {
                from: update.id.clone(),
                to,
            });
        }
        applied
    }

    /// Removes the given IDs. Returns the IDs that were present.
    pub fn remove_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) -> Vec<EntityId> {
        let removed: Vec<EntityId> = ids
            .into_iter()
            .filter(|id| self.entities.remove(*id).is_some())
            .cloned()
            .collect();
        if !removed.is_empty() {
            self.ids.retain(|id| self.entities.contains_key(id));
        }
        removed
    }

    /// Empties the collection. Returns the IDs that were present, in order.
    pub fn remove_all(&mut self) -> Vec<EntityId> {
        self.entities.clear();
        std::mem::take(&mut self.ids)
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.set_all(iter);
        collection
    }
}
