//! Payloads of the built-in actions.
//!
//! Lists of entities and IDs are decoded element by element: an element
//! without a resolvable ID is logged and skipped, and the rest of the action
//! still applies.

use entitykit_compose::Action;
use entitykit_types::{Entity, EntityId, EntityUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Decodes an action payload, logging and returning `None` on failure.
pub(crate) fn decode<T: DeserializeOwned>(action: &Action) -> Option<T> {
    match action.payload_as::<T>() {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!("Ignoring {} with undecodable payload: {}", action, e);
            None
        }
    }
}

/// `{ entities: [...] }`: add, upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitiesPayload {
    #[serde(default)]
    pub entities: Vec<Value>,
}

impl EntitiesPayload {
    pub fn entities(self) -> Vec<Entity> {
        to_entities(self.entities)
    }
}

/// `{ entities: [...], total? }`: the result of a list fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadedPayload {
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// `{ updates: [{ id, changes }] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatesPayload {
    #[serde(default)]
    pub updates: Vec<Value>,
}

impl UpdatesPayload {
    pub fn updates(self) -> Vec<EntityUpdate> {
        self.updates
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<EntityUpdate>(value) {
                Ok(update) => Some(update),
                Err(e) => {
                    warn!("Skipping update without a resolvable id: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// `{ ids: [...] }`: remove, select, deselect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdsPayload {
    #[serde(default)]
    pub ids: Vec<Value>,
}

impl IdsPayload {
    pub fn ids(self) -> Vec<EntityId> {
        to_ids(self.ids)
    }
}

/// `{ id }`: single-entity actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdPayload {
    #[serde(default)]
    pub id: Value,
}

impl IdPayload {
    pub fn id(&self) -> Option<EntityId> {
        let id = EntityId::from_value(&self.id);
        if id.is_none() {
            warn!("Skipping operation without a resolvable id: {}", self.id);
        }
        id
    }
}

/// `{ error? }`: failure of an async call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

pub(crate) fn to_entities(values: Vec<Value>) -> Vec<Entity> {
    values
        .into_iter()
        .filter_map(|value| match Entity::from_value(value) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("Skipping entity: {}", e);
                None
            }
        })
        .collect()
}

pub(crate) fn to_ids(values: Vec<Value>) -> Vec<EntityId> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = EntityId::from_value(&value);
            if id.is_none() {
                warn!("Skipping unresolvable id {}", value);
            }
            id
        })
        .collect()
}
