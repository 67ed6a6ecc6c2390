//! Change-log entries recorded by CRUD tracking.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of change recorded for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// One entry of a change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub id: EntityId,
    pub change_type: ChangeType,
    /// Snapshot of the affected data, kept only when the feature is
    /// configured to store changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_changes: Option<Value>,
}

impl Change {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, change_type: ChangeType) -> Self {
        Self {
            id: id.into(),
            change_type,
            entity_changes: None,
        }
    }

    #[must_use]
    pub fn created(id: impl Into<EntityId>) -> Self {
        Self::new(id, ChangeType::Created)
    }

    #[must_use]
    pub fn updated(id: impl Into<EntityId>) -> Self {
        Self::new(id, ChangeType::Updated)
    }

    #[must_use]
    pub fn deleted(id: impl Into<EntityId>) -> Self {
        Self::new(id, ChangeType::Deleted)
    }

    /// Attaches snapshot data to the entry.
    #[must_use]
    pub fn with_entity_changes(mut self, changes: Value) -> Self {
        self.entity_changes = Some(changes);
        self
    }
}
