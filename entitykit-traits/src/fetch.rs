//! Fetch collaborators.
//!
//! The load effects never talk to a backend directly. The host injects an
//! implementation of these traits through
//! [`Collaborators`](entitykit_compose::Collaborators), wrapped in an `Arc`.

use crate::pagination::PagedRequest;
use crate::sort::Sort;
use async_trait::async_trait;
use entitykit_types::{Entity, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// What a list fetch should return, built from the feature's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PagedRequest>,
}

/// The result of a list fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub entities: Vec<Entity>,
    /// Server-reported total. Required for partial and grow pagination to
    /// know how many pages exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl FetchResponse {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            total: None,
        }
    }

    #[must_use]
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

/// A fetch failure. Effects store it as a value; it never escapes a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(EntityId),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Failed(String),
}

impl FetchError {
    /// The error as stored in state.
    pub fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

/// Loads a list of entities.
#[async_trait]
pub trait EntitiesFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Loads one entity by ID.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch_one(&self, id: EntityId) -> Result<Entity, FetchError>;
}

/// The collaborator type the entities-loading effect looks up.
pub type SharedEntitiesFetcher = Arc<dyn EntitiesFetcher>;

/// The collaborator type the single-entity effect looks up.
pub type SharedEntityFetcher = Arc<dyn EntityFetcher>;
