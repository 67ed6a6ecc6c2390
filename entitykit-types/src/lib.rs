//! Core type definitions for entitykit.
//!
//! This crate defines the plain data shared by every other crate:
//! - [`EntityId`] and [`Entity`] for identified JSON records
//! - [`EntityCollection`] for the normalized map-by-id plus ID ordering
//! - [`Action`] for the type-plus-payload unit dispatched to a feature
//! - [`Change`] / [`ChangeType`] for change-log entries
//! - [`CallStatus`] for progress of an asynchronous call
//!
//! Nothing here knows about traits or composition.

mod action;
mod change;
mod collection;
mod entity;
mod ids;
mod status;

pub use action::Action;
pub use change::{Change, ChangeType};
pub use collection::{AppliedUpdate, EntityCollection, UpsertOutcome};
pub use entity::{Entity, EntityUpdate, ID_FIELD};
pub use ids::EntityId;
pub use status::CallStatus;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding entities and actions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid payload for action '{kind}': {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid entity: {0}")]
    InvalidEntity(String),
}
