//! Actions dispatched to a composed feature.
//!
//! An action is plain data: a type string plus a JSON payload. Reducer
//! fragments match on the type and decode the payload into the typed struct
//! they expect.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The action type, e.g. `loadPage`.
    pub kind: String,
    /// Action-specific payload; `Null` when the action carries none.
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    /// Creates an action with no payload.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Creates an action carrying `payload`.
    #[must_use]
    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Returns true if this action has the given type.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Decodes the payload into `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        // A missing payload decodes like an empty object so payload structs
        // made only of optional fields accept it.
        let payload = match &self.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(payload).map_err(|source| Error::InvalidPayload {
            kind: self.kind.clone(),
            source,
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)
    }
}
