use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Progress of an asynchronous call tracked in state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Fail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<Value>,
    },
}

impl CallStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// The error recorded by a failed call.
    #[must_use]
    pub fn error(&self) -> Option<&Value> {
        match self {
            Self::Fail { error } => error.as_ref(),
            _ => None,
        }
    }
}
