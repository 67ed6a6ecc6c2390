use entitykit_compose::ComposeError;
use thiserror::Error;

/// Errors raised by a [`FeatureStore`](crate::FeatureStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Building the effect units failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// No trait declared an action with this name.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// The selector is missing or has another signature.
    #[error("unknown selector '{name}' for {expected}")]
    UnknownSelector {
        name: String,
        expected: &'static str,
    },

    /// An effect unit's worker has stopped.
    #[error("effect '{0}' is no longer running")]
    EffectClosed(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
