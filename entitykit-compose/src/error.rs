//! Error types for feature composition.
//!
//! Every variant is a build-time failure: it is raised while composing a
//! feature (or while constructing its effect units), never while reducing.

use std::fmt;
use thiserror::Error;

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// What kind of contribution collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    Action,
    Selector,
    Mutator,
    StateField,
    Config,
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Action => "action",
            Self::Selector => "selector",
            Self::Mutator => "mutator",
            Self::StateField => "state field",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Errors raised while composing a feature.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Two descriptors share a key.
    #[error("trait '{0}' is listed more than once")]
    DuplicateTrait(String),

    /// A descriptor depends on a key that is not part of the composition.
    #[error("trait '{trait_key}' depends on unknown trait '{dependency}'")]
    UnknownDependency { trait_key: String, dependency: String },

    /// The dependency graph has a cycle. `cycle` lists the keys involved,
    /// starting and ending with the same key.
    #[error("cyclic trait dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A contribution reused a name already owned by an earlier trait.
    #[error("{kind} '{key}' from trait '{trait_key}' collides with trait '{owner}'")]
    DuplicateKey {
        kind: ContributionKind,
        key: String,
        trait_key: String,
        owner: String,
    },

    /// A trait declared it shadows a name that no earlier trait provides.
    #[error("trait '{trait_key}' shadows '{key}', which no earlier trait provides")]
    NothingToShadow { key: String, trait_key: String },

    /// A trait's configuration is unusable.
    #[error("invalid config for trait '{trait_key}': {reason}")]
    InvalidConfig { trait_key: String, reason: String },

    /// A trait needs a contribution (selector, mutator, config) that no
    /// earlier trait made, or made with another type.
    #[error("trait '{trait_key}' requires {kind} '{key}'")]
    MissingContribution {
        kind: ContributionKind,
        key: String,
        trait_key: String,
    },

    /// An effect unit needs a collaborator the host did not provide.
    #[error("effect '{effect}' requires collaborator {collaborator}")]
    MissingCollaborator {
        effect: String,
        collaborator: &'static str,
    },
}
