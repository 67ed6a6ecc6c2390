use crate::registry::{ActionSet, ConfigRecord, MutatorSet, SelectorSet};
use crate::state::FeatureState;
use std::any::Any;

/// Everything merged so far, as seen by a trait's factories.
///
/// Factories get a shared reference: they read what earlier traits
/// contributed and return only what they own. The composer is the only
/// writer.
#[derive(Debug, Clone, Default)]
pub struct CompositionContext {
    pub(crate) trait_keys: Vec<String>,
    pub(crate) configs: ConfigRecord,
    pub(crate) actions: ActionSet,
    pub(crate) selectors: SelectorSet,
    pub(crate) mutators: MutatorSet,
    pub(crate) initial_state: FeatureState,
}

impl CompositionContext {
    /// Configs of every trait in the composition, keyed by trait key.
    pub fn all_configs(&self) -> &ConfigRecord {
        &self.configs
    }

    pub fn all_actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn all_selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    pub fn all_mutators(&self) -> &MutatorSet {
        &self.mutators
    }

    /// Initial state merged from the traits walked so far.
    pub fn initial_state(&self) -> &FeatureState {
        &self.initial_state
    }

    /// Reads the config stored under `trait_key`.
    pub fn config<T: Any + Clone>(&self, trait_key: &str) -> Option<T> {
        self.configs.get::<T>(trait_key)
    }

    /// True when a trait with this key takes part in the composition,
    /// whether or not it has been walked yet.
    pub fn has_trait(&self, key: &str) -> bool {
        self.trait_keys.iter().any(|k| k == key)
    }
}
