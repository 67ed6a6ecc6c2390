use crate::effect::{Collaborators, Effect, EffectConstructor, EffectDeps};
use crate::error::ComposeResult;
use crate::reducer::Reducer;
use crate::registry::{ActionSet, ConfigRecord, MutatorSet, SelectorSet};
use crate::state::FeatureState;
use entitykit_types::Action;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A fully composed feature.
///
/// Cheap to clone: every part is shared.
#[derive(Clone)]
pub struct Feature {
    pub(crate) order: Vec<String>,
    pub(crate) initial_state: FeatureState,
    pub(crate) configs: ConfigRecord,
    pub(crate) actions: ActionSet,
    pub(crate) selectors: SelectorSet,
    pub(crate) mutators: MutatorSet,
    pub(crate) reducer: Reducer,
    pub(crate) effects: Vec<EffectConstructor>,
}

impl Feature {
    /// Trait keys in merge order.
    pub fn trait_keys(&self) -> &[String] {
        &self.order
    }

    pub fn initial_state(&self) -> FeatureState {
        self.initial_state.clone()
    }

    pub fn configs(&self) -> &ConfigRecord {
        &self.configs
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    pub fn mutators(&self) -> &MutatorSet {
        &self.mutators
    }

    pub fn reducer(&self) -> Reducer {
        Arc::clone(&self.reducer)
    }

    /// Applies `action` to `state`.
    pub fn reduce(&self, state: FeatureState, action: &Action) -> FeatureState {
        (self.reducer)(state, action)
    }

    /// Applies actions in order, starting from `state`.
    pub fn reduce_all<'a>(
        &self,
        state: FeatureState,
        actions: impl IntoIterator<Item = &'a Action>,
    ) -> FeatureState {
        actions
            .into_iter()
            .fold(state, |state, action| self.reduce(state, action))
    }

    /// Builds the named action, or `None` when no trait declared it.
    pub fn action(&self, name: &str, payload: Value) -> Option<Action> {
        self.actions.create(name, payload)
    }

    /// Reads the named selector as `T` (a [`SelectFn`](crate::SelectFn) or
    /// [`SelectWithFn`](crate::SelectWithFn) of the right signature).
    pub fn selector<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.selectors.get::<T>(name)
    }

    /// Reads the named mutator as `T`.
    pub fn mutator<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.mutators.get::<T>(name)
    }

    /// Number of effect constructors contributed by the traits.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Builds every effect unit with the given collaborators.
    pub fn build_effects(&self, collaborators: &Collaborators) -> ComposeResult<Vec<Arc<dyn Effect>>> {
        let deps = EffectDeps {
            actions: &self.actions,
            selectors: &self.selectors,
            configs: &self.configs,
            collaborators,
        };
        self.effects.iter().map(|construct| construct(deps)).collect()
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("traits", &self.order)
            .field("state", &self.initial_state)
            .field("actions", &self.actions)
            .field("selectors", &self.selectors)
            .field("mutators", &self.mutators)
            .field("effects", &self.effects.len())
            .finish()
    }
}
