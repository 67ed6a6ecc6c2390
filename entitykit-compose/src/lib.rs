//! Trait composition engine for entitykit.
//!
//! A feature is built out of independently defined [`FeatureTrait`]s. Each
//! trait contributes a slice of state, action creators, selectors, mutators,
//! a reducer fragment and optional side-effect units; [`compose`] orders the
//! traits by their dependencies and merges their contributions into one
//! [`Feature`].
//!
//! Composition fails fast: dependency cycles, unknown dependencies and name
//! collisions are all reported by [`compose`], before a single action is
//! reduced.

mod composer;
mod context;
mod descriptor;
mod effect;
mod error;
mod feature;
mod naming;
mod reducer;
mod registry;
mod resolve;
mod state;

pub use composer::compose;
pub use context::CompositionContext;
pub use descriptor::{FeatureTrait, TraitDescriptor};
pub use effect::{
    effect_constructor, Collaborators, Effect, EffectConstructor, EffectDeps, SchedulePolicy,
    StateReader,
};
pub use error::{ComposeError, ComposeResult, ContributionKind};
pub use feature::Feature;
pub use naming::{capitalize, derive_keys, derive_keys_with_verb, AsyncKeys};
pub use reducer::{combine, Reducer, ReducerFragment};
pub use registry::{
    mutator, selector, selector_with, ActionCreator, ActionSet, ConfigRecord, Erased, MutateFn,
    MutatorSet, Registry, SelectFn, SelectWithFn, SelectorSet,
};
pub use resolve::{resolve_order, TraitNode};
pub use state::FeatureState;

// Re-exported so trait authors need only one import path.
pub use entitykit_types::Action;
