//! Side-effect units.
//!
//! A trait may contribute effect constructors. The host builds the units
//! once the feature is composed, passing every dependency explicitly: the
//! final action and selector sets, the config record, and the collaborators
//! it injects (fetchers, services). A running unit receives dispatched
//! actions together with a state reader and answers with follow-up actions.

use crate::error::{ComposeError, ComposeResult};
use crate::registry::{ActionSet, ConfigRecord, SelectorSet};
use crate::state::FeatureState;
use async_trait::async_trait;
use entitykit_types::Action;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Reads the feature's current state.
pub type StateReader = Arc<dyn Fn() -> FeatureState + Send + Sync>;

/// How a unit's runs are scheduled relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Wait for `quiet` without a new action, then run the latest one.
    /// Actions the unit marks as bypassing run immediately.
    CoalesceLatest { quiet: Duration },
    /// Run one action at a time in arrival order.
    SerializeFifo,
    /// While a run for a key is in flight, drop new actions with that key.
    DropIfBusy,
    /// Run every action as soon as it arrives.
    Concurrent,
}

/// A side-effect unit.
#[async_trait]
pub trait Effect: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::Concurrent
    }

    /// Whether this unit reacts to `action`.
    fn accepts(&self, action: &Action) -> bool;

    /// Single-flight key for [`SchedulePolicy::DropIfBusy`]. `None` puts
    /// the action under one shared key.
    fn flight_key(&self, action: &Action) -> Option<String> {
        let _ = action;
        None
    }

    /// Whether `action` skips the quiet period of
    /// [`SchedulePolicy::CoalesceLatest`].
    fn bypasses_debounce(&self, action: &Action) -> bool {
        let _ = action;
        false
    }

    /// Handles one action and returns the actions to dispatch next, in order.
    async fn run(&self, action: Action, state: StateReader) -> Vec<Action>;
}

/// Services injected by the host, keyed by type.
#[derive(Clone, Default)]
pub struct Collaborators {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collaborator, replacing one of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.services.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Reads a collaborator that `effect` cannot run without.
    pub fn require<T: Any + Send + Sync + Clone>(&self, effect: &str) -> ComposeResult<T> {
        self.get::<T>()
            .cloned()
            .ok_or_else(|| ComposeError::MissingCollaborator {
                effect: effect.to_string(),
                collaborator: type_name::<T>(),
            })
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("count", &self.services.len())
            .finish()
    }
}

/// Everything an effect constructor may depend on.
#[derive(Clone, Copy)]
pub struct EffectDeps<'a> {
    pub actions: &'a ActionSet,
    pub selectors: &'a SelectorSet,
    pub configs: &'a ConfigRecord,
    pub collaborators: &'a Collaborators,
}

/// Builds an effect unit from its dependencies.
pub type EffectConstructor =
    Arc<dyn Fn(EffectDeps<'_>) -> ComposeResult<Arc<dyn Effect>> + Send + Sync>;

/// Wraps a closure as an [`EffectConstructor`].
pub fn effect_constructor<F>(f: F) -> EffectConstructor
where
    F: Fn(EffectDeps<'_>) -> ComposeResult<Arc<dyn Effect>> + Send + Sync + 'static,
{
    Arc::new(f)
}
