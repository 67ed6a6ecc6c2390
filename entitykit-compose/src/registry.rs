//! Named contribution registries.
//!
//! Actions, selectors, mutators and configs are all merged the same way: a
//! trait contributes a batch of named entries, and a name may only be
//! reused by a trait that declared it shadows that name. Selectors,
//! mutators and configs are type-erased so traits can contribute closures
//! of any signature; readers name the type they expect and get `None` on a
//! mismatch.

use crate::error::{ComposeError, ComposeResult, ContributionKind};
use crate::state::FeatureState;
use entitykit_types::Action;
use serde_json::Value;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A selector over the whole state.
pub type SelectFn<T> = Arc<dyn Fn(&FeatureState) -> T + Send + Sync>;

/// A selector taking an argument (page index, filter, id...).
pub type SelectWithFn<A, T> = Arc<dyn Fn(&FeatureState, A) -> T + Send + Sync>;

/// A state transform taking an argument.
pub type MutateFn<A> = Arc<dyn Fn(FeatureState, A) -> FeatureState + Send + Sync>;

/// Wraps a closure as a [`SelectFn`].
pub fn selector<T, F>(f: F) -> SelectFn<T>
where
    F: Fn(&FeatureState) -> T + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`SelectWithFn`].
pub fn selector_with<A, T, F>(f: F) -> SelectWithFn<A, T>
where
    F: Fn(&FeatureState, A) -> T + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`MutateFn`].
pub fn mutator<A, F>(f: F) -> MutateFn<A>
where
    F: Fn(FeatureState, A) -> FeatureState + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A type-erased registry value.
#[derive(Clone)]
pub struct Erased {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Erased {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Erased {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Builds actions of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreator {
    kind: String,
}

impl ActionCreator {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// An action of this type with no payload.
    pub fn empty(&self) -> Action {
        Action::new(self.kind.clone())
    }

    /// An action of this type carrying `payload`.
    pub fn create(&self, payload: Value) -> Action {
        Action::with_payload(self.kind.clone(), payload)
    }

    pub fn matches(&self, action: &Action) -> bool {
        action.kind == self.kind
    }
}

/// Selects what a registry holds and how collisions are reported.
pub trait Slot {
    type Value: Clone + Send + Sync;
    const KIND: ContributionKind;
}

/// Marker for the action registry.
pub enum Actions {}
/// Marker for the selector registry.
pub enum Selectors {}
/// Marker for the mutator registry.
pub enum Mutators {}
/// Marker for the namespaced config record.
pub enum Configs {}

impl Slot for Actions {
    type Value = ActionCreator;
    const KIND: ContributionKind = ContributionKind::Action;
}

impl Slot for Selectors {
    type Value = Erased;
    const KIND: ContributionKind = ContributionKind::Selector;
}

impl Slot for Mutators {
    type Value = Erased;
    const KIND: ContributionKind = ContributionKind::Mutator;
}

impl Slot for Configs {
    type Value = Erased;
    const KIND: ContributionKind = ContributionKind::Config;
}

#[derive(Clone)]
struct Entry<V> {
    /// Trait that contributed the entry; `None` until merged.
    owner: Option<String>,
    value: V,
}

/// Named entries contributed by traits.
pub struct Registry<S: Slot> {
    entries: BTreeMap<String, Entry<S::Value>>,
    _slot: PhantomData<fn() -> S>,
}

/// Logical action name → action creator.
pub type ActionSet = Registry<Actions>;
/// Selector name → type-erased selector.
pub type SelectorSet = Registry<Selectors>;
/// Mutator name → type-erased mutator.
pub type MutatorSet = Registry<Mutators>;
/// Trait key → that trait's config.
pub type ConfigRecord = Registry<Configs>;

impl<S: Slot> Default for Registry<S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            _slot: PhantomData,
        }
    }
}

impl<S: Slot> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            _slot: PhantomData,
        }
    }
}

impl<S: Slot> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, entry.owner.as_deref().unwrap_or("-"))),
            )
            .finish()
    }
}

impl<S: Slot> Registry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: S::Value) {
        self.entries.insert(name.into(), Entry { owner: None, value });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The trait that contributed `name`.
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.entries.get(name)?.owner.as_deref()
    }

    pub(crate) fn value(&self, name: &str) -> Option<&S::Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    /// Merges a trait's contributions.
    ///
    /// Fails without modifying `self` if any name is already owned by an
    /// earlier trait and is not listed in `shadows`.
    pub fn merge(&mut self, fragment: Self, trait_key: &str, shadows: &[String]) -> ComposeResult<()> {
        for name in fragment.entries.keys() {
            if shadows.iter().any(|s| s == name) {
                continue;
            }
            if let Some(existing) = self.entries.get(name) {
                return Err(ComposeError::DuplicateKey {
                    kind: S::KIND,
                    key: name.clone(),
                    trait_key: trait_key.to_string(),
                    owner: existing.owner.clone().unwrap_or_default(),
                });
            }
        }
        for (name, entry) in fragment.entries {
            self.entries.insert(
                name,
                Entry {
                    owner: Some(trait_key.to_string()),
                    value: entry.value,
                },
            );
        }
        Ok(())
    }
}

impl<S: Slot<Value = Erased>> Registry<S> {
    /// Adds a type-erased entry.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.insert_value(name, Erased::new(value));
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Reads an entry as `T`; `None` when absent or of another type.
    pub fn get<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.value(name)?.downcast::<T>()
    }

    /// Reads an entry that `trait_key` cannot work without.
    pub fn require<T: Any + Clone>(&self, name: &str, trait_key: &str) -> ComposeResult<T> {
        self.get::<T>(name)
            .ok_or_else(|| ComposeError::MissingContribution {
                kind: S::KIND,
                key: name.to_string(),
                trait_key: trait_key.to_string(),
            })
    }

    /// Type name of the entry, for diagnostics.
    pub fn type_of(&self, name: &str) -> Option<&'static str> {
        self.value(name).map(Erased::type_name)
    }
}

impl Registry<Actions> {
    /// Declares an action whose type equals its logical name.
    #[must_use]
    pub fn action(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.insert_value(name.clone(), ActionCreator::new(name));
        self
    }

    pub fn creator(&self, name: &str) -> Option<&ActionCreator> {
        self.value(name)
    }

    /// The creator for an action that `trait_key` cannot work without.
    pub fn require_creator(&self, name: &str, trait_key: &str) -> ComposeResult<ActionCreator> {
        self.creator(name)
            .cloned()
            .ok_or_else(|| ComposeError::MissingContribution {
                kind: ContributionKind::Action,
                key: name.to_string(),
                trait_key: trait_key.to_string(),
            })
    }

    /// Builds the named action, or `None` if no trait declared it.
    pub fn create(&self, name: &str, payload: Value) -> Option<Action> {
        self.creator(name).map(|c| c.create(payload))
    }

    /// Builds the named action with no payload.
    pub fn empty(&self, name: &str) -> Option<Action> {
        self.creator(name).map(ActionCreator::empty)
    }
}
