//! Reducer fragments and the combinator that folds them.

use crate::state::FeatureState;
use entitykit_types::Action;
use std::collections::HashMap;
use std::sync::Arc;

/// A pure state transition.
pub type Reducer = Arc<dyn Fn(FeatureState, &Action) -> FeatureState + Send + Sync>;

type Handler = Arc<dyn Fn(FeatureState, &Action) -> FeatureState + Send + Sync>;

/// A reducer built from per-action-type handlers.
///
/// Actions with no registered handler pass through untouched, so the
/// fragment is the identity for every action its trait does not own or
/// react to. Several handlers may be registered for one type; they run in
/// registration order.
#[derive(Clone, Default)]
pub struct ReducerFragment {
    handlers: HashMap<String, Vec<Handler>>,
}

impl ReducerFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for actions of type `kind`.
    #[must_use]
    pub fn on<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(FeatureState, &Action) -> FeatureState + Send + Sync + 'static,
    {
        self.handlers
            .entry(kind.into())
            .or_default()
            .push(Arc::new(handler));
        self
    }

    /// Registers `handler` only when `condition` holds.
    #[must_use]
    pub fn on_if<F>(self, condition: bool, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(FeatureState, &Action) -> FeatureState + Send + Sync + 'static,
    {
        if condition {
            self.on(kind, handler)
        } else {
            self
        }
    }

    /// Action types this fragment reacts to.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn into_reducer(self) -> Reducer {
        Arc::new(move |state: FeatureState, action: &Action| match self.handlers.get(&action.kind) {
            Some(handlers) => handlers
                .iter()
                .fold(state, |state, handler| handler(state, action)),
            None => state,
        })
    }
}

/// Folds fragments into one reducer that applies each in order, feeding
/// one fragment's output to the next.
pub fn combine(fragments: Vec<Reducer>) -> Reducer {
    Arc::new(move |state: FeatureState, action: &Action| {
        fragments
            .iter()
            .fold(state, |state, fragment| fragment(state, action))
    })
}
