//! The trait descriptor contract.
//!
//! A feature trait is one independently defined slice of a feature. The
//! composer calls its factories in dependency order, each time with a view
//! of everything merged so far. Every factory has a default that contributes
//! nothing, so a trait implements only what it owns.

use crate::context::CompositionContext;
use crate::effect::EffectConstructor;
use crate::error::ComposeResult;
use crate::reducer::Reducer;
use crate::registry::{ActionSet, Erased, MutatorSet, SelectorSet};
use crate::state::FeatureState;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One composable slice of a feature.
pub trait FeatureTrait: Send + Sync {
    /// Unique key within a composition; also the namespace of its config.
    fn key(&self) -> &str;

    /// Traits that must be merged before this one.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Traits that, when present, must be merged before this one. Absent
    /// keys are ignored.
    fn runs_after(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names (state fields or selectors) this trait re-derives on top of an
    /// earlier trait's contribution.
    fn shadows(&self) -> Vec<String> {
        Vec::new()
    }

    /// This trait's config, stored under [`key`](Self::key).
    fn config(&self) -> Option<Erased> {
        None
    }

    /// Checks the config before anything is merged.
    fn validate(&self) -> ComposeResult<()> {
        Ok(())
    }

    fn actions(&self, ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        let _ = ctx;
        Ok(ActionSet::new())
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let _ = ctx;
        Ok(SelectorSet::new())
    }

    fn mutators(&self, ctx: &CompositionContext) -> ComposeResult<MutatorSet> {
        let _ = ctx;
        Ok(MutatorSet::new())
    }

    /// Fields this trait adds to the initial state.
    fn initial_state(&self, ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        let _ = ctx;
        Ok(FeatureState::new())
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let _ = ctx;
        Ok(None)
    }

    fn effects(&self, ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        let _ = ctx;
        Ok(Vec::new())
    }
}

type Factory<T> = Arc<dyn Fn(&CompositionContext) -> ComposeResult<T> + Send + Sync>;

/// A feature trait assembled from closures.
///
/// Useful for one-off traits that do not warrant their own type.
///
/// ```rust,ignore
/// let counter = TraitDescriptor::new("counter")
///     .with_actions(|_| Ok(ActionSet::new().action("increment")))
///     .with_initial_state(|_| Ok(FeatureState::new().with("count", 0u32)));
/// ```
#[derive(Clone)]
pub struct TraitDescriptor {
    key: String,
    depends_on: Vec<String>,
    runs_after: Vec<String>,
    shadows: Vec<String>,
    config: Option<Erased>,
    actions: Option<Factory<ActionSet>>,
    selectors: Option<Factory<SelectorSet>>,
    mutators: Option<Factory<MutatorSet>>,
    initial_state: Option<Factory<FeatureState>>,
    reducer: Option<Factory<Reducer>>,
    effects: Option<Factory<Vec<EffectConstructor>>>,
}

impl TraitDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            depends_on: Vec::new(),
            runs_after: Vec::new(),
            shadows: Vec::new(),
            config: None,
            actions: None,
            selectors: None,
            mutators: None,
            initial_state: None,
            reducer: None,
            effects: None,
        }
    }

    #[must_use]
    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(keys.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn runs_after<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runs_after.extend(keys.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn shadows<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shadows.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_config<T: Any + Send + Sync>(mut self, config: T) -> Self {
        self.config = Some(Erased::new(config));
        self
    }

    #[must_use]
    pub fn with_actions<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<ActionSet> + Send + Sync + 'static,
    {
        self.actions = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_selectors<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<SelectorSet> + Send + Sync + 'static,
    {
        self.selectors = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_mutators<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<MutatorSet> + Send + Sync + 'static,
    {
        self.mutators = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_initial_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<FeatureState> + Send + Sync + 'static,
    {
        self.initial_state = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_reducer<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<Reducer> + Send + Sync + 'static,
    {
        self.reducer = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_effects<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompositionContext) -> ComposeResult<Vec<EffectConstructor>> + Send + Sync + 'static,
    {
        self.effects = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for TraitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitDescriptor")
            .field("key", &self.key)
            .field("depends_on", &self.depends_on)
            .field("runs_after", &self.runs_after)
            .field("shadows", &self.shadows)
            .finish_non_exhaustive()
    }
}

impl FeatureTrait for TraitDescriptor {
    fn key(&self) -> &str {
        &self.key
    }

    fn depends_on(&self) -> Vec<String> {
        self.depends_on.clone()
    }

    fn runs_after(&self) -> Vec<String> {
        self.runs_after.clone()
    }

    fn shadows(&self) -> Vec<String> {
        self.shadows.clone()
    }

    fn config(&self) -> Option<Erased> {
        self.config.clone()
    }

    fn actions(&self, ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        self.actions.as_ref().map_or_else(|| Ok(ActionSet::new()), |f| f(ctx))
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        self.selectors.as_ref().map_or_else(|| Ok(SelectorSet::new()), |f| f(ctx))
    }

    fn mutators(&self, ctx: &CompositionContext) -> ComposeResult<MutatorSet> {
        self.mutators.as_ref().map_or_else(|| Ok(MutatorSet::new()), |f| f(ctx))
    }

    fn initial_state(&self, ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        self.initial_state
            .as_ref()
            .map_or_else(|| Ok(FeatureState::new()), |f| f(ctx))
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        self.reducer.as_ref().map(|f| f(ctx)).transpose()
    }

    fn effects(&self, ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        self.effects.as_ref().map_or_else(|| Ok(Vec::new()), |f| f(ctx))
    }
}
