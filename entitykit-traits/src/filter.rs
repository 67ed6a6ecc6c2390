//! Filtering, evaluated locally by a predicate or by the backend.
//!
//! Filter changes go through a debounced effect: rapid `filterEntities`
//! actions coalesce into one, and `forceLoad` skips the wait. The effect
//! stores the new filter and, for remote filtering, refetches.

use crate::keys::{
    ENTITIES, FILTER, FILTERS_FIELD, FILTER_ENTITIES, RESET_ENTITIES_FILTER, SELECT_ALL,
    SELECT_ENTITIES_FILTER, STORE_ENTITIES_FILTER,
};
use crate::payload::decode;
use crate::sort::Reload;
use async_trait::async_trait;
use entitykit_compose::{
    effect_constructor, selector, Action, ActionCreator, ActionSet, ComposeResult,
    CompositionContext, Effect, EffectConstructor, Erased, FeatureState, FeatureTrait, Reducer,
    ReducerFragment, SchedulePolicy, SelectFn, SelectorSet, StateReader,
};
use entitykit_types::Entity;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Local filter predicate: does `entity` pass `filter`?
pub type FilterFn = Arc<dyn Fn(&Entity, &Value) -> bool + Send + Sync>;

fn default_debounce_time() -> u64 {
    400
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default)]
    pub default_filter: Option<Value>,
    /// Quiet period in milliseconds before a filter change applies.
    #[serde(default = "default_debounce_time")]
    pub default_debounce_time: u64,
    /// Filters loaded entities locally when set; otherwise the backend
    /// filters. Attached in code, never read from a config file.
    #[serde(skip)]
    pub filter_fn: Option<FilterFn>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_filter: None,
            default_debounce_time: default_debounce_time(),
            filter_fn: None,
        }
    }
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig")
            .field("default_filter", &self.default_filter)
            .field("default_debounce_time", &self.default_debounce_time)
            .field("local", &self.filter_fn.is_some())
            .finish()
    }
}

impl FilterConfig {
    #[must_use]
    pub fn with_filter_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entity, &Value) -> bool + Send + Sync + 'static,
    {
        self.filter_fn = Some(Arc::new(f));
        self
    }

    pub fn is_local(&self) -> bool {
        self.filter_fn.is_some()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.default_debounce_time)
    }
}

/// Payload of `filterEntities`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    #[serde(default)]
    pub filter: Value,
    /// Apply immediately, even if the filter did not change.
    #[serde(default)]
    pub force_load: bool,
    /// Merge into the current filter instead of replacing it.
    #[serde(default)]
    pub patch: bool,
}

/// Payload of `storeEntitiesFilter`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreFilterPayload {
    #[serde(default)]
    pub filter: Value,
    #[serde(default)]
    pub patch: bool,
}

/// Shallow-merges `patch` into `current` when both are objects; otherwise
/// the patch replaces the current filter.
pub fn merge_filter(current: Option<&Value>, patch: Value) -> Value {
    match (current, patch) {
        (Some(Value::Object(current)), Value::Object(patch)) => {
            let mut merged = current.clone();
            merged.extend(patch);
            Value::Object(merged)
        }
        (_, patch) => patch,
    }
}

fn current_filter(state: &FeatureState) -> Option<Value> {
    state.get_or_default::<Option<Value>>(FILTERS_FIELD)
}

/// The filter trait.
#[derive(Debug, Clone, Default)]
pub struct FilterTrait {
    config: FilterConfig,
}

impl FilterTrait {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// A filter evaluated locally by `f`.
    pub fn local<F>(f: F) -> Self
    where
        F: Fn(&Entity, &Value) -> bool + Send + Sync + 'static,
    {
        Self::new(FilterConfig::default().with_filter_fn(f))
    }
}

impl FeatureTrait for FilterTrait {
    fn key(&self) -> &str {
        FILTER
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn shadows(&self) -> Vec<String> {
        if self.config.is_local() {
            vec![SELECT_ALL.into()]
        } else {
            Vec::new()
        }
    }

    fn config(&self) -> Option<Erased> {
        Some(Erased::new(self.config.clone()))
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(FILTER_ENTITIES)
            .action(STORE_ENTITIES_FILTER)
            .action(RESET_ENTITIES_FILTER))
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let mut selectors =
            SelectorSet::new().with(SELECT_ENTITIES_FILTER, selector(current_filter));
        if let Some(filter_fn) = self.config.filter_fn.clone() {
            let previous = ctx
                .all_selectors()
                .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, FILTER)?;
            selectors.insert(
                SELECT_ALL,
                selector(move |s: &FeatureState| {
                    let mut all = previous(s);
                    if let Some(filter) = s.get::<Option<Value>>(FILTERS_FIELD).and_then(Option::as_ref) {
                        all.retain(|entity| filter_fn(entity, filter));
                    }
                    all
                }),
            );
        }
        Ok(selectors)
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(FILTERS_FIELD, self.config.default_filter.clone()))
    }

    fn reducer(&self, _ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        Ok(Some(
            ReducerFragment::new()
                .on(STORE_ENTITIES_FILTER, |state, action| {
                    let Some(payload) = decode::<StoreFilterPayload>(action) else {
                        return state;
                    };
                    let next = if payload.patch {
                        merge_filter(current_filter(&state).as_ref(), payload.filter)
                    } else {
                        payload.filter
                    };
                    // A null filter clears filtering.
                    state.with(FILTERS_FIELD, Some(next).filter(|v| !v.is_null()))
                })
                .into_reducer(),
        ))
    }

    fn effects(&self, _ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        let config = self.config.clone();
        Ok(vec![effect_constructor(move |deps| {
            let reload = if config.is_local() {
                None
            } else {
                Some(Reload::from_actions(deps.actions, FILTER)?)
            };
            Ok(Arc::new(FilterEffect {
                quiet: config.debounce(),
                default_filter: config.default_filter.clone(),
                store: deps.actions.require_creator(STORE_ENTITIES_FILTER, FILTER)?,
                reload,
            }) as Arc<dyn Effect>)
        })])
    }
}

struct FilterEffect {
    quiet: Duration,
    default_filter: Option<Value>,
    store: ActionCreator,
    reload: Option<Reload>,
}

impl FilterEffect {
    /// The requested filter, or the default one for a reset.
    fn requested(&self, action: &Action) -> Option<FilterPayload> {
        if action.is(RESET_ENTITIES_FILTER) {
            return Some(FilterPayload {
                filter: self.default_filter.clone().unwrap_or(Value::Null),
                force_load: true,
                patch: false,
            });
        }
        decode::<FilterPayload>(action)
    }
}

#[async_trait]
impl Effect for FilterEffect {
    fn name(&self) -> &str {
        "filterEntities"
    }

    fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::CoalesceLatest { quiet: self.quiet }
    }

    fn accepts(&self, action: &Action) -> bool {
        action.is(FILTER_ENTITIES) || action.is(RESET_ENTITIES_FILTER)
    }

    fn bypasses_debounce(&self, action: &Action) -> bool {
        self.requested(action).is_some_and(|p| p.force_load)
    }

    async fn run(&self, action: Action, state: StateReader) -> Vec<Action> {
        let Some(request) = self.requested(&action) else {
            return Vec::new();
        };
        let current = current_filter(&state());
        let next = if request.patch {
            merge_filter(current.as_ref(), request.filter)
        } else {
            request.filter
        };
        let next = Some(next).filter(|v| !v.is_null());
        if !request.force_load && current == next {
            debug!("Filter unchanged, skipping reload");
            return Vec::new();
        }

        let mut actions = vec![self.store.create(json!({ "filter": next }))];
        if let Some(reload) = &self.reload {
            actions.extend(reload.actions());
        }
        actions
    }
}
