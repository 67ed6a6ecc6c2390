//! Sorting, evaluated locally or by the backend.

use crate::keys::{
    CLEAR_PAGES_CACHE, ENTITIES, FILTER, LOAD_FIRST_PAGE, RESET_ENTITIES_SORT, SELECT_ALL,
    SELECT_SORT, SORT, SORT_ENTITIES, SORT_FIELD,
};
use crate::payload::decode;
use async_trait::async_trait;
use entitykit_compose::{
    derive_keys, effect_constructor, selector, Action, ActionCreator, ActionSet, ComposeResult,
    CompositionContext, Effect, EffectConstructor, Erased, FeatureState, FeatureTrait, Reducer,
    ReducerFragment, SchedulePolicy, SelectFn, SelectorSet, StateReader,
};
use entitykit_types::Entity;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Top-level entity field to sort by.
    pub active: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(active: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            active: active.into(),
            direction,
        }
    }

    pub fn asc(active: impl Into<String>) -> Self {
        Self::new(active, SortDirection::Asc)
    }

    pub fn desc(active: impl Into<String>) -> Self {
        Self::new(active, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    #[serde(default)]
    pub default_sort: Option<Sort>,
    /// Sort on the backend instead of reordering loaded entities.
    #[serde(default)]
    pub remote: bool,
}

/// Sorts `entities` in place. The sort is stable, so entities with equal
/// keys keep their relative order in both directions.
pub fn sort_entities(entities: &mut [Entity], sort: &Sort) {
    entities.sort_by(|a, b| {
        let ordering = compare_values(a.field(&sort.active), b.field(&sort.active));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Total order over JSON values: missing and null first, then booleans,
/// numbers, strings, arrays and objects.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank(a) == rank(b) => x.to_string().cmp(&y.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The sort trait.
#[derive(Debug, Clone, Default)]
pub struct SortTrait {
    config: SortConfig,
}

impl SortTrait {
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    pub fn remote() -> Self {
        Self::new(SortConfig {
            remote: true,
            ..SortConfig::default()
        })
    }
}

impl FeatureTrait for SortTrait {
    fn key(&self) -> &str {
        SORT
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn runs_after(&self) -> Vec<String> {
        vec![FILTER.into()]
    }

    fn shadows(&self) -> Vec<String> {
        if self.config.remote {
            Vec::new()
        } else {
            vec![SELECT_ALL.into()]
        }
    }

    fn config(&self) -> Option<Erased> {
        Some(Erased::new(self.config.clone()))
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(SORT_ENTITIES)
            .action(RESET_ENTITIES_SORT))
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let mut selectors = SelectorSet::new().with(
            SELECT_SORT,
            selector(|s: &FeatureState| s.get_or_default::<Option<Sort>>(SORT_FIELD)),
        );
        if !self.config.remote {
            let previous = ctx
                .all_selectors()
                .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, SORT)?;
            selectors.insert(
                SELECT_ALL,
                selector(move |s: &FeatureState| {
                    let mut all = previous(s);
                    if let Some(sort) = s.get::<Option<Sort>>(SORT_FIELD).and_then(Option::as_ref) {
                        sort_entities(&mut all, sort);
                    }
                    all
                }),
            );
        }
        Ok(selectors)
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(SORT_FIELD, self.config.default_sort.clone()))
    }

    fn reducer(&self, _ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let default_sort = self.config.default_sort.clone();
        Ok(Some(
            ReducerFragment::new()
                .on(SORT_ENTITIES, |state, action| match decode::<Sort>(action) {
                    Some(sort) => state.with(SORT_FIELD, Some(sort)),
                    None => state,
                })
                .on(RESET_ENTITIES_SORT, move |state, _| {
                    state.with(SORT_FIELD, default_sort.clone())
                })
                .into_reducer(),
        ))
    }

    fn effects(&self, _ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        if !self.config.remote {
            return Ok(Vec::new());
        }
        Ok(vec![effect_constructor(|deps| {
            let reload = Reload::from_actions(deps.actions, SORT)?;
            Ok(Arc::new(RemoteSortEffect { reload }) as Arc<dyn Effect>)
        })])
    }
}

/// The actions that refetch the list after remote criteria change: clear
/// the page cache and load the first page when paginated, otherwise reload
/// all entities.
#[derive(Debug, Clone)]
pub(crate) enum Reload {
    Paged {
        clear: ActionCreator,
        first_page: ActionCreator,
    },
    All {
        load: ActionCreator,
    },
}

impl Reload {
    pub(crate) fn from_actions(actions: &ActionSet, trait_key: &str) -> ComposeResult<Self> {
        if actions.contains(LOAD_FIRST_PAGE) {
            Ok(Self::Paged {
                clear: actions.require_creator(CLEAR_PAGES_CACHE, trait_key)?,
                first_page: actions.require_creator(LOAD_FIRST_PAGE, trait_key)?,
            })
        } else {
            let load = derive_keys(ENTITIES).call;
            Ok(Self::All {
                load: actions.require_creator(&load, trait_key)?,
            })
        }
    }

    pub(crate) fn actions(&self) -> Vec<Action> {
        match self {
            Self::Paged { clear, first_page } => {
                vec![clear.empty(), first_page.create(json!({ "forceLoad": true }))]
            }
            Self::All { load } => vec![load.empty()],
        }
    }
}

struct RemoteSortEffect {
    reload: Reload,
}

#[async_trait]
impl Effect for RemoteSortEffect {
    fn name(&self) -> &str {
        "remoteSort"
    }

    fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::SerializeFifo
    }

    fn accepts(&self, action: &Action) -> bool {
        action.is(SORT_ENTITIES) || action.is(RESET_ENTITIES_SORT)
    }

    async fn run(&self, action: Action, _state: StateReader) -> Vec<Action> {
        debug!("Sort changed by {}, reloading", action);
        self.reload.actions()
    }
}
