//! Entity loading: the collection, its load status and the fetch effect.
//!
//! Every other built-in trait depends on this one. It owns the `entities`
//! field, the `loadEntities` call and the plain collection mutators.

use crate::fetch::{FetchRequest, SharedEntitiesFetcher};
use crate::keys::{
    ADD_ENTITIES, ENTITIES, ENTITIES_FIELD, PAGINATION, REMOVE_ALL_ENTITIES, REMOVE_ENTITIES,
    SELECT_ALL, SELECT_BY_ID, SELECT_ENTITIES_FILTER, SELECT_ENTITY_MAP, SELECT_IDS,
    SELECT_PAGED_REQUEST, SELECT_SORT, SELECT_TOTAL, SET_ENTITIES, UPDATE_ENTITIES,
    UPSERT_ENTITIES,
};
use crate::pagination::PagedRequest;
use crate::payload::{decode, to_entities, FailPayload, LoadedPayload};
use crate::sort::Sort;
use async_trait::async_trait;
use entitykit_compose::{
    derive_keys, effect_constructor, mutator, selector, selector_with, Action, ActionCreator,
    ActionSet, AsyncKeys, ComposeResult, CompositionContext, Effect, EffectConstructor,
    FeatureState, FeatureTrait, MutatorSet, Reducer, ReducerFragment, SelectFn,
    SelectWithFn, SelectorSet, StateReader,
};
use entitykit_types::{CallStatus, Entity, EntityCollection, EntityId, EntityUpdate};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Reads the entity collection. An uninitialized feature reads as empty.
pub fn collection(state: &FeatureState) -> EntityCollection {
    state.get_or_default::<EntityCollection>(ENTITIES_FIELD)
}

fn with_collection(state: FeatureState, f: impl FnOnce(&mut EntityCollection)) -> FeatureState {
    state.update::<EntityCollection, _>(ENTITIES_FIELD, f)
}

pub fn set_entities(state: FeatureState, entities: Vec<Entity>) -> FeatureState {
    with_collection(state, |c| c.set_all(entities))
}

pub fn add_entities(state: FeatureState, entities: Vec<Entity>) -> FeatureState {
    with_collection(state, |c| {
        c.add_many(entities);
    })
}

pub fn upsert_entities(state: FeatureState, entities: Vec<Entity>) -> FeatureState {
    with_collection(state, |c| {
        c.upsert_many(entities);
    })
}

pub fn update_entities(state: FeatureState, updates: Vec<EntityUpdate>) -> FeatureState {
    with_collection(state, |c| {
        c.update_many(&updates);
    })
}

pub fn remove_entities(state: FeatureState, ids: Vec<EntityId>) -> FeatureState {
    with_collection(state, |c| {
        c.remove_many(&ids);
    })
}

pub fn remove_all_entities(state: FeatureState, _: ()) -> FeatureState {
    with_collection(state, |c| {
        c.remove_all();
    })
}

/// The entities-loading trait.
#[derive(Debug, Clone)]
pub struct EntitiesTrait {
    keys: AsyncKeys,
}

impl Default for EntitiesTrait {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitiesTrait {
    pub fn new() -> Self {
        Self {
            keys: derive_keys(ENTITIES),
        }
    }

    /// The derived load action and status names.
    pub fn keys(&self) -> &AsyncKeys {
        &self.keys
    }
}

impl FeatureTrait for EntitiesTrait {
    fn key(&self) -> &str {
        ENTITIES
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(self.keys.call.clone())
            .action(self.keys.success.clone())
            .action(self.keys.fail.clone()))
    }

    fn selectors(&self, _ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let status = self.keys.status.clone();
        let status_of = move |s: &FeatureState| s.get_or_default::<CallStatus>(&status);
        let (loading, loaded, failed, error) = (
            status_of.clone(),
            status_of.clone(),
            status_of.clone(),
            status_of,
        );
        let select_by_id: SelectWithFn<EntityId, Option<Entity>> =
            selector_with(|s: &FeatureState, id: EntityId| collection(s).get(&id).cloned());
        let select_map: SelectFn<HashMap<EntityId, Entity>> =
            selector(|s: &FeatureState| collection(s).entities().clone());
        Ok(SelectorSet::new()
            .with(SELECT_ALL, selector(|s: &FeatureState| collection(s).all()))
            .with(SELECT_IDS, selector(|s: &FeatureState| collection(s).ids().to_vec()))
            .with(SELECT_ENTITY_MAP, select_map)
            .with(SELECT_TOTAL, selector(|s: &FeatureState| collection(s).len()))
            .with(SELECT_BY_ID, select_by_id)
            .with(
                self.keys.loading.clone(),
                selector(move |s: &FeatureState| loading(s).is_loading()),
            )
            .with(
                self.keys.loaded.clone(),
                selector(move |s: &FeatureState| loaded(s).is_loaded()),
            )
            .with(
                self.keys.failed.clone(),
                selector(move |s: &FeatureState| failed(s).is_fail()),
            )
            .with(
                self.keys.error.clone(),
                selector(move |s: &FeatureState| error(s).error().cloned()),
            ))
    }

    fn mutators(&self, _ctx: &CompositionContext) -> ComposeResult<MutatorSet> {
        Ok(MutatorSet::new()
            .with(SET_ENTITIES, mutator(set_entities))
            .with(ADD_ENTITIES, mutator(add_entities))
            .with(UPSERT_ENTITIES, mutator(upsert_entities))
            .with(UPDATE_ENTITIES, mutator(update_entities))
            .with(REMOVE_ENTITIES, mutator(remove_entities))
            .with(REMOVE_ALL_ENTITIES, mutator(remove_all_entities)))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new()
            .with(ENTITIES_FIELD, EntityCollection::new())
            .with(self.keys.status.clone(), CallStatus::Idle))
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        // With pagination configured, merging a loaded batch depends on the
        // cache policy, so the pagination trait owns it.
        let paginated = ctx.all_configs().contains(PAGINATION);
        let (loading, success, fail) = (
            self.keys.status.clone(),
            self.keys.status.clone(),
            self.keys.status.clone(),
        );
        Ok(Some(
            ReducerFragment::new()
                .on(self.keys.call.clone(), move |state, _| {
                    state.with(loading.clone(), CallStatus::Loading)
                })
                .on(self.keys.success.clone(), move |state, action| {
                    let state = state.with(success.clone(), CallStatus::Success);
                    if paginated {
                        return state;
                    }
                    match decode::<LoadedPayload>(action) {
                        Some(payload) => set_entities(state, to_entities(payload.entities)),
                        None => state,
                    }
                })
                .on(self.keys.fail.clone(), move |state, action| {
                    let error = decode::<FailPayload>(action).and_then(|p| p.error);
                    state.with(fail.clone(), CallStatus::Fail { error })
                })
                .into_reducer(),
        ))
    }

    fn effects(&self, _ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        let keys = self.keys.clone();
        Ok(vec![effect_constructor(move |deps| {
            let fetcher = deps
                .collaborators
                .require::<SharedEntitiesFetcher>("loadEntities")?;
            Ok(Arc::new(LoadEntitiesEffect {
                call: keys.call.clone(),
                success: deps.actions.require_creator(&keys.success, ENTITIES)?,
                fail: deps.actions.require_creator(&keys.fail, ENTITIES)?,
                request: RequestBuilder {
                    filter: deps.selectors.get(SELECT_ENTITIES_FILTER),
                    sort: deps.selectors.get(SELECT_SORT),
                    page: deps.selectors.get(SELECT_PAGED_REQUEST),
                },
                fetcher,
            }) as Arc<dyn Effect>)
        })])
    }
}

/// Builds a [`FetchRequest`] from whichever criteria selectors the feature
/// has.
#[derive(Clone)]
struct RequestBuilder {
    filter: Option<SelectFn<Option<Value>>>,
    sort: Option<SelectFn<Option<Sort>>>,
    page: Option<SelectFn<PagedRequest>>,
}

impl RequestBuilder {
    fn build(&self, state: &FeatureState) -> FetchRequest {
        FetchRequest {
            filter: self.filter.as_ref().and_then(|f| f(state)),
            sort: self.sort.as_ref().and_then(|f| f(state)),
            page: self.page.as_ref().map(|f| f(state)),
        }
    }
}

struct LoadEntitiesEffect {
    call: String,
    success: ActionCreator,
    fail: ActionCreator,
    request: RequestBuilder,
    fetcher: SharedEntitiesFetcher,
}

#[async_trait]
impl Effect for LoadEntitiesEffect {
    fn name(&self) -> &str {
        "loadEntities"
    }

    fn accepts(&self, action: &Action) -> bool {
        action.is(&self.call)
    }

    async fn run(&self, _action: Action, state: StateReader) -> Vec<Action> {
        let request = self.request.build(&state());
        let result = self.fetcher.fetch(request.clone()).await;

        // Criteria changed while the fetch was in flight: a newer load owns
        // the result.
        if self.request.build(&state()) != request {
            debug!("Discarding stale entities response for {:?}", request);
            return Vec::new();
        }

        match result {
            Ok(response) => vec![self.success.create(json!({
                "entities": response.entities,
                "total": response.total,
            }))],
            Err(e) => {
                debug!("Entities fetch failed: {}", e);
                vec![self.fail.create(json!({ "error": e.to_value() }))]
            }
        }
    }
}
