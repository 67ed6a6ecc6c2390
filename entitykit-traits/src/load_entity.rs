//! Loading single entities by ID.
//!
//! Each ID has its own call status. Repeated requests for an ID that is
//! already being fetched are dropped, so one fetch serves them all.

use crate::entities::upsert_entities;
use crate::fetch::SharedEntityFetcher;
use crate::keys::{
    ENTITIES, ENTITY_CALLS_FIELD, IS_ENTITY_LOADING, LOAD_ENTITY, LOAD_ENTITY_ACTION,
    LOAD_ENTITY_FAIL, LOAD_ENTITY_SUCCESS, SELECT_ENTITY_CALL_STATUS,
};
use crate::payload::{decode, IdPayload};
use async_trait::async_trait;
use entitykit_compose::{
    effect_constructor, selector_with, Action, ActionCreator, ActionSet, ComposeResult,
    CompositionContext, Effect, EffectConstructor, FeatureState, FeatureTrait, Reducer,
    ReducerFragment, SchedulePolicy, SelectWithFn, SelectorSet, StateReader,
};
use entitykit_types::{CallStatus, Entity, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

type Calls = BTreeMap<EntityId, CallStatus>;

/// Payload of `loadEntitySuccess`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadedEntityPayload {
    /// The requested ID, when it differs from the one the record carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub entity: Value,
}

/// Payload of `loadEntityFail`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityFailPayload {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

fn calls(state: &FeatureState) -> Calls {
    state.get_or_default::<Calls>(ENTITY_CALLS_FIELD)
}

fn set_call(state: FeatureState, id: EntityId, status: CallStatus) -> FeatureState {
    state.update::<Calls, _>(ENTITY_CALLS_FIELD, |calls| {
        calls.insert(id, status);
    })
}

/// The single-entity load trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadEntityTrait;

impl LoadEntityTrait {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureTrait for LoadEntityTrait {
    fn key(&self) -> &str {
        LOAD_ENTITY
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(LOAD_ENTITY_ACTION)
            .action(LOAD_ENTITY_SUCCESS)
            .action(LOAD_ENTITY_FAIL))
    }

    fn selectors(&self, _ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let status: SelectWithFn<EntityId, CallStatus> =
            selector_with(|s: &FeatureState, id: EntityId| {
                calls(s).remove(&id).unwrap_or_default()
            });
        let loading: SelectWithFn<EntityId, bool> =
            selector_with(|s: &FeatureState, id: EntityId| {
                s.get::<Calls>(ENTITY_CALLS_FIELD)
                    .and_then(|calls| calls.get(&id))
                    .is_some_and(CallStatus::is_loading)
            });
        Ok(SelectorSet::new()
            .with(SELECT_ENTITY_CALL_STATUS, status)
            .with(IS_ENTITY_LOADING, loading))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(ENTITY_CALLS_FIELD, Calls::new()))
    }

    fn reducer(&self, _ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        Ok(Some(
            ReducerFragment::new()
                .on(LOAD_ENTITY_ACTION, |state, action| {
                    match decode::<IdPayload>(action).and_then(|p| p.id()) {
                        Some(id) => set_call(state, id, CallStatus::Loading),
                        None => state,
                    }
                })
                .on(LOAD_ENTITY_SUCCESS, |state, action| {
                    let Some(payload) = decode::<LoadedEntityPayload>(action) else {
                        return state;
                    };
                    let entity = match Entity::from_value(payload.entity) {
                        Ok(entity) => entity,
                        Err(e) => {
                            warn!("Ignoring loaded entity: {}", e);
                            return state;
                        }
                    };
                    let id = payload
                        .id
                        .as_ref()
                        .and_then(EntityId::from_value)
                        .unwrap_or_else(|| entity.id().clone());
                    // A fetched record is not a local change, so it bypasses
                    // any tracking layered over the entity mutators.
                    let state = upsert_entities(state, vec![entity]);
                    set_call(state, id, CallStatus::Success)
                })
                .on(LOAD_ENTITY_FAIL, |state, action| {
                    let Some(payload) = decode::<EntityFailPayload>(action) else {
                        return state;
                    };
                    match EntityId::from_value(&payload.id) {
                        Some(id) => set_call(state, id, CallStatus::Fail {
                            error: payload.error,
                        }),
                        None => state,
                    }
                })
                .into_reducer(),
        ))
    }

    fn effects(&self, _ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        Ok(vec![effect_constructor(|deps| {
            Ok(Arc::new(LoadEntityEffect {
                fetcher: deps
                    .collaborators
                    .require::<SharedEntityFetcher>(LOAD_ENTITY_ACTION)?,
                success: deps.actions.require_creator(LOAD_ENTITY_SUCCESS, LOAD_ENTITY)?,
                fail: deps.actions.require_creator(LOAD_ENTITY_FAIL, LOAD_ENTITY)?,
            }) as Arc<dyn Effect>)
        })])
    }
}

struct LoadEntityEffect {
    fetcher: SharedEntityFetcher,
    success: ActionCreator,
    fail: ActionCreator,
}

#[async_trait]
impl Effect for LoadEntityEffect {
    fn name(&self) -> &str {
        LOAD_ENTITY_ACTION
    }

    fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::DropIfBusy
    }

    fn accepts(&self, action: &Action) -> bool {
        action.is(LOAD_ENTITY_ACTION)
    }

    fn flight_key(&self, action: &Action) -> Option<String> {
        decode::<IdPayload>(action)
            .and_then(|p| p.id())
            .map(|id| id.to_string())
    }

    async fn run(&self, action: Action, _state: StateReader) -> Vec<Action> {
        let Some(id) = decode::<IdPayload>(&action).and_then(|p| p.id()) else {
            return Vec::new();
        };
        match self.fetcher.fetch_one(id.clone()).await {
            Ok(entity) => vec![self.success.create(json!({
                "id": id,
                "entity": entity,
            }))],
            Err(e) => {
                debug!("Fetch of entity {} failed: {}", id, e);
                vec![self.fail.create(json!({ "id": id, "error": e.to_value() }))]
            }
        }
    }
}
