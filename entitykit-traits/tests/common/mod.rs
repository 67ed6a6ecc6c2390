//! Shared fixtures for the trait tests.

#![allow(dead_code)]

use async_trait::async_trait;
use entitykit_compose::{Action, Collaborators, Effect, Feature, FeatureState, SelectFn, SelectWithFn, StateReader};
use entitykit_traits::fetch::{
    EntitiesFetcher, EntityFetcher, FetchError, FetchRequest, FetchResponse,
    SharedEntitiesFetcher, SharedEntityFetcher,
};
use entitykit_types::{Entity, EntityId};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::{Arc, Mutex};

pub fn item(i: usize) -> Value {
    json!({ "id": i, "name": format!("item {i}"), "rank": i })
}

pub fn items(range: std::ops::Range<usize>) -> Vec<Value> {
    range.map(item).collect()
}

pub fn ids(range: std::ops::Range<usize>) -> Vec<EntityId> {
    range.map(|i| EntityId::from(i as u64)).collect()
}

pub fn entity_ids(entities: &[Entity]) -> Vec<EntityId> {
    entities.iter().map(|e| e.id().clone()).collect()
}

/// Dispatches `name` through the feature's reducer.
pub fn dispatch(feature: &Feature, state: FeatureState, name: &str, payload: Value) -> FeatureState {
    let action = feature
        .action(name, payload)
        .unwrap_or_else(|| panic!("feature has no action '{name}'"));
    feature.reduce(state, &action)
}

/// Reduces a `loadEntitiesSuccess` carrying `range`.
pub fn load(
    feature: &Feature,
    state: FeatureState,
    range: std::ops::Range<usize>,
    total: Option<usize>,
) -> FeatureState {
    dispatch(
        feature,
        state,
        "loadEntitiesSuccess",
        json!({ "entities": items(range), "total": total }),
    )
}

pub fn select<T: Any + Clone>(feature: &Feature, state: &FeatureState, name: &str) -> T {
    let select = feature
        .selector::<SelectFn<T>>(name)
        .unwrap_or_else(|| panic!("feature has no selector '{name}'"));
    select(state)
}

pub fn select_with<A: Any, T: Any + Clone>(
    feature: &Feature,
    state: &FeatureState,
    name: &str,
    arg: A,
) -> T {
    let select = feature
        .selector::<SelectWithFn<A, T>>(name)
        .unwrap_or_else(|| panic!("feature has no selector '{name}'"));
    select(state, arg)
}

pub fn reader(state: FeatureState) -> StateReader {
    Arc::new(move || state.clone())
}

/// Builds the feature's effects with the given collaborators and returns the
/// one called `name`.
pub fn effect(feature: &Feature, collaborators: &Collaborators, name: &str) -> Arc<dyn Effect> {
    feature
        .build_effects(collaborators)
        .unwrap()
        .into_iter()
        .find(|e| e.name() == name)
        .unwrap_or_else(|| panic!("feature has no effect '{name}'"))
}

pub fn kinds(actions: &[Action]) -> Vec<&str> {
    actions.iter().map(|a| a.kind.as_str()).collect()
}

/// In-memory backend over `0..total`, honoring the paged request.
pub struct FakeBackend {
    pub total: usize,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl FakeBackend {
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitiesFetcher for FakeBackend {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let (start, end) = match request.page {
            Some(page) => {
                let end = page.size.map_or(self.total, |size| page.start_index + size);
                (page.start_index.min(self.total), end.min(self.total))
            }
            None => (0, self.total),
        };
        let entities = (start..end)
            .map(|i| Entity::from_value(item(i)).unwrap())
            .collect();
        Ok(FetchResponse::new(entities).with_total(self.total))
    }
}

#[async_trait]
impl EntityFetcher for FakeBackend {
    async fn fetch_one(&self, id: EntityId) -> Result<Entity, FetchError> {
        let index: usize = id
            .as_str()
            .parse()
            .map_err(|_| FetchError::NotFound(id.clone()))?;
        if index >= self.total {
            return Err(FetchError::NotFound(id));
        }
        Ok(Entity::from_value(item(index)).unwrap())
    }
}

pub fn collaborators(backend: &Arc<FakeBackend>) -> Collaborators {
    let entities: SharedEntitiesFetcher = backend.clone();
    let entity: SharedEntityFetcher = backend.clone();
    Collaborators::new().with(entities).with(entity)
}
