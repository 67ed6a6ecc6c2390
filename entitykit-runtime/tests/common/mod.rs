//! Shared fixtures for the store tests.

#![allow(dead_code)]

use async_trait::async_trait;
use entitykit_compose::{
    compose, effect_constructor, Action, ActionSet, Collaborators, Effect, Feature, FeatureState,
    ReducerFragment, SchedulePolicy, StateReader, TraitDescriptor,
};
use entitykit_traits::fetch::{
    EntitiesFetcher, EntityFetcher, FetchError, FetchRequest, FetchResponse,
    SharedEntitiesFetcher, SharedEntityFetcher,
};
use entitykit_types::{Entity, EntityId};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PING: &str = "ping";
pub const DONE: &str = "done";
pub const SEEN: &str = "seen";

/// Effect that sleeps for `payload.ms`, then answers `done` with the same
/// payload. `payload.key` is its flight key; `payload.now` skips the quiet
/// period.
pub struct Probe {
    policy: SchedulePolicy,
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Effect for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    fn accepts(&self, action: &Action) -> bool {
        action.is(PING)
    }

    fn flight_key(&self, action: &Action) -> Option<String> {
        action.payload["key"].as_str().map(String::from)
    }

    fn bypasses_debounce(&self, action: &Action) -> bool {
        action.payload["now"].as_bool().unwrap_or(false)
    }

    async fn run(&self, action: Action, _state: StateReader) -> Vec<Action> {
        let ms = action.payload["ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.runs.fetch_add(1, Ordering::SeqCst);
        vec![Action::with_payload(DONE, action.payload)]
    }
}

/// A feature whose only trait records every `done` payload in `seen`.
pub fn probe_feature(policy: SchedulePolicy, runs: Arc<AtomicUsize>) -> Feature {
    let probe = TraitDescriptor::new("probe")
        .with_actions(|_| Ok(ActionSet::new().action(PING).action(DONE)))
        .with_initial_state(|_| Ok(FeatureState::new().with(SEEN, Vec::<Value>::new())))
        .with_reducer(|_| {
            Ok(ReducerFragment::new()
                .on(DONE, |state: FeatureState, action: &Action| {
                    state.update::<Vec<Value>, _>(SEEN, |seen| seen.push(action.payload.clone()))
                })
                .into_reducer())
        })
        .with_effects(move |_| {
            let runs = Arc::clone(&runs);
            Ok(vec![effect_constructor(move |_| {
                Ok(Arc::new(Probe {
                    policy,
                    runs: Arc::clone(&runs),
                }) as Arc<dyn Effect>)
            })])
        });
    compose(vec![Box::new(probe)]).unwrap()
}

pub fn seen(state: &FeatureState) -> Vec<Value> {
    state.get_or_default::<Vec<Value>>(SEEN)
}

pub fn item(i: usize) -> Value {
    json!({ "id": i, "name": format!("item {i}"), "rank": i })
}

pub fn ids(range: std::ops::Range<usize>) -> Vec<EntityId> {
    range.map(|i| EntityId::from(i as u64)).collect()
}

pub fn entity_ids(entities: &[Entity]) -> Vec<EntityId> {
    entities.iter().map(|e| e.id().clone()).collect()
}

/// In-memory backend over `0..total` that takes `latency` per call.
pub struct FakeBackend {
    pub total: usize,
    pub latency: Duration,
    pub requests: Mutex<Vec<FetchRequest>>,
    pub single_fetches: AtomicUsize,
}

impl FakeBackend {
    pub fn new(total: usize, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            total,
            latency,
            requests: Mutex::new(Vec::new()),
            single_fetches: AtomicUsize::new(0),
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
        tokio::time::sleep(self.latency).await;
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
        self.single_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
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
