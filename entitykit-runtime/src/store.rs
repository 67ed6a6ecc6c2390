//! The feature store.
//!
//! A store owns the state of one composed feature. Dispatching an action
//! reduces it synchronously, publishes the next state, then hands the action
//! to every effect unit that accepts it. Each unit runs on its own worker
//! task (see [`scheduler`](crate::scheduler)) and dispatches its follow-up
//! actions back into the same store.

use crate::error::{StoreError, StoreResult};
use crate::scheduler;
use entitykit_compose::{
    Action, Collaborators, Effect, Feature, FeatureState, SelectFn, SelectWithFn, StateReader,
};
use serde_json::Value;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

struct Route {
    effect: Arc<dyn Effect>,
    tx: mpsc::UnboundedSender<Action>,
}

/// State shared between the store handle and its effect workers.
pub(crate) struct StoreCore {
    feature: Feature,
    state: watch::Sender<FeatureState>,
    routes: Vec<Route>,
    /// Actions handed to effect units and not yet finished with.
    pending: AtomicUsize,
    idle: Notify,
}

type Receivers = Vec<(Arc<dyn Effect>, mpsc::UnboundedReceiver<Action>)>;

impl StoreCore {
    /// A core routing to `effects`, plus the receiving end of each route.
    fn new(feature: Feature, effects: Vec<Arc<dyn Effect>>) -> (Arc<Self>, Receivers) {
        let (state, _) = watch::channel(feature.initial_state());
        let mut routes = Vec::with_capacity(effects.len());
        let mut receivers = Vec::with_capacity(effects.len());
        for effect in effects {
            let (tx, rx) = mpsc::unbounded_channel();
            receivers.push((Arc::clone(&effect), rx));
            routes.push(Route { effect, tx });
        }
        let core = Arc::new(Self {
            feature,
            state,
            routes,
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        });
        (core, receivers)
    }

    pub(crate) fn state(&self) -> FeatureState {
        self.state.borrow().clone()
    }

    pub(crate) fn dispatch(&self, action: Action) -> StoreResult<()> {
        let feature = &self.feature;
        let changed = self.state.send_if_modified(|state| {
            let next = feature.reduce(state.clone(), &action);
            let changed = !next.ptr_eq(state);
            *state = next;
            changed
        });
        debug!("Dispatched {} (state changed: {})", action.kind, changed);

        let mut closed = None;
        for route in self.routes.iter().filter(|r| r.effect.accepts(&action)) {
            self.pending.fetch_add(1, Ordering::AcqRel);
            if route.tx.send(action.clone()).is_err() {
                self.finish();
                closed.get_or_insert_with(|| route.effect.name().to_string());
            }
        }
        match closed {
            Some(name) => Err(StoreError::EffectClosed(name)),
            None => Ok(()),
        }
    }

    /// Marks one handed-off action as done, whether it ran or was dropped.
    pub(crate) fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// A reader that does not keep the store alive.
    pub(crate) fn reader(self: &Arc<Self>) -> StateReader {
        let core = Arc::downgrade(self);
        Arc::new(move || core.upgrade().map(|c| c.state()).unwrap_or_default())
    }

    /// Runs `effect` on `action` and dispatches what it answers with.
    pub(crate) async fn run(self: &Arc<Self>, effect: &Arc<dyn Effect>, action: Action) {
        let kind = action.kind.clone();
        let follow_ups = effect.run(action, self.reader()).await;
        debug!(
            "Effect {} handled {} with {} follow-up action(s)",
            effect.name(),
            kind,
            follow_ups.len()
        );
        for next in follow_ups {
            if let Err(e) = self.dispatch(next) {
                debug!("Follow-up of effect {} not delivered: {}", effect.name(), e);
            }
        }
    }
}

/// Runs one composed feature.
///
/// Must be created inside a tokio runtime. Dropping the store stops every
/// effect worker, including runs still in flight.
pub struct FeatureStore {
    core: Arc<StoreCore>,
    workers: Vec<JoinHandle<()>>,
}

impl FeatureStore {
    /// Builds the feature's effect units with `collaborators` and starts a
    /// worker for each.
    pub fn new(feature: Feature, collaborators: &Collaborators) -> StoreResult<Self> {
        let effects = feature.build_effects(collaborators)?;
        let (core, receivers) = StoreCore::new(feature, effects);
        let workers = receivers
            .into_iter()
            .map(|(effect, rx)| {
                debug!("Starting effect {} ({:?})", effect.name(), effect.policy());
                scheduler::spawn_unit(Arc::clone(&core), effect, rx)
            })
            .collect();

        Ok(Self { core, workers })
    }

    pub fn feature(&self) -> &Feature {
        &self.core.feature
    }

    /// The current state.
    pub fn state(&self) -> FeatureState {
        self.core.state()
    }

    /// Watches state transitions. The receiver sees a change only when an
    /// action actually produced a new state.
    pub fn subscribe(&self) -> watch::Receiver<FeatureState> {
        self.core.state.subscribe()
    }

    /// Reduces `action` and routes it to the effect units that accept it.
    pub fn dispatch(&self, action: Action) -> StoreResult<()> {
        self.core.dispatch(action)
    }

    /// Builds the named action and dispatches it.
    pub fn dispatch_named(&self, name: &str, payload: Value) -> StoreResult<()> {
        let action = self
            .core
            .feature
            .action(name, payload)
            .ok_or_else(|| StoreError::UnknownAction(name.to_string()))?;
        self.dispatch(action)
    }

    /// Evaluates a plain selector against the current state.
    pub fn select<T: Any + Clone>(&self, name: &str) -> StoreResult<T> {
        let select = self
            .core
            .feature
            .selector::<SelectFn<T>>(name)
            .ok_or_else(|| StoreError::UnknownSelector {
                name: name.to_string(),
                expected: type_name::<T>(),
            })?;
        Ok(select(&self.state()))
    }

    /// Evaluates a parameterized selector against the current state.
    pub fn select_with<A: Any, T: Any + Clone>(&self, name: &str, arg: A) -> StoreResult<T> {
        let select = self
            .core
            .feature
            .selector::<SelectWithFn<A, T>>(name)
            .ok_or_else(|| StoreError::UnknownSelector {
                name: name.to_string(),
                expected: type_name::<T>(),
            })?;
        Ok(select(&self.state(), arg))
    }

    /// True when no effect unit holds an unfinished action.
    pub fn is_idle(&self) -> bool {
        self.core.pending.load(Ordering::Acquire) == 0
    }

    /// Waits until every dispatched action, and everything it set off, has
    /// been handled or dropped by its effect unit.
    pub async fn settled(&self) {
        loop {
            let idle = self.core.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.is_idle() {
                return;
            }
            idle.await;
        }
    }
}

impl Drop for FeatureStore {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

impl fmt::Debug for FeatureStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureStore")
            .field("traits", &self.core.feature.trait_keys())
            .field("effects", &self.core.routes.len())
            .field("pending", &self.core.pending.load(Ordering::Relaxed))
            .finish()
    }
}
