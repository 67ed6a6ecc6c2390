//! Effect workers, one per unit, each applying the unit's
//! [`SchedulePolicy`].
//!
//! Runs are spawned into a [`JoinSet`] owned by the worker, so aborting the
//! worker cancels its in-flight runs too. Every action a worker receives is
//! finished exactly once: after its run completes (or panics), or when the
//! policy drops it.

use crate::store::StoreCore;
use entitykit_compose::{Action, Effect, SchedulePolicy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tracing::{debug, warn};

/// Spawns the worker for `effect`.
pub(crate) fn spawn_unit(
    core: Arc<StoreCore>,
    effect: Arc<dyn Effect>,
    rx: UnboundedReceiver<Action>,
) -> JoinHandle<()> {
    let unit = Unit { core, effect };
    match unit.effect.policy() {
        SchedulePolicy::CoalesceLatest { quiet } => tokio::spawn(unit.coalesce_latest(rx, quiet)),
        SchedulePolicy::SerializeFifo => tokio::spawn(unit.serialize_fifo(rx)),
        SchedulePolicy::DropIfBusy => tokio::spawn(unit.drop_if_busy(rx)),
        SchedulePolicy::Concurrent => tokio::spawn(unit.concurrent(rx)),
    }
}

struct Unit {
    core: Arc<StoreCore>,
    effect: Arc<dyn Effect>,
}

impl Unit {
    fn start(&self, runs: &mut JoinSet<()>, action: Action) -> task::Id {
        let core = Arc::clone(&self.core);
        let effect = Arc::clone(&self.effect);
        runs.spawn(async move { core.run(&effect, action).await }).id()
    }

    fn complete(&self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            warn!("Effect {} run did not complete: {}", self.effect.name(), e);
        }
        self.core.finish();
    }

    fn drop_action(&self, action: &Action, reason: &str) {
        debug!("Effect {} dropped {}: {}", self.effect.name(), action.kind, reason);
        self.core.finish();
    }

    /// Runs one action and waits for it.
    async fn run_one(&self, action: Action) {
        let mut runs = JoinSet::new();
        self.start(&mut runs, action);
        if let Some(result) = runs.join_next().await {
            self.complete(result);
        }
    }

    async fn drain(&self, runs: &mut JoinSet<()>) {
        while let Some(result) = runs.join_next().await {
            self.complete(result);
        }
    }

    async fn serialize_fifo(self, mut rx: UnboundedReceiver<Action>) {
        while let Some(action) = rx.recv().await {
            self.run_one(action).await;
        }
    }

    async fn concurrent(self, mut rx: UnboundedReceiver<Action>) {
        let mut runs = JoinSet::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(action) => {
                        self.start(&mut runs, action);
                    }
                    None => break,
                },
                Some(result) = runs.join_next() => self.complete(result),
            }
        }
        self.drain(&mut runs).await;
    }

    /// Single-flight per key: an action whose key already has a run in
    /// flight is dropped.
    async fn drop_if_busy(self, mut rx: UnboundedReceiver<Action>) {
        let mut runs = JoinSet::new();
        let mut in_flight: HashMap<task::Id, Option<String>> = HashMap::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(action) => {
                        let key = self.effect.flight_key(&action);
                        if in_flight.values().any(|busy| *busy == key) {
                            self.drop_action(&action, "a run with the same key is in flight");
                        } else {
                            let id = self.start(&mut runs, action);
                            in_flight.insert(id, key);
                        }
                    }
                    None => break,
                },
                Some(result) = runs.join_next_with_id() => {
                    let id = match &result {
                        Ok((id, ())) => *id,
                        Err(e) => e.id(),
                    };
                    in_flight.remove(&id);
                    self.complete(result.map(|_| ()));
                }
            }
        }
        self.drain(&mut runs).await;
    }

    /// Debounce: an action waits for `quiet` without a newer one, then runs.
    /// A newer action supersedes the waiting one. Actions that bypass the
    /// quiet period run at once and supersede the waiting one as well.
    async fn coalesce_latest(self, mut rx: UnboundedReceiver<Action>, quiet: Duration) {
        let mut waiting: Option<Action> = None;
        loop {
            let received = match waiting.take() {
                None => rx.recv().await,
                Some(latest) => tokio::select! {
                    received = rx.recv() => match received {
                        Some(action) => {
                            self.drop_action(&latest, "superseded");
                            Some(action)
                        }
                        None => {
                            self.run_one(latest).await;
                            None
                        }
                    },
                    () = tokio::time::sleep(quiet) => {
                        self.run_one(latest).await;
                        continue;
                    }
                },
            };
            let Some(action) = received else {
                break;
            };
            if self.effect.bypasses_debounce(&action) {
                self.run_one(action).await;
            } else {
                waiting = Some(action);
            }
        }
    }
}
