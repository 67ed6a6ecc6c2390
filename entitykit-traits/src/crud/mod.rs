//! CRUD tracking: local create/update/delete with a change log.
//!
//! The trait re-derives the collection mutators of the entities trait so
//! that every mutation, whether dispatched as an action or called directly,
//! also appends to the log. Reads of the log come raw or compacted.

mod compact;

pub use compact::{compact, retarget};

use crate::entities::collection;
use crate::keys::{
    ADD_ENTITIES, CHANGES_FIELD, CLEAR_ENTITIES_CHANGES, CRUD, ENTITIES, PAGINATION,
    PAGINATION_FIELD, REMOVE_ALL_ENTITIES, REMOVE_ENTITIES, SELECT_ALL_CHANGES, SELECT_CHANGES,
    SELECT_FILTERED_CHANGES, UPDATE_ENTITIES, UPSERT_ENTITIES,
};
use crate::pagination::{CacheType, PaginationConfig, PaginationState};
use crate::payload::{decode, EntitiesPayload, IdsPayload, UpdatesPayload};
use entitykit_compose::{
    derive_keys, mutator, selector, selector_with, ActionSet, ComposeResult, CompositionContext,
    Erased, FeatureState, FeatureTrait, MutateFn, MutatorSet, Reducer, ReducerFragment, SelectFn,
    SelectWithFn, SelectorSet,
};
use entitykit_types::{Change, ChangeType, Entity, EntityId, EntityUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudConfig {
    /// Keep the affected data in each log entry.
    #[serde(default)]
    pub store_changes: bool,
}

/// A log entry joined with its entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChange {
    /// The live entity, or an `{ id }` stub once it has been removed.
    pub entity: Entity,
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_changes: Option<Value>,
}

fn changes(state: &FeatureState) -> Vec<Change> {
    state.get_or_default::<Vec<Change>>(CHANGES_FIELD)
}

/// Joins log entries with the live entities, keeping those of type
/// `filter` when given.
fn join(state: &FeatureState, log: Vec<Change>, filter: Option<ChangeType>) -> Vec<EntityChange> {
    let entities = collection(state);
    log.into_iter()
        .filter(|change| filter.is_none_or(|t| t == change.change_type))
        .map(|change| EntityChange {
            entity: entities
                .get(&change.id)
                .cloned()
                .unwrap_or_else(|| Entity::stub(change.id.clone())),
            change_type: change.change_type,
            entity_changes: change.entity_changes,
        })
        .collect()
}

/// The entities mutators wrapped with logging.
#[derive(Clone)]
struct Tracker {
    store_changes: bool,
    add: MutateFn<Vec<Entity>>,
    upsert: MutateFn<Vec<Entity>>,
    update: MutateFn<Vec<EntityUpdate>>,
    remove: MutateFn<Vec<EntityId>>,
    remove_all: MutateFn<()>,
}

impl Tracker {
    fn from_context(ctx: &CompositionContext, store_changes: bool) -> ComposeResult<Self> {
        let mutators = ctx.all_mutators();
        Ok(Self {
            store_changes,
            add: mutators.require(ADD_ENTITIES, CRUD)?,
            upsert: mutators.require(UPSERT_ENTITIES, CRUD)?,
            update: mutators.require(UPDATE_ENTITIES, CRUD)?,
            remove: mutators.require(REMOVE_ENTITIES, CRUD)?,
            remove_all: mutators.require(REMOVE_ALL_ENTITIES, CRUD)?,
        })
    }

    fn entry(&self, change: Change, data: impl FnOnce() -> Value) -> Change {
        if self.store_changes {
            change.with_entity_changes(data())
        } else {
            change
        }
    }

    fn append(state: FeatureState, entries: Vec<Change>) -> FeatureState {
        if entries.is_empty() {
            return state;
        }
        let mut log = changes(&state);
        log.extend(entries);
        state.with(CHANGES_FIELD, log)
    }

    fn add(&self, state: FeatureState, entities: Vec<Entity>) -> FeatureState {
        let before = collection(&state);
        let mut seen = HashSet::new();
        let entries = entities
            .iter()
            .filter(|e| !before.contains(e.id()) && seen.insert(e.id().clone()))
            .map(|e| self.entry(Change::created(e.id().clone()), || e.to_value()))
            .collect();
        Self::append((self.add)(state, entities), entries)
    }

    fn upsert(&self, state: FeatureState, entities: Vec<Entity>) -> FeatureState {
        let before = collection(&state);
        let entries = entities
            .iter()
            .map(|e| {
                let change = if before.contains(e.id()) {
                    Change::updated(e.id().clone())
                } else {
                    Change::created(e.id().clone())
                };
                self.entry(change, || e.to_value())
            })
            .collect();
        Self::append((self.upsert)(state, entities), entries)
    }

    fn update(&self, state: FeatureState, updates: Vec<EntityUpdate>) -> FeatureState {
        let before = collection(&state);
        let state = (self.update)(state, updates.clone());
        let after = collection(&state);

        let mut log = changes(&state);
        let mut touched = false;
        for update in updates.iter().filter(|u| before.contains(&u.id)) {
            let to = match update.renamed_to() {
                // The collection refuses a rename onto another entity's ID.
                Some(to) if after.contains(&update.id) || !after.contains(&to) => continue,
                Some(to) => {
                    retarget(&mut log, &update.id, &to);
                    to
                }
                None => update.id.clone(),
            };
            log.push(self.entry(Change::updated(to), || Value::Object(update.changes.clone())));
            touched = true;
        }
        if touched {
            state.with(CHANGES_FIELD, log)
        } else {
            state
        }
    }

    fn remove(&self, state: FeatureState, ids: Vec<EntityId>) -> FeatureState {
        let before = collection(&state);
        let mut seen = HashSet::new();
        let entries = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| before.get(id))
            .map(|e| self.entry(Change::deleted(e.id().clone()), || e.to_value()))
            .collect();
        Self::append((self.remove)(state, ids), entries)
    }

    fn remove_all(&self, state: FeatureState) -> FeatureState {
        let entries = collection(&state)
            .iter()
            .map(|e| self.entry(Change::deleted(e.id().clone()), || e.to_value()))
            .collect();
        Self::append((self.remove_all)(state, ()), entries)
    }
}

/// The CRUD tracking trait.
#[derive(Debug, Clone, Default)]
pub struct CrudTrait {
    config: CrudConfig,
}

impl CrudTrait {
    pub fn new(config: CrudConfig) -> Self {
        Self { config }
    }

    /// Tracking that keeps entity data in every log entry.
    pub fn storing_changes() -> Self {
        Self::new(CrudConfig {
            store_changes: true,
        })
    }
}

impl FeatureTrait for CrudTrait {
    fn key(&self) -> &str {
        CRUD
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn shadows(&self) -> Vec<String> {
        [
            ADD_ENTITIES,
            UPSERT_ENTITIES,
            UPDATE_ENTITIES,
            REMOVE_ENTITIES,
            REMOVE_ALL_ENTITIES,
        ]
        .map(String::from)
        .to_vec()
    }

    fn config(&self) -> Option<Erased> {
        Some(Erased::new(self.config.clone()))
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(ADD_ENTITIES)
            .action(UPDATE_ENTITIES)
            .action(UPSERT_ENTITIES)
            .action(REMOVE_ENTITIES)
            .action(REMOVE_ALL_ENTITIES)
            .action(CLEAR_ENTITIES_CHANGES))
    }

    fn selectors(&self, _ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let select_changes: SelectFn<Vec<Change>> = selector(changes);
        let select_all: SelectWithFn<Option<ChangeType>, Vec<EntityChange>> =
            selector_with(|s: &FeatureState, filter: Option<ChangeType>| {
                join(s, changes(s), filter)
            });
        let select_filtered: SelectWithFn<Option<ChangeType>, Vec<EntityChange>> =
            selector_with(|s: &FeatureState, filter: Option<ChangeType>| {
                join(s, compact(&changes(s)), filter)
            });
        Ok(SelectorSet::new()
            .with(SELECT_CHANGES, select_changes)
            .with(SELECT_ALL_CHANGES, select_all)
            .with(SELECT_FILTERED_CHANGES, select_filtered))
    }

    fn mutators(&self, ctx: &CompositionContext) -> ComposeResult<MutatorSet> {
        let tracker = Tracker::from_context(ctx, self.config.store_changes)?;
        let (add, upsert, update, remove, remove_all) = (
            tracker.clone(),
            tracker.clone(),
            tracker.clone(),
            tracker.clone(),
            tracker,
        );
        Ok(MutatorSet::new()
            .with(
                ADD_ENTITIES,
                mutator(move |s, entities: Vec<Entity>| add.add(s, entities)),
            )
            .with(
                UPSERT_ENTITIES,
                mutator(move |s, entities: Vec<Entity>| upsert.upsert(s, entities)),
            )
            .with(
                UPDATE_ENTITIES,
                mutator(move |s, updates: Vec<EntityUpdate>| update.update(s, updates)),
            )
            .with(
                REMOVE_ENTITIES,
                mutator(move |s, ids: Vec<EntityId>| remove.remove(s, ids)),
            )
            .with(
                REMOVE_ALL_ENTITIES,
                mutator(move |s, _: ()| remove_all.remove_all(s)),
            )
            .with(
                CLEAR_ENTITIES_CHANGES,
                mutator(|s: FeatureState, _: ()| s.with(CHANGES_FIELD, Vec::<Change>::new())),
            ))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(CHANGES_FIELD, Vec::<Change>::new()))
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let mutators = ctx.all_mutators();
        let add: MutateFn<Vec<Entity>> = mutators.require(ADD_ENTITIES, CRUD)?;
        let upsert: MutateFn<Vec<Entity>> = mutators.require(UPSERT_ENTITIES, CRUD)?;
        let update: MutateFn<Vec<EntityUpdate>> = mutators.require(UPDATE_ENTITIES, CRUD)?;
        let remove: MutateFn<Vec<EntityId>> = mutators.require(REMOVE_ENTITIES, CRUD)?;
        let remove_all: MutateFn<()> = mutators.require(REMOVE_ALL_ENTITIES, CRUD)?;
        let clear: MutateFn<()> = mutators.require(CLEAR_ENTITIES_CHANGES, CRUD)?;
        let clear_on_load = clear.clone();

        // Under a partial cache a preload only widens the window, so the
        // log survives it.
        let partial = ctx
            .config::<PaginationConfig>(PAGINATION)
            .is_some_and(|c| c.cache_type == CacheType::Partial);

        Ok(Some(
            ReducerFragment::new()
                .on(ADD_ENTITIES, move |s, action| match decode::<EntitiesPayload>(action) {
                    Some(payload) => add(s, payload.entities()),
                    None => s,
                })
                .on(UPSERT_ENTITIES, move |s, action| match decode::<EntitiesPayload>(action) {
                    Some(payload) => upsert(s, payload.entities()),
                    None => s,
                })
                .on(UPDATE_ENTITIES, move |s, action| match decode::<UpdatesPayload>(action) {
                    Some(payload) => update(s, payload.updates()),
                    None => s,
                })
                .on(REMOVE_ENTITIES, move |s, action| match decode::<IdsPayload>(action) {
                    Some(payload) => remove(s, payload.ids()),
                    None => s,
                })
                .on(REMOVE_ALL_ENTITIES, move |s, _| remove_all(s, ()))
                .on(CLEAR_ENTITIES_CHANGES, move |s, _| clear(s, ()))
                .on(derive_keys(ENTITIES).success, move |s, _| {
                    let preload = s
                        .get::<PaginationState>(PAGINATION_FIELD)
                        .is_some_and(PaginationState::is_preload);
                    if partial && preload {
                        s
                    } else {
                        clear_on_load(s, ())
                    }
                })
                .into_reducer(),
        ))
    }
}
