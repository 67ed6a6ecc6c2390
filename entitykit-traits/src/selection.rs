//! Single and multiple entity selection.
//!
//! Selection only ever refers to entities in the collection: removals,
//! reloads and page-cache clears drop IDs that are gone, and a rename moves
//! the selection to the new ID.

use crate::entities::collection;
use crate::keys::{
    CLEAR_ENTITIES_SELECTION, CLEAR_PAGES_CACHE, CRUD, DESELECT_ENTITIES, DESELECT_ENTITY,
    ENTITIES, FILTER, IS_ALL_ENTITIES_SELECTED, MULTI_SELECTION, PAGINATION, REMOVE_ALL_ENTITIES,
    REMOVE_ENTITIES, SELECTED_IDS_FIELD, SELECTED_ID_FIELD, SELECT_ALL, SELECT_ENTITIES,
    SELECT_ENTITIES_SELECTED_LIST, SELECT_ENTITY, SELECT_ENTITY_ID_SELECTED,
    SELECT_ENTITY_SELECTED, SELECT_IDS_SELECTED, SELECT_TOTAL_SELECTED, SINGLE_SELECTION, SORT,
    TOGGLE_SELECT_ALL_ENTITIES, TOGGLE_SELECT_ENTITIES, TOGGLE_SELECT_ENTITY, UPDATE_ENTITIES,
};
use crate::payload::{decode, IdPayload, IdsPayload, UpdatesPayload};
use entitykit_compose::{
    derive_keys, selector, ActionSet, ComposeResult, CompositionContext, FeatureState,
    FeatureTrait, Reducer, ReducerFragment, SelectFn, SelectorSet,
};
use entitykit_types::{Entity, EntityId, EntityUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which selection trait a feature carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single,
    Multi,
}

/// How much of the visible list is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStatus {
    All,
    #[serde(rename = "some")]
    Partial,
    None,
}

/// Action kinds after which a selected ID may no longer exist.
fn pruning_kinds() -> Vec<String> {
    vec![
        REMOVE_ENTITIES.into(),
        REMOVE_ALL_ENTITIES.into(),
        CLEAR_PAGES_CACHE.into(),
        derive_keys(ENTITIES).success,
    ]
}

/// Where each renamed ID went, for the updates the collection accepted.
fn renames(state: &FeatureState, updates: Vec<EntityUpdate>) -> Vec<(EntityId, EntityId)> {
    let entities = collection(state);
    updates
        .into_iter()
        .filter_map(|u| {
            let to = u.renamed_to()?;
            (entities.contains(&to) && !entities.contains(&u.id)).then_some((u.id, to))
        })
        .collect()
}

fn selected_id(state: &FeatureState) -> Option<EntityId> {
    state.get_or_default::<Option<EntityId>>(SELECTED_ID_FIELD)
}

fn selected_ids(state: &FeatureState) -> Vec<EntityId> {
    state.get_or_default::<Vec<EntityId>>(SELECTED_IDS_FIELD)
}

/// Single-entity selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSelectionTrait;

impl SingleSelectionTrait {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureTrait for SingleSelectionTrait {
    fn key(&self) -> &str {
        SINGLE_SELECTION
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn runs_after(&self) -> Vec<String> {
        vec![PAGINATION.into(), CRUD.into()]
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(SELECT_ENTITY)
            .action(DESELECT_ENTITY)
            .action(TOGGLE_SELECT_ENTITY))
    }

    fn selectors(&self, _ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let select_entity: SelectFn<Option<Entity>> = selector(|s: &FeatureState| {
            selected_id(s).and_then(|id| collection(s).get(&id).cloned())
        });
        let select_id: SelectFn<Option<EntityId>> = selector(selected_id);
        Ok(SelectorSet::new()
            .with(SELECT_ENTITY_ID_SELECTED, select_id)
            .with(SELECT_ENTITY_SELECTED, select_entity))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(SELECTED_ID_FIELD, None::<EntityId>))
    }

    fn reducer(&self, _ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let mut fragment = ReducerFragment::new()
            .on(SELECT_ENTITY, |state, action| {
                let Some(id) = decode::<IdPayload>(action).and_then(|p| p.id()) else {
                    return state;
                };
                if !collection(&state).contains(&id) {
                    return state;
                }
                state.with(SELECTED_ID_FIELD, Some(id))
            })
            .on(DESELECT_ENTITY, |state, _| {
                state.with(SELECTED_ID_FIELD, None::<EntityId>)
            })
            .on(TOGGLE_SELECT_ENTITY, |state, action| {
                let Some(id) = decode::<IdPayload>(action).and_then(|p| p.id()) else {
                    return state;
                };
                let next = if selected_id(&state).as_ref() == Some(&id) {
                    None
                } else if collection(&state).contains(&id) {
                    Some(id)
                } else {
                    return state;
                };
                state.with(SELECTED_ID_FIELD, next)
            })
            .on(UPDATE_ENTITIES, |state, action| {
                let Some(current) = selected_id(&state) else {
                    return state;
                };
                let Some(payload) = decode::<UpdatesPayload>(action) else {
                    return state;
                };
                match renames(&state, payload.updates())
                    .into_iter()
                    .find(|(from, _)| *from == current)
                {
                    Some((_, to)) => state.with(SELECTED_ID_FIELD, Some(to)),
                    None => state,
                }
            });
        for kind in pruning_kinds() {
            fragment = fragment.on(kind, |state, _| match selected_id(&state) {
                Some(id) if !collection(&state).contains(&id) => {
                    state.with(SELECTED_ID_FIELD, None::<EntityId>)
                }
                _ => state,
            });
        }
        Ok(Some(fragment.into_reducer()))
    }
}

/// Multiple-entity selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSelectionTrait;

impl MultiSelectionTrait {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureTrait for MultiSelectionTrait {
    fn key(&self) -> &str {
        MULTI_SELECTION
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    // Select-all works on the visible list, so filtering and sorting must
    // have re-derived `selectAll` first.
    fn runs_after(&self) -> Vec<String> {
        vec![FILTER.into(), SORT.into(), PAGINATION.into(), CRUD.into()]
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(SELECT_ENTITIES)
            .action(DESELECT_ENTITIES)
            .action(TOGGLE_SELECT_ENTITIES)
            .action(TOGGLE_SELECT_ALL_ENTITIES)
            .action(CLEAR_ENTITIES_SELECTION))
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let visible = ctx
            .all_selectors()
            .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, MULTI_SELECTION)?;
        let list: SelectFn<Vec<Entity>> = selector(|s: &FeatureState| {
            let entities = collection(s);
            selected_ids(s)
                .iter()
                .filter_map(|id| entities.get(id).cloned())
                .collect()
        });
        let status: SelectFn<SelectionStatus> = selector(move |s: &FeatureState| {
            let selected: HashSet<EntityId> = selected_ids(s).into_iter().collect();
            let visible = visible(s);
            let hits = visible.iter().filter(|e| selected.contains(e.id())).count();
            if hits == 0 {
                SelectionStatus::None
            } else if hits == visible.len() {
                SelectionStatus::All
            } else {
                SelectionStatus::Partial
            }
        });
        let ids: SelectFn<Vec<EntityId>> = selector(selected_ids);
        Ok(SelectorSet::new()
            .with(SELECT_IDS_SELECTED, ids)
            .with(SELECT_ENTITIES_SELECTED_LIST, list)
            .with(
                SELECT_TOTAL_SELECTED,
                selector(|s: &FeatureState| selected_ids(s).len()),
            )
            .with(IS_ALL_ENTITIES_SELECTED, status))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(SELECTED_IDS_FIELD, Vec::<EntityId>::new()))
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let visible = ctx
            .all_selectors()
            .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, MULTI_SELECTION)?;

        let mut fragment = ReducerFragment::new()
            .on(SELECT_ENTITIES, |state, action| {
                let Some(ids) = decode::<IdsPayload>(action).map(IdsPayload::ids) else {
                    return state;
                };
                let entities = collection(&state);
                let mut selected = selected_ids(&state);
                for id in ids {
                    if entities.contains(&id) && !selected.contains(&id) {
                        selected.push(id);
                    }
                }
                state.with(SELECTED_IDS_FIELD, selected)
            })
            .on(DESELECT_ENTITIES, |state, action| {
                let Some(ids) = decode::<IdsPayload>(action).map(IdsPayload::ids) else {
                    return state;
                };
                let mut selected = selected_ids(&state);
                selected.retain(|id| !ids.contains(id));
                state.with(SELECTED_IDS_FIELD, selected)
            })
            .on(TOGGLE_SELECT_ENTITIES, |state, action| {
                let Some(ids) = decode::<IdsPayload>(action).map(IdsPayload::ids) else {
                    return state;
                };
                let entities = collection(&state);
                let mut selected = selected_ids(&state);
                for id in ids {
                    if let Some(pos) = selected.iter().position(|s| *s == id) {
                        selected.remove(pos);
                    } else if entities.contains(&id) {
                        selected.push(id);
                    }
                }
                state.with(SELECTED_IDS_FIELD, selected)
            })
            .on(TOGGLE_SELECT_ALL_ENTITIES, move |state, _| {
                let shown: Vec<EntityId> = visible(&state).iter().map(|e| e.id().clone()).collect();
                let mut selected = selected_ids(&state);
                if !shown.is_empty() && shown.iter().all(|id| selected.contains(id)) {
                    selected.retain(|id| !shown.contains(id));
                } else {
                    for id in shown {
                        if !selected.contains(&id) {
                            selected.push(id);
                        }
                    }
                }
                state.with(SELECTED_IDS_FIELD, selected)
            })
            .on(CLEAR_ENTITIES_SELECTION, |state, _| {
                state.with(SELECTED_IDS_FIELD, Vec::<EntityId>::new())
            })
            .on(UPDATE_ENTITIES, |state, action| {
                let Some(payload) = decode::<UpdatesPayload>(action) else {
                    return state;
                };
                let moved = renames(&state, payload.updates());
                if moved.is_empty() {
                    return state;
                }
                let selected: Vec<EntityId> = selected_ids(&state)
                    .into_iter()
                    .map(|id| {
                        moved
                            .iter()
                            .find(|(from, _)| *from == id)
                            .map_or(id, |(_, to)| to.clone())
                    })
                    .collect();
                state.with(SELECTED_IDS_FIELD, selected)
            });
        for kind in pruning_kinds() {
            fragment = fragment.on(kind, |state, _| {
                let entities = collection(&state);
                let mut selected = selected_ids(&state);
                let before = selected.len();
                selected.retain(|id| entities.contains(id));
                if selected.len() == before {
                    state
                } else {
                    state.with(SELECTED_IDS_FIELD, selected)
                }
            });
        }
        Ok(Some(fragment.into_reducer()))
    }
}
