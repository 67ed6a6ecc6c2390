mod common;

use common::*;
use entitykit_compose::{compose, Feature, FeatureState, FeatureTrait};
use entitykit_traits::keys::*;
use entitykit_traits::{
    CrudTrait, EntitiesTrait, FilterConfig, FilterTrait, MultiSelectionTrait, SelectionStatus,
    SingleSelectionTrait,
};
use entitykit_types::{Entity, EntityId};
use pretty_assertions::assert_eq;
use serde_json::json;

fn feature_with(selection: Box<dyn FeatureTrait>) -> Feature {
    let traits: Vec<Box<dyn FeatureTrait>> = vec![
        selection,
        Box::new(EntitiesTrait::new()),
        Box::new(CrudTrait::default()),
        Box::new(FilterTrait::new(FilterConfig::default().with_filter_fn(
            |entity, filter| {
                let max = filter.as_f64().unwrap_or(f64::MAX);
                entity.get_number("/rank").is_some_and(|rank| rank < max)
            },
        ))),
    ];
    compose(traits).unwrap()
}

fn id(i: u64) -> EntityId {
    EntityId::from(i)
}

// ── Single selection ──────────────────────────────────────────────

#[test]
fn single_selection_orders_after_crud() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let keys = feature.trait_keys();
    let position = |key: &str| keys.iter().position(|k| k == key);
    assert!(position(CRUD) < position(SINGLE_SELECTION));
    assert!(position(SINGLE_SELECTION).is_some());
}

#[test]
fn select_and_toggle_single_entity() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);

    let state = dispatch(&feature, state, SELECT_ENTITY, json!({ "id": 2 }));
    let selected: Option<Entity> = select(&feature, &state, SELECT_ENTITY_SELECTED);
    assert_eq!(selected.map(|e| e.id().clone()), Some(id(2)));

    let state = dispatch(&feature, state, TOGGLE_SELECT_ENTITY, json!({ "id": 2 }));
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, None);
}

#[test]
fn unknown_entity_cannot_be_selected() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITY, json!({ "id": 99 }));
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, None);
}

#[test]
fn removing_selected_entity_clears_selection() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITY, json!({ "id": 3 }));
    let state = dispatch(&feature, state, REMOVE_ENTITIES, json!({ "ids": [3] }));
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, None);
}

#[test]
fn rename_moves_single_selection() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITY, json!({ "id": 1 }));
    let state = dispatch(
        &feature,
        state,
        UPDATE_ENTITIES,
        json!({ "updates": [{ "id": 1, "changes": { "id": 50 } }] }),
    );
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, Some(id(50)));
}

#[test]
fn reload_keeps_selection_that_still_exists() {
    let feature = feature_with(Box::new(SingleSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITY, json!({ "id": 1 }));

    let state = load(&feature, state, 0..3, None);
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, Some(id(1)));

    let state = load(&feature, state, 2..4, None);
    let selected: Option<EntityId> = select(&feature, &state, SELECT_ENTITY_ID_SELECTED);
    assert_eq!(selected, None);
}

// ── Multi selection ───────────────────────────────────────────────

#[test]
fn select_deselect_and_toggle_many() {
    let feature = feature_with(Box::new(MultiSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);

    let state = dispatch(&feature, state, SELECT_ENTITIES, json!({ "ids": [0, 1, 2, 1, 42] }));
    assert_eq!(select::<Vec<EntityId>>(&feature, &state, SELECT_IDS_SELECTED), ids(0..3));

    let state = dispatch(&feature, state, DESELECT_ENTITIES, json!({ "ids": [1] }));
    let state = dispatch(&feature, state, TOGGLE_SELECT_ENTITIES, json!({ "ids": [0, 4] }));
    assert_eq!(
        select::<Vec<EntityId>>(&feature, &state, SELECT_IDS_SELECTED),
        [id(2), id(4)]
    );
    assert_eq!(select::<usize>(&feature, &state, SELECT_TOTAL_SELECTED), 2);

    let list: Vec<Entity> = select(&feature, &state, SELECT_ENTITIES_SELECTED_LIST);
    assert_eq!(entity_ids(&list), [id(2), id(4)]);
}

#[test]
fn selection_status_tracks_visible_list() {
    let feature = feature_with(Box::new(MultiSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let status = |state: &FeatureState| select::<SelectionStatus>(&feature, state, IS_ALL_ENTITIES_SELECTED);
    assert_eq!(status(&state), SelectionStatus::None);

    let state = dispatch(&feature, state, SELECT_ENTITIES, json!({ "ids": [0, 1] }));
    assert_eq!(status(&state), SelectionStatus::Partial);

    // Only ranks below 2 stay visible.
    let state = dispatch(&feature, state, STORE_ENTITIES_FILTER, json!({ "filter": 2 }));
    assert_eq!(status(&state), SelectionStatus::All);
}

#[test]
fn toggle_all_selects_then_clears_visible() {
    let feature = feature_with(Box::new(MultiSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, STORE_ENTITIES_FILTER, json!({ "filter": 3 }));

    let state = dispatch(&feature, state, TOGGLE_SELECT_ALL_ENTITIES, json!(null));
    assert_eq!(select::<Vec<EntityId>>(&feature, &state, SELECT_IDS_SELECTED), ids(0..3));

    let state = dispatch(&feature, state, TOGGLE_SELECT_ALL_ENTITIES, json!(null));
    assert!(select::<Vec<EntityId>>(&feature, &state, SELECT_IDS_SELECTED).is_empty());
}

#[test]
fn remove_all_clears_multi_selection() {
    let feature = feature_with(Box::new(MultiSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITIES, json!({ "ids": [0, 1] }));
    let state = dispatch(&feature, state, REMOVE_ALL_ENTITIES, json!(null));
    assert!(select::<Vec<EntityId>>(&feature, &state, SELECT_IDS_SELECTED).is_empty());
}

#[test]
fn clear_selection() {
    let feature = feature_with(Box::new(MultiSelectionTrait::new()));
    let state = load(&feature, feature.initial_state(), 0..5, None);
    let state = dispatch(&feature, state, SELECT_ENTITIES, json!({ "ids": [0, 1] }));
    let state = dispatch(&feature, state, CLEAR_ENTITIES_SELECTION, json!(null));
    assert_eq!(select::<usize>(&feature, &state, SELECT_TOTAL_SELECTED), 0);
}
