mod common;

use common::*;
use entitykit_compose::{compose, Feature, FeatureTrait, SchedulePolicy};
use entitykit_traits::keys::*;
use entitykit_traits::{CallStatusTrait, CrudTrait, EntitiesTrait, LoadEntityTrait};
use entitykit_types::{CallStatus, Change, Entity, EntityId};
use pretty_assertions::assert_eq;
use serde_json::json;

fn feature() -> Feature {
    let traits: Vec<Box<dyn FeatureTrait>> = vec![
        Box::new(EntitiesTrait::new()),
        Box::new(CrudTrait::default()),
        Box::new(LoadEntityTrait::new()),
    ];
    compose(traits).unwrap()
}

fn status(feature: &Feature, state: &entitykit_compose::FeatureState, id: u64) -> CallStatus {
    select_with(feature, state, SELECT_ENTITY_CALL_STATUS, EntityId::from(id))
}

// ── Per-ID status ─────────────────────────────────────────────────

#[test]
fn status_is_tracked_per_id() {
    let feature = feature();
    let state = dispatch(&feature, feature.initial_state(), LOAD_ENTITY_ACTION, json!({ "id": 1 }));
    let state = dispatch(&feature, state, LOAD_ENTITY_ACTION, json!({ "id": 2 }));
    let state = dispatch(
        &feature,
        state,
        LOAD_ENTITY_FAIL,
        json!({ "id": 2, "error": "not found: 2" }),
    );

    assert_eq!(status(&feature, &state, 1), CallStatus::Loading);
    assert_eq!(
        status(&feature, &state, 2),
        CallStatus::Fail {
            error: Some(json!("not found: 2"))
        }
    );
    assert_eq!(status(&feature, &state, 3), CallStatus::Idle);
    let loading: bool = select_with(&feature, &state, IS_ENTITY_LOADING, EntityId::from(1u64));
    assert!(loading);
}

#[test]
fn loaded_entity_is_upserted_without_logging() {
    let feature = feature();
    let state = load(&feature, feature.initial_state(), 0..2, None);
    let state = dispatch(&feature, state, LOAD_ENTITY_ACTION, json!({ "id": 7 }));
    let state = dispatch(&feature, state, LOAD_ENTITY_SUCCESS, json!({ "entity": item(7) }));

    assert_eq!(status(&feature, &state, 7), CallStatus::Success);
    let loaded: Option<Entity> = select_with(&feature, &state, SELECT_BY_ID, EntityId::from(7u64));
    assert_eq!(loaded, Some(Entity::from_value(item(7)).unwrap()));
    assert!(select::<Vec<Change>>(&feature, &state, SELECT_CHANGES).is_empty());
}

// ── Effect ────────────────────────────────────────────────────────

#[tokio::test]
async fn effect_is_single_flight_per_id() {
    let feature = feature();
    let unit = effect(&feature, &collaborators(&FakeBackend::new(10)), LOAD_ENTITY_ACTION);
    let action = feature.action(LOAD_ENTITY_ACTION, json!({ "id": 4 })).unwrap();

    assert_eq!(unit.policy(), SchedulePolicy::DropIfBusy);
    assert_eq!(unit.flight_key(&action), Some("4".to_string()));
}

#[tokio::test]
async fn effect_reports_success_and_failure() {
    let feature = feature();
    let unit = effect(&feature, &collaborators(&FakeBackend::new(10)), LOAD_ENTITY_ACTION);

    let found = feature.action(LOAD_ENTITY_ACTION, json!({ "id": 4 })).unwrap();
    let out = unit.run(found, reader(feature.initial_state())).await;
    assert_eq!(kinds(&out), [LOAD_ENTITY_SUCCESS]);
    assert_eq!(out[0].payload["entity"]["name"], json!("item 4"));

    let missing = feature.action(LOAD_ENTITY_ACTION, json!({ "id": 40 })).unwrap();
    let out = unit.run(missing, reader(feature.initial_state())).await;
    assert_eq!(kinds(&out), [LOAD_ENTITY_FAIL]);
    assert_eq!(out[0].payload, json!({ "id": "40", "error": "not found: 40" }));
}

#[test]
fn missing_fetcher_is_a_build_error() {
    let feature = feature();
    let err = feature
        .build_effects(&entitykit_compose::Collaborators::new())
        .err()
        .expect("effects built without a fetcher");
    assert!(err.to_string().contains("requires collaborator"));
}

// ── Call status ───────────────────────────────────────────────────

#[test]
fn call_status_trait_tracks_named_call() {
    let traits: Vec<Box<dyn FeatureTrait>> = vec![Box::new(CallStatusTrait::new("checkout"))];
    let feature = compose(traits).unwrap();
    assert_eq!(feature.trait_keys(), ["checkoutCallStatus"]);

    let state = dispatch(&feature, feature.initial_state(), "checkout", json!(null));
    assert!(select::<bool>(&feature, &state, "isCheckoutLoading"));

    let state = dispatch(&feature, state, "checkoutFail", json!({ "error": "declined" }));
    assert!(select::<bool>(&feature, &state, "isCheckoutFail"));
    assert_eq!(
        select::<Option<serde_json::Value>>(&feature, &state, "selectCheckoutError"),
        Some(json!("declined"))
    );
}
