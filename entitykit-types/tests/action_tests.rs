use entitykit_types::{Action, CallStatus, Change, ChangeType, Error};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct LoadPage {
    index: usize,
    #[serde(default)]
    force_load: bool,
}

#[derive(Debug, Deserialize, PartialEq, Default)]
struct Optional {
    #[serde(default)]
    force: bool,
}

#[test]
fn payload_decodes_into_typed_struct() {
    let action = Action::with_payload("loadPage", json!({"index": 3, "forceLoad": true}));
    let payload: LoadPage = action.payload_as().unwrap();
    assert_eq!(payload, LoadPage { index: 3, force_load: true });
}

#[test]
fn missing_payload_decodes_like_empty_object() {
    let action = Action::new("loadFirstPage");
    let payload: Optional = action.payload_as().unwrap();
    assert_eq!(payload, Optional::default());
}

#[test]
fn invalid_payload_reports_the_action_kind() {
    let action = Action::with_payload("loadPage", json!({"index": "three"}));
    let err = action.payload_as::<LoadPage>().unwrap_err();
    match err {
        Error::InvalidPayload { kind, .. } => assert_eq!(kind, "loadPage"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn is_matches_kind() {
    let action = Action::new("removeAllEntities");
    assert!(action.is("removeAllEntities"));
    assert!(!action.is("removeEntities"));
    assert_eq!(action.to_string(), "[removeAllEntities]");
}

#[test]
fn change_serialization_uses_camel_case() {
    let change = Change::updated(5u64).with_entity_changes(json!({"name": "x"}));
    let value = serde_json::to_value(&change).unwrap();
    assert_eq!(
        value,
        json!({"id": "5", "changeType": "updated", "entityChanges": {"name": "x"}})
    );

    let plain = serde_json::to_value(Change::deleted("a")).unwrap();
    assert_eq!(plain, json!({"id": "a", "changeType": "deleted"}));
    assert_eq!(ChangeType::Created.to_string(), "created");
}

#[test]
fn call_status_predicates() {
    assert!(CallStatus::Loading.is_loading());
    assert!(CallStatus::Success.is_loaded());
    let fail = CallStatus::Fail { error: Some(json!("boom")) };
    assert!(fail.is_fail());
    assert_eq!(fail.error(), Some(&json!("boom")));
    assert_eq!(CallStatus::default(), CallStatus::Idle);
}
