use entitykit_types::{Entity, EntityId, EntityUpdate};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn changes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("changes must be an object"),
    }
}

#[test]
fn from_value_reads_the_id() {
    let entity = Entity::from_value(json!({"id": 3, "title": "Dune"})).unwrap();
    assert_eq!(entity.id(), &EntityId::from(3u64));
    assert_eq!(entity.get_str("/title"), Some("Dune"));
    // The cached id and the field agree.
    assert_eq!(entity.field("id"), Some(&json!("3")));
}

#[test]
fn from_value_rejects_records_without_id() {
    assert!(Entity::from_value(json!({"title": "no id"})).is_err());
    assert!(Entity::from_value(json!([1, 2, 3])).is_err());
}

#[test]
fn pointer_accessors() {
    let entity = Entity::from_value(json!({
        "id": "a",
        "price": 12.5,
        "active": true,
        "meta": {"tags": ["x", "y"]}
    }))
    .unwrap();

    assert_eq!(entity.get_number("/price"), Some(12.5));
    assert_eq!(entity.get_bool("/active"), Some(true));
    assert_eq!(entity.get_str("/meta/tags/1"), Some("y"));
    assert_eq!(entity.get_str("/missing"), None);
    assert_eq!(entity.get_str("no-leading-slash"), None);
}

#[test]
fn pointer_accessors_unescape_field_names() {
    let entity = Entity::from_value(json!({
        "id": 1,
        "a/b": "slash",
        "m~n": "tilde",
        "nested": {"c/d": {"e~f": 7}}
    }))
    .unwrap();

    assert_eq!(entity.get_str("/a~1b"), Some("slash"));
    assert_eq!(entity.get_str("/m~0n"), Some("tilde"));
    assert_eq!(entity.get_number("/nested/c~1d/e~0f"), Some(7.0));
    assert_eq!(entity.get_str("/a/b"), None);
    for pointer in ["/a~1b", "/m~0n", "/nested/c~1d/e~0f"] {
        assert!(entity.to_value().pointer(pointer).is_some());
    }
}

#[test]
fn apply_changes_merges_top_level_fields() {
    let entity = Entity::from_value(json!({"id": "a", "title": "old", "year": 1965})).unwrap();
    let next = entity.apply_changes(&changes(json!({"title": "new"})));

    assert_eq!(next.get_str("/title"), Some("new"));
    assert_eq!(next.get_number("/year"), Some(1965.0));
    // The source record is untouched.
    assert_eq!(entity.get_str("/title"), Some("old"));
}

#[test]
fn apply_changes_can_rename() {
    let entity = Entity::from_value(json!({"id": "tmp-1", "title": "draft"})).unwrap();
    let next = entity.apply_changes(&changes(json!({"id": 99})));

    assert_eq!(next.id(), &EntityId::from(99u64));
    assert_eq!(next.field("id"), Some(&json!("99")));
}

#[test]
fn apply_changes_ignores_unresolvable_id() {
    let entity = Entity::from_value(json!({"id": "a"})).unwrap();
    let next = entity.apply_changes(&changes(json!({"id": null, "x": 1})));
    assert_eq!(next.id(), &EntityId::from("a"));
    assert_eq!(next.get_number("/x"), Some(1.0));
}

#[test]
fn stub_has_only_the_id() {
    let stub = Entity::stub("gone");
    assert_eq!(stub.to_value(), json!({"id": "gone"}));
}

#[test]
fn serde_uses_the_flat_record() {
    let entity = Entity::from_value(json!({"id": 1, "name": "x"})).unwrap();
    let value = serde_json::to_value(&entity).unwrap();
    assert_eq!(value, json!({"id": "1", "name": "x"}));

    let back: Entity = serde_json::from_value(value).unwrap();
    assert_eq!(back, entity);
}

#[test]
fn update_rename_detection() {
    let rename = EntityUpdate::new("tmp", changes(json!({"id": "real"})));
    assert_eq!(rename.renamed_to(), Some(EntityId::from("real")));

    let same = EntityUpdate::new("a", changes(json!({"id": "a", "x": 1})));
    assert_eq!(same.renamed_to(), None);

    let plain = EntityUpdate::new("a", changes(json!({"x": 1})));
    assert_eq!(plain.renamed_to(), None);
}
