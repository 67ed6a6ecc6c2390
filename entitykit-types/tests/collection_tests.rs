use entitykit_types::{Entity, EntityCollection, EntityId, EntityUpdate, UpsertOutcome};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn item(id: u64, name: &str) -> Entity {
    Entity::from_value(json!({"id": id, "name": name})).unwrap()
}

fn ids(collection: &EntityCollection) -> Vec<String> {
    collection.ids().iter().map(ToString::to_string).collect()
}

fn changes(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn new_collection_is_empty() {
    let collection = EntityCollection::new();
    assert!(collection.is_empty());
    assert_eq!(collection.len(), 0);
    assert!(collection.all().is_empty());
}

#[test]
fn set_all_replaces_everything() {
    let mut collection: EntityCollection = vec![item(1, "a"), item(2, "b")].into_iter().collect();
    collection.set_all(vec![item(3, "c")]);
    assert_eq!(ids(&collection), vec!["3"]);
    assert!(!collection.contains(&EntityId::from(1u64)));
}

#[test]
fn set_all_keeps_first_position_and_last_record_of_duplicates() {
    let mut collection = EntityCollection::new();
    collection.set_all(vec![item(1, "first"), item(2, "b"), item(1, "second")]);
    assert_eq!(ids(&collection), vec!["1", "2"]);
    let one = collection.get(&EntityId::from(1u64)).unwrap();
    assert_eq!(one.get_str("/name"), Some("second"));
}

#[test]
fn add_many_skips_existing_ids() {
    let mut collection: EntityCollection = vec![item(1, "a")].into_iter().collect();
    let added = collection.add_many(vec![item(1, "dup"), item(2, "b")]);
    assert_eq!(added, vec![EntityId::from(2u64)]);
    assert_eq!(ids(&collection), vec!["1", "2"]);
    assert_eq!(collection.get(&EntityId::from(1u64)).unwrap().get_str("/name"), Some("a"));
}

#[test]
fn upsert_many_reports_outcomes() {
    let mut collection: EntityCollection = vec![item(1, "a")].into_iter().collect();
    let outcomes = collection.upsert_many(vec![item(1, "a2"), item(2, "b")]);
    assert_eq!(
        outcomes,
        vec![
            (EntityId::from(1u64), UpsertOutcome::Replaced),
            (EntityId::from(2u64), UpsertOutcome::Inserted),
        ]
    );
    assert_eq!(collection.get(&EntityId::from(1u64)).unwrap().get_str("/name"), Some("a2"));
}

#[test]
fn update_many_skips_unknown_ids() {
    let mut collection: EntityCollection = vec![item(1, "a")].into_iter().collect();
    let applied = collection.update_many(&[
        EntityUpdate::new(9u64, changes(json!({"name": "nope"}))),
        EntityUpdate::new(1u64, changes(json!({"name": "renamed"}))),
    ]);
    assert_eq!(applied.len(), 1);
    assert!(!applied[0].is_rename());
    assert_eq!(collection.get(&EntityId::from(1u64)).unwrap().get_str("/name"), Some("renamed"));
}

#[test]
fn update_rename_keeps_position() {
    let mut collection: EntityCollection =
        vec![item(1, "a"), item(2, "b"), item(3, "c")].into_iter().collect();
    let applied = collection.update_many(&[EntityUpdate::new(2u64, changes(json!({"id": 20})))]);

    assert!(applied[0].is_rename());
    assert_eq!(ids(&collection), vec!["1", "20", "3"]);
    assert!(collection.get(&EntityId::from(2u64)).is_none());
    assert_eq!(collection.get(&EntityId::from(20u64)).unwrap().get_str("/name"), Some("b"));
}

#[test]
fn rename_onto_existing_id_is_skipped() {
    let mut collection: EntityCollection = vec![item(1, "a"), item(2, "b")].into_iter().collect();
    let applied = collection.update_many(&[EntityUpdate::new(1u64, changes(json!({"id": 2})))]);
    assert!(applied.is_empty());
    assert_eq!(ids(&collection), vec!["1", "2"]);
}

#[test]
fn remove_many_returns_present_ids_only() {
    let mut collection: EntityCollection =
        vec![item(1, "a"), item(2, "b"), item(3, "c")].into_iter().collect();
    let removed = collection.remove_many(&[EntityId::from(2u64), EntityId::from(7u64)]);
    assert_eq!(removed, vec![EntityId::from(2u64)]);
    assert_eq!(ids(&collection), vec!["1", "3"]);
}

#[test]
fn remove_all_returns_ids_in_order() {
    let mut collection: EntityCollection = vec![item(2, "b"), item(1, "a")].into_iter().collect();
    let removed = collection.remove_all();
    assert_eq!(removed, vec![EntityId::from(2u64), EntityId::from(1u64)]);
    assert!(collection.is_empty());
}

#[test]
fn iter_follows_id_order() {
    let collection: EntityCollection = vec![item(3, "c"), item(1, "a")].into_iter().collect();
    let names: Vec<&str> = collection.iter().filter_map(|e| e.get_str("/name")).collect();
    assert_eq!(names, vec!["c", "a"]);
}
