//! Shared test helpers: identical fixtures for both stores and a set of
//! behaviour checks every `Persistence` implementation must pass.

#![allow(dead_code)]

use postable_model::Row;
use postable_storage::{Criteria, MemoryStore, Persistence, Query, SqliteStore, TableDef};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

pub const NOTES_SQL: &str = "
    CREATE TABLE notes (
        id INTEGER PRIMARY KEY,
        kind TEXT NOT NULL DEFAULT 'plain',
        body TEXT,
        rank INTEGER
    );
";

pub fn row(value: Value) -> Row {
    value.as_object().cloned().expect("object literal")
}

pub fn memory_notes() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .create_table(
            TableDef::new("notes")
                .column_default("kind", "plain")
                .column("body")
                .column("rank"),
        )
        .unwrap();
    store
}

pub fn sqlite_notes() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.execute_batch(NOTES_SQL).unwrap();
    store
}

// ── Behaviour checks ─────────────────────────────────────────────

pub fn reports_schema(store: &dyn Persistence) {
    let columns = store.schema("notes").unwrap().unwrap();
    assert_eq!(columns, vec!["id", "kind", "body", "rank"]);
    assert_eq!(store.schema("missing").unwrap(), None);
}

pub fn insert_assigns_ids_and_defaults(store: &dyn Persistence) {
    let first = store.save("notes", row(json!({"body": "one"}))).unwrap();
    let second = store.save("notes", row(json!({"body": "two", "rank": 5}))).unwrap();

    assert_eq!(
        first,
        row(json!({"id": 1, "kind": "plain", "body": "one", "rank": null}))
    );
    assert_eq!(second["id"], json!(2));
    assert_eq!(second["rank"], json!(5));
}

pub fn update_touches_only_given_columns(store: &dyn Persistence) {
    store
        .save("notes", row(json!({"body": "one", "kind": "todo", "rank": 1})))
        .unwrap();
    let updated = store
        .save("notes", row(json!({"id": 1, "body": "changed"})))
        .unwrap();

    assert_eq!(
        updated,
        row(json!({"id": 1, "kind": "todo", "body": "changed", "rank": 1}))
    );
    assert_eq!(store.count("notes", &Criteria::all()).unwrap(), 1);
}

pub fn save_with_unknown_id_inserts(store: &dyn Persistence) {
    let stored = store
        .save("notes", row(json!({"id": 40, "body": "explicit"})))
        .unwrap();
    assert_eq!(stored["id"], json!(40));
    assert_eq!(stored["kind"], json!("plain"));

    let next = store.save("notes", row(json!({"body": "after"}))).unwrap();
    assert_eq!(next["id"], json!(41));
}

pub fn find_filters_orders_and_paginates(store: &dyn Persistence) {
    for (kind, body) in [("a", "1"), ("b", "2"), ("a", "3"), ("a", "4"), ("b", "5")] {
        store
            .save("notes", row(json!({"kind": kind, "body": body})))
            .unwrap();
    }

    let only_a = Criteria::all().eq("kind", "a");
    let bodies = |rows: Vec<Row>| -> Vec<Value> { rows.into_iter().map(|r| r["body"].clone()).collect() };

    assert_eq!(
        bodies(store.find("notes", &Query::new(only_a.clone())).unwrap()),
        vec![json!("1"), json!("3"), json!("4")]
    );
    assert_eq!(
        bodies(store.find("notes", &Query::new(only_a.clone()).limit(2)).unwrap()),
        vec![json!("1"), json!("3")]
    );
    assert_eq!(
        bodies(
            store
                .find("notes", &Query::new(only_a.clone()).limit(2).offset(2))
                .unwrap()
        ),
        vec![json!("4")]
    );
    assert_eq!(
        bodies(store.find("notes", &Query::all().offset(3)).unwrap()),
        vec![json!("4"), json!("5")]
    );
    assert_eq!(store.count("notes", &only_a).unwrap(), 3);

    let first_b = store
        .find_first("notes", &Criteria::all().eq("kind", "b"))
        .unwrap()
        .unwrap();
    assert_eq!(first_b["body"], json!("2"));
    assert_eq!(
        store
            .find_first("notes", &Criteria::all().eq("kind", "z"))
            .unwrap(),
        None
    );
}

pub fn delete_reports_whether_a_row_went(store: &dyn Persistence) {
    store.save("notes", row(json!({"body": "x"}))).unwrap();
    assert!(store.delete("notes", 1).unwrap());
    assert!(!store.delete("notes", 1).unwrap());
    assert_eq!(store.count("notes", &Criteria::all()).unwrap(), 0);
}

pub fn delete_all_counts_matches(store: &dyn Persistence) {
    for kind in ["a", "b", "a"] {
        store.save("notes", row(json!({"kind": kind}))).unwrap();
    }
    assert_eq!(
        store
            .delete_all("notes", &Criteria::all().eq("kind", "a"))
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .delete_all("notes", &Criteria::all().eq("kind", "a"))
            .unwrap(),
        0
    );
    assert_eq!(store.count("notes", &Criteria::all()).unwrap(), 1);
}

pub fn ids_restart_after_table_is_emptied(store: &dyn Persistence) {
    for _ in 0..3 {
        store.save("notes", row(json!({"body": "x"}))).unwrap();
    }
    store.delete_all("notes", &Criteria::all()).unwrap();
    let fresh = store.save("notes", row(json!({"body": "y"}))).unwrap();
    assert_eq!(fresh["id"], json!(1));
}

pub fn rejects_non_integer_id(store: &dyn Persistence) {
    assert!(store.save("notes", row(json!({"id": "one"}))).is_err());
}

pub fn insert_after_largest_id_does_not_panic(store: &dyn Persistence) {
    store
        .save("notes", row(json!({"id": i64::MAX, "body": "last"})))
        .unwrap();
    if let Ok(next) = store.save("notes", row(json!({"body": "after"}))) {
        let id = next["id"].as_i64().unwrap();
        assert_ne!(id, i64::MAX);
        assert_eq!(store.count("notes", &Criteria::all()).unwrap(), 2);
    }
    let last = store
        .find_first("notes", &Criteria::all().eq("id", i64::MAX))
        .unwrap()
        .unwrap();
    assert_eq!(last["body"], json!("last"));
}

pub fn criteria_follow_sql_equality(store: &dyn Persistence) {
    store.save("notes", row(json!({"body": "none"}))).unwrap();
    store
        .save("notes", row(json!({"body": "flag", "rank": true})))
        .unwrap();
    store
        .save("notes", row(json!({"body": "zero", "rank": 0})))
        .unwrap();

    assert_eq!(
        store
            .count("notes", &Criteria::all().eq("rank", Value::Null))
            .unwrap(),
        0
    );
    assert_eq!(store.count("notes", &Criteria::all().eq("rank", 1)).unwrap(), 1);
    assert_eq!(
        store
            .count("notes", &Criteria::all().eq("rank", false))
            .unwrap(),
        1
    );
}
