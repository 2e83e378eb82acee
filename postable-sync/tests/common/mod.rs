//! Shared fixtures: a `books` and a `reports` source table plus a `posts`
//! index table, available on both stores, and helpers that mimic an
//! application saving and deleting source records.

#![allow(dead_code)]

use std::sync::Arc;

use postable_model::{Row, SourceRecord, SourceType};
use postable_storage::{Criteria, MemoryStore, Persistence, Query, SqliteStore, TableDef};
use postable_sync::{IndexSettings, IndexSynchronizer, SaveOutcome};
use serde_json::{Value, json};

pub const SCHEMA_SQL: &str = "
    CREATE TABLE books (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL DEFAULT '',
        author_first_name TEXT NOT NULL DEFAULT '',
        author_last_name TEXT NOT NULL DEFAULT '',
        country TEXT NOT NULL DEFAULT '',
        color TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE reports (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        region TEXT NOT NULL DEFAULT '',
        color TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE posts (
        id INTEGER PRIMARY KEY,
        source_type TEXT NOT NULL,
        source_id INTEGER NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        region TEXT NOT NULL DEFAULT '',
        color TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE entries (
        id INTEGER PRIMARY KEY,
        model TEXT NOT NULL,
        foreign_key INTEGER NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        region TEXT NOT NULL DEFAULT '',
        color TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE invalid_storage (
        id INTEGER PRIMARY KEY
    );
";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().expect("object literal")
}

fn index_table(name: &str, type_column: &str, id_column: &str) -> TableDef {
    TableDef::new(name)
        .column(type_column)
        .column(id_column)
        .column_default("title", "")
        .column_default("author", "")
        .column_default("region", "")
        .column_default("color", "")
}

/// Empty tables, no rows.
pub fn empty_memory_store() -> Arc<MemoryStore> {
    init_tracing();
    let store = MemoryStore::new();
    let tables = [
        TableDef::new("books")
            .column_default("title", "")
            .column_default("author_first_name", "")
            .column_default("author_last_name", "")
            .column_default("country", "")
            .column_default("color", ""),
        TableDef::new("reports")
            .column_default("title", "")
            .column_default("author", "")
            .column_default("region", "")
            .column_default("color", ""),
        index_table("posts", "source_type", "source_id"),
        index_table("entries", "model", "foreign_key"),
        TableDef::new("invalid_storage"),
    ];
    for def in tables {
        store.create_table(def).unwrap();
    }
    Arc::new(store)
}

pub fn empty_sqlite_store() -> Arc<SqliteStore> {
    init_tracing();
    let store = SqliteStore::open_in_memory().unwrap();
    store.execute_batch(SCHEMA_SQL).unwrap();
    Arc::new(store)
}

/// Writes the book and report fixtures straight into the source tables,
/// bypassing any synchronizer.
pub fn seed(store: &dyn Persistence) {
    for (id, word) in [(1, "One"), (2, "Two"), (3, "Three")] {
        store
            .save(
                "books",
                row(json!({
                    "id": id,
                    "title": format!("Title {word}"),
                    "author_first_name": format!("First Name {word}"),
                    "author_last_name": format!("Last Name {word}"),
                    "country": format!("Country {word}"),
                    "color": format!("Color {word}"),
                })),
            )
            .unwrap();
    }
    store
        .save(
            "reports",
            row(json!({
                "id": 1,
                "title": "Report Title",
                "author": "Report Author",
                "region": "Report Region",
                "color": "Report Color",
            })),
        )
        .unwrap();
}

pub fn memory_store() -> Arc<MemoryStore> {
    let store = empty_memory_store();
    seed(&*store);
    store
}

pub fn sqlite_store() -> Arc<SqliteStore> {
    let store = empty_sqlite_store();
    seed(&*store);
    store
}

pub fn books() -> SourceType {
    SourceType::new("Book", "books")
}

pub fn reports() -> SourceType {
    SourceType::new("Report", "reports")
}

pub fn configure(
    store: Arc<dyn Persistence>,
    source: SourceType,
    settings: IndexSettings,
) -> IndexSynchronizer {
    IndexSynchronizer::configure(store, source, settings).unwrap()
}

/// Re-inserts every row of the synchronizer's source table and reports each
/// one as newly created, like an application re-importing its data.
pub fn resave_all(store: &dyn Persistence, sync: &IndexSynchronizer) {
    let table = sync.source_type().table.clone();
    let rows = store.find(&table, &Query::all()).unwrap();
    store.delete_all(&table, &Criteria::all()).unwrap();
    for r in rows {
        let saved = store.save(&table, r).unwrap();
        sync.on_save(&SourceRecord::from_row(saved).unwrap(), true).unwrap();
    }
}

/// Saves `fields` into the source table and notifies the synchronizer with
/// exactly the data that was written, as an ORM's after-save hook would.
pub fn save_source(
    store: &dyn Persistence,
    sync: &IndexSynchronizer,
    fields: Value,
) -> (i64, SaveOutcome) {
    let fields = row(fields);
    let is_new = !fields.contains_key("id");
    let stored = store.save(&sync.source_type().table, fields.clone()).unwrap();
    let id = stored["id"].as_i64().unwrap();
    let outcome = sync
        .on_save(&SourceRecord::new(id, fields), is_new)
        .unwrap();
    (id, outcome)
}

/// Deletes a source row and notifies the synchronizer.
pub fn delete_source(store: &dyn Persistence, sync: &IndexSynchronizer, id: i64) -> bool {
    store.delete(&sync.source_type().table, id).unwrap();
    sync.on_delete(id).unwrap()
}

/// Mapped columns of every index row of `sync`'s source type, keyed by source id.
pub fn snapshot(sync: &IndexSynchronizer) -> Vec<(i64, Row)> {
    sync.entries()
        .unwrap()
        .into_iter()
        .map(|e| (e.source_id, e.columns))
        .collect()
}
