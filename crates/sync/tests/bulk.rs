#![forbid(unsafe_code)]

mod support;

use jd_core::EntityKind;
use jd_storage::{DocumentStore, StoreError};
use jd_sync::bulk::{AUTOCOMPLETE_LIMIT, read_catalog};
use jd_sync::BulkOperator;
use serde_json::json;
use std::sync::Arc;
use support::*;
use time::{Date, Month};

fn operator(store: &Arc<jd_storage::SqliteStore>) -> BulkOperator {
    let store: Arc<dyn DocumentStore> = store.clone();
    BulkOperator::new(store)
}

fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Planta {i:04}")).collect()
}

#[test]
fn stock_insert_commits_in_chunks_of_400() {
    let store = open_store("stock_chunks");
    let op = operator(&store);

    let report = op.batch_insert_stock(&names(1000)).expect("insert");
    assert_eq!(report.chunks_committed, 3);
    assert_eq!(report.ops_committed, 1000);

    let report = op.batch_insert_stock(&names(400)).expect("insert exact");
    assert_eq!(report.chunks_committed, 1);
    assert_eq!(all(&*store, EntityKind::Stock).len(), 1400);
}

#[test]
fn stock_insert_stores_every_name_with_multiplicity() {
    let store = open_store("stock_multiplicity");
    let op = operator(&store);
    let mut input = names(801);
    input[3] = "Rosa".to_string();
    input[500] = "Rosa".to_string();
    input[800] = "  ".to_string();

    let report = op.batch_insert_stock(&input).expect("insert");
    assert_eq!(report.chunks_committed, 3);
    assert_eq!(report.ops_committed, 801);
    assert_eq!(report.inserted_ids.len(), 801);

    let mut stored: Vec<String> = all(&*store, EntityKind::Stock)
        .iter()
        .map(|doc| doc.str_field("name").unwrap_or_default().to_string())
        .collect();
    stored.sort();
    input.sort();
    assert_eq!(stored, input);
}

#[test]
fn delete_all_stock_empties_the_collection() {
    let store = open_store("stock_reset");
    let op = operator(&store).with_batch_size(100);
    op.batch_insert_stock(&names(250)).expect("insert");

    let report = op.batch_delete_all_stock().expect("delete all");
    assert_eq!(report.chunks_committed, 3);
    assert!(all(&*store, EntityKind::Stock).is_empty());

    let report = op.batch_delete_all_stock().expect("delete nothing");
    assert_eq!(report.chunks_committed, 0);
}

#[test]
fn backup_has_one_key_per_collection() {
    let store = open_store("backup_keys");
    let task = store
        .add("tasks", jd_core::Fields::from_iter([("text".to_string(), json!("Regar"))]))
        .expect("add task");
    store
        .add("chat", jd_core::Fields::from_iter([("text".to_string(), json!("hola"))]))
        .expect("add chat");

    let op = operator(&store).with_extra_collections(vec!["chat".to_string(), "tasks".to_string()]);
    let backup = op.generate_backup();
    let map = backup.as_object().expect("object");

    assert_eq!(map.len(), EntityKind::TRACKED.len() + 1);
    for kind in EntityKind::TRACKED {
        assert!(map.contains_key(kind.collection()), "missing {}", kind.collection());
    }
    assert!(!map.contains_key("stock"));

    let tasks = map["tasks"].as_array().expect("tasks array");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], json!(task));
    assert_eq!(tasks[0]["text"], json!("Regar"));
    assert_eq!(map["chat"].as_array().map(Vec::len), Some(1));
}

#[test]
fn failing_collection_exports_empty() {
    let inner = open_store("backup_failure");
    inner
        .add("orders", jd_core::Fields::from_iter([("requester".to_string(), json!("Marta"))]))
        .expect("add order");
    inner
        .add("notes", jd_core::Fields::from_iter([("content".to_string(), json!("x"))]))
        .expect("add note");
    let failing = Arc::new(FailingStore::new(inner));
    failing.fail("orders");
    let store: Arc<dyn DocumentStore> = failing;

    let backup = BulkOperator::new(store).generate_backup();
    assert_eq!(backup["orders"], json!([]));
    assert_eq!(backup["notes"].as_array().map(Vec::len), Some(1));
}

#[test]
fn write_backup_names_file_by_date() {
    let store = open_store("backup_file");
    let dir = temp_dir("backup_file_out");
    let date = Date::from_calendar_date(2026, Month::October, 16).expect("date");

    let path = operator(&store).write_backup(&dir, date).expect("write backup");
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("backup_jardin_2026-10-16.json")
    );
    let raw = std::fs::read_to_string(&path).expect("read backup");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert!(parsed.get("deliveries").is_some());
}

#[test]
fn autocomplete_is_sorted_and_capped() {
    let store = open_store("autocomplete");
    let op = operator(&store);
    let mut input = names(AUTOCOMPLETE_LIMIT + 5);
    input.reverse();
    op.batch_insert_stock(&input).expect("insert");

    let mut state = signed_in_state("centro");
    assert_eq!(op.load_autocomplete(&mut state), AUTOCOMPLETE_LIMIT);
    assert_eq!(state.stock_list[0], "Planta 0000");
    assert_eq!(state.stock_list[AUTOCOMPLETE_LIMIT - 1], format!("Planta {:04}", AUTOCOMPLETE_LIMIT - 1));
}

#[test]
fn autocomplete_degrades_to_empty() {
    let inner = open_store("autocomplete_failure");
    let failing = Arc::new(FailingStore::new(inner));
    failing.fail("stock");
    let store: Arc<dyn DocumentStore> = failing;

    let mut state = signed_in_state("centro");
    state.stock_list = vec!["stale".to_string()];
    assert_eq!(BulkOperator::new(store).load_autocomplete(&mut state), 0);
    assert!(state.stock_list.is_empty());
}

#[test]
fn stock_insert_failure_is_reported() {
    let inner = open_store("stock_failure");
    let failing = Arc::new(FailingStore::new(inner));
    failing.fail("stock");
    let store: Arc<dyn DocumentStore> = failing;

    let err = BulkOperator::new(store)
        .batch_insert_stock(&names(3))
        .expect_err("store down");
    assert!(matches!(err, StoreError::Io(_)));
}

#[test]
fn catalog_reads_one_name_per_line() {
    let dir = temp_dir("catalog");
    let path = dir.join("catalog.txt");
    std::fs::write(&path, "Rosa\n\n  Lavanda  \r\nAbeto\n").expect("write catalog");

    let names = read_catalog(&path).expect("read catalog");
    assert_eq!(names, vec!["Rosa", "Lavanda", "Abeto"]);
    assert!(read_catalog(&dir.join("absent.txt")).expect("absent").is_empty());
}
