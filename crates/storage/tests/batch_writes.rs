#![forbid(unsafe_code)]

use jd_core::{Fields, Namespace};
use jd_storage::{BatchOp, DocumentStore, Query, SqliteStore, StoreError};
use serde_json::json;
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("jd_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn stock_insert(index: usize) -> BatchOp {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), json!(format!("Planta {index:04}")));
    BatchOp::Insert {
        collection: "stock".to_string(),
        fields,
    }
}

#[test]
fn batch_write_commits_in_chunks() {
    let store = SqliteStore::open(temp_dir("chunks"), Namespace::default()).expect("open store");
    let ops: Vec<_> = (0..1000).map(stock_insert).collect();

    let report = store.batch_write(ops, 400).expect("batch write");
    assert_eq!(report.chunks_committed, 3);
    assert_eq!(report.ops_committed, 1000);
    assert_eq!(report.inserted_ids.len(), 1000);

    let docs = store.fetch_once(&Query::collection("stock")).expect("fetch");
    assert_eq!(docs.len(), 1000);
}

#[test]
fn batch_delete_removes_listed_ids() {
    let store = SqliteStore::open(temp_dir("deletes"), Namespace::default()).expect("open store");
    let report = store
        .batch_write((0..5).map(stock_insert).collect(), 2)
        .expect("insert");
    assert_eq!(report.chunks_committed, 3);

    let deletes = report
        .inserted_ids
        .iter()
        .map(|id| BatchOp::Delete {
            collection: "stock".to_string(),
            id: id.clone(),
        })
        .collect();
    store.batch_write(deletes, 2).expect("delete");
    assert!(store.fetch_once(&Query::collection("stock")).expect("fetch").is_empty());
}

#[test]
fn empty_batch_is_a_no_op() {
    let store = SqliteStore::open(temp_dir("empty_batch"), Namespace::default()).expect("open store");
    let report = store.batch_write(Vec::new(), 400).expect("empty batch");
    assert_eq!(report.chunks_committed, 0);
    assert!(matches!(
        store.batch_write(Vec::new(), 0),
        Err(StoreError::InvalidInput(_))
    ));
}

#[test]
fn failing_chunk_reports_partial_progress() {
    let store = SqliteStore::open(temp_dir("partial"), Namespace::default()).expect("open store");
    let mut ops: Vec<_> = (0..401).map(stock_insert).collect();
    ops.push(BatchOp::Insert {
        collection: "not a collection".to_string(),
        fields: Fields::new(),
    });

    let err = store.batch_write(ops, 400).expect_err("second chunk must fail");
    match err {
        StoreError::PartialBatch {
            committed_chunks,
            committed_ops,
            total_chunks,
            source,
        } => {
            assert_eq!(committed_chunks, 1);
            assert_eq!(committed_ops, 400);
            assert_eq!(total_chunks, 2);
            assert!(matches!(*source, StoreError::InvalidInput(_)));
        }
        other => panic!("expected partial batch, got {other}"),
    }

    let docs = store.fetch_once(&Query::collection("stock")).expect("fetch");
    assert_eq!(docs.len(), 400, "the failed chunk rolled back as a whole");
}

#[test]
fn batch_write_refires_live_queries() {
    let store = SqliteStore::open(temp_dir("batch_refire"), Namespace::default()).expect("open store");
    let live = store.subscribe("stock").expect("subscribe");
    let _ = live.latest();

    store
        .batch_write((0..3).map(stock_insert).collect(), 400)
        .expect("batch");
    match live.latest() {
        Some(jd_storage::LiveEvent::Snapshot(docs)) => assert_eq!(docs.len(), 3),
        other => panic!("expected snapshot, got {other:?}"),
    }
}
