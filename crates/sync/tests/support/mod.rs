#![allow(dead_code)]

use jd_core::{Document, EntityKind, Fields, Namespace};
use jd_storage::{BatchOp, BatchReport, DocumentStore, LiveQuery, Query, SqliteStore, StoreError};
use jd_sync::{AppState, Clock, CollectionView, Session, ViewSink};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use time::UtcOffset;

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("jd_sync_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn open_store(test_name: &str) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open(temp_dir(test_name), Namespace::default()).expect("open store"))
}

pub fn signed_in_state(branch: &str) -> AppState {
    let mut state = AppState::new(
        jd_core::BranchTag::try_new(branch).expect("branch"),
        UtcOffset::UTC,
    );
    state.username = "Lucía".to_string();
    state.session = Some(Session {
        uid: "anon-test".to_string(),
        anonymous: true,
    });
    state
}

pub fn all(store: &dyn DocumentStore, kind: EntityKind) -> Vec<Document> {
    store
        .fetch_once(&Query::collection(kind.collection()))
        .expect("fetch collection")
}

/// Delegates to a real store but fails every call on the listed collections.
pub struct FailingStore {
    inner: Arc<SqliteStore>,
    failing: RefCell<BTreeSet<String>>,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            failing: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn fail(&self, collection: &str) {
        self.failing.borrow_mut().insert(collection.to_string());
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing.borrow().contains(collection) {
            return Err(StoreError::Io(std::io::Error::other(format!(
                "{collection} unavailable"
            ))));
        }
        Ok(())
    }
}

impl DocumentStore for FailingStore {
    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check(collection)?;
        self.inner.add(collection, fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.update(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.delete(collection, id)
    }

    fn subscribe(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        self.check(collection)?;
        self.inner.subscribe(collection)
    }

    fn fetch_once(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check(&query.collection)?;
        self.inner.fetch_once(query)
    }

    fn batch_write(&self, ops: Vec<BatchOp>, max_batch_size: usize) -> Result<BatchReport, StoreError> {
        for op in &ops {
            self.check(op.collection())?;
        }
        self.inner.batch_write(ops, max_batch_size)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub views: Vec<CollectionView>,
    pub failures: Vec<(EntityKind, String)>,
}

impl RecordingSink {
    pub fn last(&self, kind: EntityKind) -> Option<&CollectionView> {
        self.views.iter().rev().find(|view| view.kind == kind)
    }

    pub fn ids(&self, kind: EntityKind) -> Vec<String> {
        self.last(kind)
            .map(|view| view.documents.iter().map(|doc| doc.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl ViewSink for RecordingSink {
    fn render(&mut self, view: &CollectionView) {
        self.views.push(view.clone());
    }

    fn subscription_failed(&mut self, kind: EntityKind, message: &str) {
        self.failures.push((kind, message.to_string()));
    }
}

/// Clock the test can move by hand.
#[derive(Clone)]
pub struct ManualClock(pub Rc<Cell<i64>>);

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self(Rc::new(Cell::new(now_ms)))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}
