#![forbid(unsafe_code)]

mod error;
mod feed;
mod gateway;
mod requests;
mod schema;

pub use error::StoreError;
pub use feed::{LiveEvent, LiveQuery};
pub use gateway::DocumentStore;
pub use requests::*;

use feed::ChangeFeed;
use jd_core::day::now_ms;
use jd_core::document::{FIELD_CREATED_AT, FIELD_UPDATED_AT};
use jd_core::{Document, Fields, Namespace};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const DB_FILE: &str = "jardin_store.db";
const MAX_COLLECTION_LEN: usize = 64;

/// Document store over a single SQLite file. All collections of one
/// namespace share the `documents` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    storage_dir: PathBuf,
    namespace: Namespace,
    feed: ChangeFeed,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>, namespace: Namespace) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::install(&conn)?;

        debug!(namespace = namespace.as_str(), dir = %storage_dir.display(), "store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            storage_dir,
            namespace,
            feed: ChangeFeed::default(),
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(DB_FILE)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Registered live queries across all collections.
    pub fn live_query_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn snapshot(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn()?;
        load_collection(&conn, self.namespace.as_str(), collection)
    }

    /// Publishes the post-commit result set. Callers hold the connection
    /// guard, so snapshots reach every subscriber in commit order.
    fn notify_locked(&self, conn: &Connection, collection: &str) {
        if !self.feed.has_subscribers(collection) {
            return;
        }
        match load_collection(conn, self.namespace.as_str(), collection) {
            Ok(docs) => self.feed.publish(collection, LiveEvent::Snapshot(docs)),
            Err(err) => {
                warn!(collection, error = %err, "live query failed");
                self.feed.publish(collection, LiveEvent::Failed(err.to_string()));
            }
        }
    }

    fn commit_chunk(&self, chunk: &[BatchOp]) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now_ms = now_ms();
        let mut inserted = Vec::new();
        let mut touched = BTreeSet::new();

        for op in chunk {
            validate_collection(op.collection())?;
            match op {
                BatchOp::Insert { collection, fields } => {
                    let id = new_document_id();
                    let mut fields = fields.clone();
                    stamp_created(&mut fields, now_ms);
                    let namespace = self.namespace.as_str();
                    insert_document_tx(&tx, namespace, collection, &id, now_ms, &fields)?;
                    inserted.push(id);
                }
                BatchOp::Delete { collection, id } => {
                    tx.execute(
                        "DELETE FROM documents WHERE namespace=?1 AND collection=?2 AND id=?3",
                        params![self.namespace.as_str(), collection, id],
                    )?;
                }
            }
            touched.insert(op.collection().to_string());
        }

        tx.commit()?;
        for collection in &touched {
            self.notify_locked(&conn, collection);
        }
        Ok(inserted)
    }
}

impl DocumentStore for SqliteStore {
    fn add(&self, collection: &str, mut fields: Fields) -> Result<String, StoreError> {
        validate_collection(collection)?;
        let id = new_document_id();
        let now_ms = now_ms();
        stamp_created(&mut fields, now_ms);

        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            insert_document_tx(&tx, self.namespace.as_str(), collection, &id, now_ms, &fields)?;
            tx.commit()?;
            self.notify_locked(&conn, collection);
        }

        debug!(collection, id = %id, "document added");
        Ok(id)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let now_ms = now_ms();

        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let body = tx
                .query_row(
                    "SELECT body_json FROM documents WHERE namespace=?1 AND collection=?2 AND id=?3",
                    params![self.namespace.as_str(), collection, id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            let Some(body) = body else {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            };

            let mut current = parse_body(&body)?;
            for (key, value) in fields {
                if key == "id" || key == FIELD_CREATED_AT {
                    continue;
                }
                current.insert(key, value);
            }
            current.insert(FIELD_UPDATED_AT.to_string(), Value::from(now_ms));

            tx.execute(
                "UPDATE documents SET body_json=?4, updated_at_ms=?5 \
                 WHERE namespace=?1 AND collection=?2 AND id=?3",
                params![
                    self.namespace.as_str(),
                    collection,
                    id,
                    serde_json::to_string(&current)?,
                    now_ms
                ],
            )?;
            tx.commit()?;
            self.notify_locked(&conn, collection);
        }

        debug!(collection, id, "document updated");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM documents WHERE namespace=?1 AND collection=?2 AND id=?3",
            params![self.namespace.as_str(), collection, id],
        )?;

        if removed == 0 {
            debug!(collection, id, "delete of absent document");
            return Ok(());
        }
        self.notify_locked(&conn, collection);
        debug!(collection, id, "document deleted");
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        validate_collection(collection)?;
        // Registered under the connection guard so no write can publish
        // between the initial snapshot and the subscriber joining the feed.
        let conn = self.conn()?;
        let query = self.feed.register(collection)?;
        match load_collection(&conn, self.namespace.as_str(), collection) {
            Ok(docs) => self.feed.send_to(query.id(), LiveEvent::Snapshot(docs)),
            Err(err) => {
                warn!(collection, error = %err, "live query failed on subscribe");
                self.feed.send_to(query.id(), LiveEvent::Failed(err.to_string()));
            }
        }
        drop(conn);
        debug!(collection, query_id = query.id(), "live query registered");
        Ok(query)
    }

    fn fetch_once(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        validate_collection(&query.collection)?;
        let mut docs = self.snapshot(&query.collection)?;
        if let QueryOrder::FieldAsc(field) = &query.order {
            docs.sort_by(|a, b| a.str_field(field).cmp(&b.str_field(field)));
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    fn batch_write(
        &self,
        ops: Vec<BatchOp>,
        max_batch_size: usize,
    ) -> Result<BatchReport, StoreError> {
        if max_batch_size == 0 {
            return Err(StoreError::InvalidInput("max_batch_size must be positive"));
        }
        let total_chunks = ops.len().div_ceil(max_batch_size);
        let mut report = BatchReport::default();

        for (index, chunk) in ops.chunks(max_batch_size).enumerate() {
            match self.commit_chunk(chunk) {
                Ok(inserted) => {
                    report.chunks_committed += 1;
                    report.ops_committed += chunk.len();
                    report.inserted_ids.extend(inserted);
                    let ops = chunk.len();
                    debug!(chunk = index + 1, total_chunks, ops, "batch chunk committed");
                }
                Err(source) => {
                    warn!(chunk = index + 1, total_chunks, error = %source, "batch chunk failed");
                    return Err(StoreError::PartialBatch {
                        committed_chunks: report.chunks_committed,
                        committed_ops: report.ops_committed,
                        total_chunks,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(report)
    }
}

fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Server timestamps win over anything the caller supplied.
fn stamp_created(fields: &mut Fields, now_ms: i64) {
    fields.remove("id");
    fields.remove(FIELD_UPDATED_AT);
    fields.insert(FIELD_CREATED_AT.to_string(), Value::from(now_ms));
}

fn validate_collection(collection: &str) -> Result<(), StoreError> {
    if collection.is_empty() {
        return Err(StoreError::InvalidInput("collection must not be empty"));
    }
    if collection.len() > MAX_COLLECTION_LEN {
        return Err(StoreError::InvalidInput("collection name too long"));
    }
    if !collection
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
    {
        return Err(StoreError::InvalidInput("collection contains invalid characters"));
    }
    Ok(())
}

fn parse_body(body: &str) -> Result<Fields, StoreError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::InvalidInput("document body is not a json object")),
    }
}

fn next_seq_tx(tx: &Transaction<'_>, namespace: &str) -> Result<i64, StoreError> {
    let current: i64 = tx
        .query_row(
            "SELECT value FROM counters WHERE namespace=?1 AND name='document_seq'",
            params![namespace],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    let next = current + 1;
    tx.execute(
        r#"
        INSERT INTO counters(namespace, name, value) VALUES (?1, 'document_seq', ?2)
        ON CONFLICT(namespace, name) DO UPDATE SET value=excluded.value
        "#,
        params![namespace, next],
    )?;
    Ok(next)
}

fn insert_document_tx(
    tx: &Transaction<'_>,
    namespace: &str,
    collection: &str,
    id: &str,
    created_at_ms: i64,
    fields: &Fields,
) -> Result<(), StoreError> {
    let seq = next_seq_tx(tx, namespace)?;
    tx.execute(
        r#"
        INSERT INTO documents(namespace, collection, id, seq, created_at_ms, updated_at_ms, body_json)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
        "#,
        params![
            namespace,
            collection,
            id,
            seq,
            created_at_ms,
            serde_json::to_string(fields)?
        ],
    )?;
    Ok(())
}

fn load_collection(
    conn: &Connection,
    namespace: &str,
    collection: &str,
) -> Result<Vec<Document>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, body_json FROM documents \
         WHERE namespace=?1 AND collection=?2 \
         ORDER BY created_at_ms DESC, seq DESC",
    )?;
    let mut rows = stmt.query(params![namespace, collection])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let id = row.get::<_, String>(0)?;
        let body = row.get::<_, String>(1)?;
        out.push(Document::new(id, parse_body(&body)?));
    }
    Ok(out)
}
