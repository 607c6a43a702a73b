#![forbid(unsafe_code)]

//! Stock maintenance and backup export.

use crate::state::AppState;
use jd_core::day::iso_date;
use jd_core::entities::StockItem;
use jd_core::{EntityKind, Fields};
use jd_storage::{BatchOp, BatchReport, DocumentStore, Query, StoreError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::Date;
use tracing::{debug, info, warn};

pub const STOCK_BATCH_SIZE: usize = 400;
pub const AUTOCOMPLETE_LIMIT: usize = 2000;
pub const BACKUP_APP: &str = "jardin";

pub struct BulkOperator {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    extra_collections: Vec<String>,
}

impl BulkOperator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            batch_size: STOCK_BATCH_SIZE,
            extra_collections: Vec::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_extra_collections(mut self, collections: Vec<String>) -> Self {
        self.extra_collections = collections;
        self
    }

    /// One stock document per name, stored as given. Duplicates are kept.
    /// Input cleanup belongs to the caller (see `read_catalog`).
    pub fn batch_insert_stock(&self, names: &[String]) -> Result<BatchReport, StoreError> {
        let collection = EntityKind::Stock.collection();
        let ops: Vec<BatchOp> = names
            .iter()
            .map(|name| {
                let mut fields = Fields::new();
                fields.insert("name".to_string(), Value::from(name.as_str()));
                BatchOp::Insert {
                    collection: collection.to_string(),
                    fields,
                }
            })
            .collect();
        let total = ops.len();
        let report = self.store.batch_write(ops, self.batch_size)?;
        info!(total, chunks = report.chunks_committed, "stock imported");
        Ok(report)
    }

    /// Deletes every stock document present in one snapshot read.
    pub fn batch_delete_all_stock(&self) -> Result<BatchReport, StoreError> {
        let collection = EntityKind::Stock.collection();
        let docs = self.store.fetch_once(&Query::collection(collection))?;
        let ops: Vec<BatchOp> = docs
            .into_iter()
            .map(|doc| BatchOp::Delete {
                collection: collection.to_string(),
                id: doc.id,
            })
            .collect();
        let total = ops.len();
        let report = self.store.batch_write(ops, self.batch_size)?;
        info!(total, chunks = report.chunks_committed, "stock cleared");
        Ok(report)
    }

    fn backup_collections(&self) -> Vec<String> {
        let mut out: Vec<String> = EntityKind::TRACKED
            .iter()
            .map(|kind| kind.collection().to_string())
            .collect();
        for extra in &self.extra_collections {
            if !out.contains(extra) {
                out.push(extra.clone());
            }
        }
        out
    }

    /// `{collection: [{id, ...fields}]}` for every tracked kind plus the
    /// configured extras. A collection that cannot be read exports as `[]`.
    pub fn generate_backup(&self) -> Value {
        let mut backup = Map::new();
        for collection in self.backup_collections() {
            let query = Query::collection(collection.as_str());
            let docs: Vec<Value> = match self.store.fetch_once(&query) {
                Ok(docs) => docs.iter().map(|doc| doc.to_tagged_value()).collect(),
                Err(err) => {
                    warn!(collection = %collection, error = %err, "backup read failed, exporting empty");
                    Vec::new()
                }
            };
            debug!(collection = %collection, count = docs.len(), "backup collection read");
            backup.insert(collection, Value::Array(docs));
        }
        Value::Object(backup)
    }

    pub fn write_backup(&self, dir: &Path, date: Date) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(backup_file_name(BACKUP_APP, date));
        let body =
            serde_json::to_vec_pretty(&self.generate_backup()).map_err(std::io::Error::other)?;
        std::fs::write(&path, body)?;
        info!(path = %path.display(), "backup written");
        Ok(path)
    }

    /// Refreshes `state.stock_list` with up to `AUTOCOMPLETE_LIMIT` names in
    /// name order. A failed read leaves the list empty.
    pub fn load_autocomplete(&self, state: &mut AppState) -> usize {
        let query = Query::collection(EntityKind::Stock.collection())
            .order_by("name")
            .limit(AUTOCOMPLETE_LIMIT);
        state.stock_list = match self.store.fetch_once(&query) {
            Ok(docs) => docs
                .iter()
                .map(StockItem::from_document)
                .map(|item| item.name)
                .filter(|name| !name.is_empty())
                .collect(),
            Err(err) => {
                warn!(error = %err, "stock list unavailable");
                Vec::new()
            }
        };
        state.stock_list.len()
    }
}

pub fn backup_file_name(app: &str, date: Date) -> String {
    format!("backup_{app}_{}.json", iso_date(date))
}

/// One trimmed name per non-blank line. A missing catalog is empty.
pub fn read_catalog(path: &Path) -> std::io::Result<Vec<String>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
