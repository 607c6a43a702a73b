#![forbid(unsafe_code)]

use crate::{BatchOp, BatchReport, LiveQuery, Query, StoreError};
use jd_core::{Document, Fields};

/// CRUD and live-query primitives over namespaced document collections.
///
/// Writes stamp `createdAt` / `updatedAt` (epoch ms) themselves. Every
/// committed write re-fires the live queries of the collection it touched;
/// there is no separate refresh path.
pub trait DocumentStore {
    fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Shallow merge into an existing document. `NotFound` if `id` is absent.
    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent id succeeds.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Registers a live query. The current result set is queued before this
    /// returns; query failures arrive as `LiveEvent::Failed`.
    fn subscribe(&self, collection: &str) -> Result<LiveQuery, StoreError>;

    fn fetch_once(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Commits `ops` in sequential chunks of at most `max_batch_size`, one
    /// transaction per chunk. Not atomic across chunks: on failure the error
    /// is `StoreError::PartialBatch` and earlier chunks remain committed.
    fn batch_write(
        &self,
        ops: Vec<BatchOp>,
        max_batch_size: usize,
    ) -> Result<BatchReport, StoreError>;
}
