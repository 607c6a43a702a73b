#![forbid(unsafe_code)]

//! Entity writes. Drafts are validated before anything reaches the store;
//! store failures are reported once and never retried.

use crate::state::AppState;
use jd_core::document::FIELD_BRANCH;
use jd_core::drafts::{DeliveryDraft, NoteDraft, OrderDraft, ProcedureDraft, ScriptDraft, TaskDraft};
use jd_core::model::{Cycle, DeliveryStatus, TaskStatus};
use jd_core::{Draft, DraftWarning, EntityKind, Fields, ValidationError};
use jd_storage::{DocumentStore, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        jd_core::day::now_ms()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReceipt {
    pub id: String,
    pub created: bool,
    pub warnings: Vec<DraftWarning>,
}

#[derive(Debug)]
pub enum SaveError {
    Validation(ValidationError),
    NotFound { collection: String, id: String },
    Write(StoreError),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::NotFound { collection, id } => write!(f, "{collection}/{id} no longer exists"),
            Self::Write(err) => write!(f, "write failed: {err}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for SaveError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for SaveError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => Self::NotFound { collection, id },
            other => Self::Write(other),
        }
    }
}

pub struct LifecycleController {
    store: Arc<dyn DocumentStore>,
    clock: Box<dyn Clock>,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates when `existing_id` is empty, otherwise merges the draft's
    /// fields into the existing document. Updates never touch `status`,
    /// `branch` or `createdBy`.
    pub fn save<D: Draft>(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &D,
    ) -> Result<SaveReceipt, SaveError> {
        let kind = D::KIND;
        let collection = kind.collection();
        let mut fields = draft.to_fields()?;
        let warnings = draft.warnings();
        for warning in &warnings {
            warn!(kind = ?kind, warning = warning.message(), "saved with warning");
        }

        let existing_id = existing_id.map(str::trim).filter(|id| !id.is_empty());
        let receipt = match existing_id {
            Some(id) => {
                self.store.update(collection, id, fields).map_err(|err| {
                    warn!(collection, id, error = %err, "update failed");
                    SaveError::from(err)
                })?;
                info!(collection, id, "document updated");
                SaveReceipt {
                    id: id.to_string(),
                    created: false,
                    warnings,
                }
            }
            None => {
                apply_create_defaults(kind, state, &mut fields);
                let id = self.store.add(collection, fields).map_err(|err| {
                    warn!(collection, error = %err, "create failed");
                    SaveError::from(err)
                })?;
                info!(collection, id = %id, branch = state.branch.as_str(), "document created");
                SaveReceipt {
                    id,
                    created: true,
                    warnings,
                }
            }
        };
        Ok(receipt)
    }

    pub fn save_task(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &TaskDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    pub fn save_order(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &OrderDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    pub fn save_delivery(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &DeliveryDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    pub fn save_note(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &NoteDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    pub fn save_procedure(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &ProcedureDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    pub fn save_script(
        &self,
        state: &AppState,
        existing_id: Option<&str>,
        draft: &ScriptDraft,
    ) -> Result<SaveReceipt, SaveError> {
        self.save(state, existing_id, draft)
    }

    /// Writes `status`. Completing a recurring task also records `lastDone`;
    /// its `status` field is still written and keeps whatever value it gets.
    pub fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        cycle: &Cycle,
    ) -> Result<(), SaveError> {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), Value::from(status.as_str()));
        if status == TaskStatus::Done && cycle.is_recurring() {
            fields.insert("lastDone".to_string(), Value::from(self.clock.now_ms()));
        }
        self.write_status(EntityKind::Task, id, fields)
    }

    pub fn set_delivery_status(&self, id: &str, status: DeliveryStatus) -> Result<(), SaveError> {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), Value::from(status.as_str()));
        self.write_status(EntityKind::Delivery, id, fields)
    }

    /// Permanent and idempotent.
    pub fn delete(&self, kind: EntityKind, id: &str) -> Result<(), SaveError> {
        let collection = kind.collection();
        self.store.delete(collection, id).map_err(|err| {
            warn!(collection, id, error = %err, "delete failed");
            SaveError::from(err)
        })?;
        info!(collection, id, "document deleted");
        Ok(())
    }

    fn write_status(&self, kind: EntityKind, id: &str, fields: Fields) -> Result<(), SaveError> {
        let collection = kind.collection();
        self.store.update(collection, id, fields).map_err(|err| {
            warn!(collection, id, error = %err, "status update failed");
            SaveError::from(err)
        })
    }
}

fn apply_create_defaults(kind: EntityKind, state: &AppState, fields: &mut Fields) {
    match kind {
        EntityKind::Task => {
            fields.insert("status".to_string(), Value::from(TaskStatus::Pending.as_str()));
            fields.insert("createdBy".to_string(), Value::from(state.username.as_str()));
        }
        EntityKind::Order => {
            fields.insert("status".to_string(), Value::from("pending"));
        }
        EntityKind::Delivery => {
            fields.insert("status".to_string(), Value::from(DeliveryStatus::Pending.as_str()));
        }
        EntityKind::Note | EntityKind::Procedure | EntityKind::Script | EntityKind::Stock => {}
    }
    if kind.carries_branch() {
        fields.insert(FIELD_BRANCH.to_string(), Value::from(state.branch.as_str()));
    }
}
