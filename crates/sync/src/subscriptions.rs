#![forbid(unsafe_code)]

//! One live query per tracked kind, re-opened as a set whenever the active
//! branch or the session changes. Snapshots are filtered and ordered
//! client-side before they reach the view sink.

use crate::config::effective_scope;
use crate::state::AppState;
use jd_core::model::BranchScope;
use jd_core::ordering::arrange;
use jd_core::{BranchTag, Document, EntityKind};
use jd_storage::{DocumentStore, LiveEvent, LiveQuery};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
    /// The live query errored; the view keeps its last render.
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionView {
    pub kind: EntityKind,
    pub branch: BranchTag,
    pub epoch: u64,
    pub documents: Vec<Document>,
}

pub trait ViewSink {
    fn render(&mut self, view: &CollectionView);

    fn subscription_failed(&mut self, kind: EntityKind, message: &str) {
        let _ = (kind, message);
    }
}

struct Slot {
    kind: EntityKind,
    state: SubscriptionState,
    query: Option<LiveQuery>,
}

pub struct SubscriptionManager {
    store: Arc<dyn DocumentStore>,
    filter_shared: bool,
    epoch: u64,
    branch: Option<BranchTag>,
    slots: Vec<Slot>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn DocumentStore>, filter_shared: bool) -> Self {
        let slots = EntityKind::TRACKED
            .iter()
            .map(|&kind| Slot {
                kind,
                state: SubscriptionState::Unsubscribed,
                query: None,
            })
            .collect();
        Self {
            store,
            filter_shared,
            epoch: 0,
            branch: None,
            slots,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn active_branch(&self) -> Option<&BranchTag> {
        self.branch.as_ref()
    }

    pub fn state(&self, kind: EntityKind) -> SubscriptionState {
        self.slots
            .iter()
            .find(|slot| slot.kind == kind)
            .map(|slot| slot.state)
            .unwrap_or(SubscriptionState::Unsubscribed)
    }

    pub fn scope_of(&self, kind: EntityKind) -> BranchScope {
        effective_scope(kind, self.filter_shared)
    }

    /// Replaces every live query with a fresh set for `state.branch`. The old
    /// set is disposed first, so its queued snapshots are never rendered.
    /// Without a session this only tears down. Returns the number of kinds
    /// now subscribed.
    pub fn start(&mut self, state: &AppState) -> usize {
        self.stop();
        if !state.is_signed_in() {
            debug!("no session, live queries stay closed");
            return 0;
        }

        self.epoch += 1;
        self.branch = Some(state.branch.clone());
        let mut opened = 0usize;
        for slot in &mut self.slots {
            match self.store.subscribe(slot.kind.collection()) {
                Ok(query) => {
                    slot.query = Some(query);
                    slot.state = SubscriptionState::Subscribed;
                    opened += 1;
                }
                Err(err) => {
                    warn!(kind = ?slot.kind, error = %err, "live query could not be opened");
                    slot.state = SubscriptionState::Failed;
                }
            }
        }
        info!(branch = state.branch.as_str(), epoch = self.epoch, opened, "live queries started");
        opened
    }

    /// Disposes every live query. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let mut closed = 0usize;
        for slot in &mut self.slots {
            if slot.query.take().is_some() {
                closed += 1;
            }
            slot.state = SubscriptionState::Unsubscribed;
        }
        if closed > 0 {
            debug!(closed, epoch = self.epoch, "live queries stopped");
        }
        self.branch = None;
    }

    /// Delivers the newest pending snapshot of each kind to `sink`. Returns
    /// the number of renders.
    pub fn pump(&mut self, sink: &mut dyn ViewSink) -> usize {
        let Some(branch) = self.branch.clone() else {
            return 0;
        };
        let mut rendered = 0usize;
        for slot in &mut self.slots {
            let Some(event) = slot.query.as_ref().and_then(LiveQuery::latest) else {
                continue;
            };
            match event {
                LiveEvent::Snapshot(docs) => {
                    let scope = effective_scope(slot.kind, self.filter_shared);
                    let view = CollectionView {
                        kind: slot.kind,
                        branch: branch.clone(),
                        epoch: self.epoch,
                        documents: arrange(slot.kind, scope, &branch, docs),
                    };
                    sink.render(&view);
                    rendered += 1;
                }
                LiveEvent::Failed(message) => {
                    warn!(kind = ?slot.kind, error = %message, "live query failed");
                    slot.query = None;
                    slot.state = SubscriptionState::Failed;
                    sink.subscription_failed(slot.kind, &message);
                }
            }
        }
        rendered
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.stop();
    }
}
