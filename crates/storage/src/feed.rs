#![forbid(unsafe_code)]

//! Live-query registry. Every subscriber owns an unbounded channel that
//! receives the full result set of its collection after each committed write.

use crate::StoreError;
use crossbeam::channel::{Receiver, Sender, TryRecvError, unbounded};
use jd_core::Document;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    Snapshot(Vec<Document>),
    /// The query could not be evaluated; no further events follow.
    Failed(String),
}

#[derive(Clone, Default)]
pub(crate) struct ChangeFeed {
    inner: Arc<Mutex<FeedState>>,
}

#[derive(Default)]
struct FeedState {
    next_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

struct Subscriber {
    collection: String,
    sender: Sender<LiveEvent>,
}

impl ChangeFeed {
    pub(crate) fn register(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        let mut state = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let (sender, receiver) = unbounded();
        let id = state.next_id;
        state.next_id = state.next_id.saturating_add(1);
        state.subscribers.insert(
            id,
            Subscriber {
                collection: collection.to_string(),
                sender,
            },
        );
        Ok(LiveQuery {
            id,
            collection: collection.to_string(),
            receiver,
            feed: Arc::downgrade(&self.inner),
        })
    }

    pub(crate) fn has_subscribers(&self, collection: &str) -> bool {
        let Ok(state) = self.inner.lock() else {
            return false;
        };
        state
            .subscribers
            .values()
            .any(|subscriber| subscriber.collection == collection)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .map(|state| state.subscribers.len())
            .unwrap_or(0)
    }

    /// Sends to one subscriber (the initial snapshot).
    pub(crate) fn send_to(&self, id: u64, event: LiveEvent) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        let failed = matches!(event, LiveEvent::Failed(_));
        let delivered = state
            .subscribers
            .get(&id)
            .is_some_and(|subscriber| subscriber.sender.send(event).is_ok());
        if failed || !delivered {
            state.subscribers.remove(&id);
        }
    }

    /// Sends to every subscriber of `collection`. Disconnected subscribers are
    /// dropped; a failure ends every subscription it was sent to.
    pub(crate) fn publish(&self, collection: &str, event: LiveEvent) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        let failed = matches!(event, LiveEvent::Failed(_));
        let mut dropped = Vec::new();
        for (id, subscriber) in &state.subscribers {
            if subscriber.collection != collection {
                continue;
            }
            if subscriber.sender.send(event.clone()).is_err() || failed {
                dropped.push(*id);
            }
        }
        for id in dropped {
            state.subscribers.remove(&id);
        }
    }
}

/// Handle to one live query. Dropping it (or calling `dispose`) deregisters
/// the subscriber; events already queued are discarded with the receiver.
pub struct LiveQuery {
    id: u64,
    collection: String,
    receiver: Receiver<LiveEvent>,
    feed: Weak<Mutex<FeedState>>,
}

impl LiveQuery {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn try_next(&self) -> Option<LiveEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains the queue and returns the newest event. Snapshots are full
    /// result sets, so older ones carry nothing the newest lacks.
    pub fn latest(&self) -> Option<LiveEvent> {
        let mut last = None;
        while let Some(event) = self.try_next() {
            last = Some(event);
        }
        last
    }

    pub fn dispose(self) {}
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        let Some(inner) = self.feed.upgrade() else {
            return;
        };
        if let Ok(mut state) = inner.lock() {
            state.subscribers.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("id", &self.id)
            .field("collection", &self.collection)
            .finish()
    }
}
