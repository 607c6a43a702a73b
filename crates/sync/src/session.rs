#![forbid(unsafe_code)]

//! Ties the identity gateway to the live queries. A new session reopens
//! every subscription and reloads the stock list; losing the session tears
//! everything down and signs in again.

use crate::bulk::BulkOperator;
use crate::identity::{IdentityGateway, IdentityProvider, Session};
use crate::state::AppState;
use crate::subscriptions::{SubscriptionManager, ViewSink};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info};

type Pending = Rc<RefCell<VecDeque<Option<Session>>>>;

pub struct SessionDriver<P: IdentityProvider> {
    gateway: IdentityGateway<P>,
    pending: Pending,
    manager: SubscriptionManager,
    bulk: BulkOperator,
    token: Option<String>,
}

impl<P: IdentityProvider> SessionDriver<P> {
    pub fn new(
        provider: P,
        manager: SubscriptionManager,
        bulk: BulkOperator,
        token: Option<String>,
    ) -> Self {
        let pending: Pending = Rc::default();
        let mut gateway = IdentityGateway::new(provider);
        let queue = Rc::clone(&pending);
        gateway.init(move |session| queue.borrow_mut().push_back(session.cloned()));
        Self {
            gateway,
            pending,
            manager,
            bulk,
            token,
        }
    }

    pub fn provider(&self) -> &P {
        self.gateway.provider()
    }

    pub fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    pub fn session(&self) -> Option<&Session> {
        self.gateway.current()
    }

    /// Applies the signed-out state reported at registration, which signs
    /// in. Returns whether a session is active afterwards.
    pub fn start(&mut self, state: &mut AppState) -> bool {
        self.settle(state);
        state.is_signed_in()
    }

    /// Another sign-in attempt after an earlier one failed. No-op while a
    /// session is active.
    pub fn retry(&mut self, state: &mut AppState) -> bool {
        if self.gateway.current().is_none() {
            self.gateway.sign_in(self.token.as_deref());
            self.settle(state);
        }
        state.is_signed_in()
    }

    /// Session change pushed by the provider (expiry, remote sign-out).
    pub fn observe(&mut self, state: &mut AppState, session: Option<Session>) {
        self.gateway.observe(session);
        self.settle(state);
    }

    /// Reopens the live queries for `state.branch` under the current session.
    pub fn restart(&mut self, state: &AppState) -> usize {
        self.manager.start(state)
    }

    pub fn pump(&mut self, sink: &mut dyn ViewSink) -> usize {
        self.manager.pump(sink)
    }

    fn settle(&mut self, state: &mut AppState) {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(change) = next else {
                break;
            };
            match change {
                Some(session) => {
                    info!(uid = %session.uid, "session ready, opening live queries");
                    state.session = Some(session);
                    self.manager.start(state);
                    self.bulk.load_autocomplete(state);
                }
                None => {
                    state.session = None;
                    state.stock_list.clear();
                    self.manager.stop();
                    debug!("signed out, attempting sign-in");
                    self.gateway.sign_in(self.token.as_deref());
                }
            }
        }
    }
}
