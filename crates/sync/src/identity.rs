#![forbid(unsafe_code)]

//! Session acquisition. Sign-in failures never propagate: they are logged
//! and the dashboard stays signed out until the next attempt.

use sha2::Digest as _;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub anonymous: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityError {
    Offline,
    InvalidToken,
    Provider(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "identity provider unreachable"),
            Self::InvalidToken => write!(f, "invalid sign-in token"),
            Self::Provider(message) => write!(f, "identity provider: {message}"),
        }
    }
}

impl std::error::Error for IdentityError {}

pub trait IdentityProvider {
    fn sign_in_anonymously(&self) -> Result<Session, IdentityError>;
    fn sign_in_with_token(&self, token: &str) -> Result<Session, IdentityError>;
}

/// In-process provider. Token identities are stable per token.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider {
    offline: AtomicBool,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), IdentityError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdentityError::Offline);
        }
        Ok(())
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in_anonymously(&self) -> Result<Session, IdentityError> {
        self.ensure_online()?;
        Ok(Session {
            uid: format!("anon-{}", Uuid::new_v4().simple()),
            anonymous: true,
        })
    }

    fn sign_in_with_token(&self, token: &str) -> Result<Session, IdentityError> {
        self.ensure_online()?;
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }
        Ok(Session {
            uid: format!("tok-{}", token_fingerprint(token)),
            anonymous: false,
        })
    }
}

/// First 16 hex chars of SHA-256(token).
fn token_fingerprint(token: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

pub type SessionCallback = Box<dyn FnMut(Option<&Session>)>;

pub struct IdentityGateway<P: IdentityProvider> {
    provider: P,
    current: Option<Session>,
    on_change: Option<SessionCallback>,
}

impl<P: IdentityProvider> IdentityGateway<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            current: None,
            on_change: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Registers the session observer and reports the current state once.
    pub fn init(&mut self, on_change: impl FnMut(Option<&Session>) + 'static) {
        let mut callback: SessionCallback = Box::new(on_change);
        callback(self.current.as_ref());
        self.on_change = Some(callback);
    }

    /// Token sign-in when `token` is given, anonymous otherwise.
    pub fn sign_in(&mut self, token: Option<&str>) -> Option<&Session> {
        let attempt = match token {
            Some(token) => self.provider.sign_in_with_token(token),
            None => self.provider.sign_in_anonymously(),
        };
        match attempt {
            Ok(session) => self.transition(Some(session)),
            Err(err) => warn!(error = %err, with_token = token.is_some(), "sign-in failed"),
        }
        self.current.as_ref()
    }

    pub fn sign_out(&mut self) {
        self.transition(None);
    }

    /// Session pushed by the provider (expiry, remote sign-out).
    pub fn observe(&mut self, session: Option<Session>) {
        self.transition(session);
    }

    fn transition(&mut self, next: Option<Session>) {
        if self.current == next {
            return;
        }
        self.current = next;
        match &self.current {
            Some(session) => {
                info!(uid = %session.uid, anonymous = session.anonymous, "session established")
            }
            None => info!("session ended"),
        }
        if let Some(callback) = self.on_change.as_mut() {
            callback(self.current.as_ref());
        }
    }
}
