#![forbid(unsafe_code)]

pub mod bulk;
pub mod config;
pub mod identity;
pub mod lifecycle;
pub mod prefs;
pub mod session;
pub mod state;
pub mod subscriptions;

pub use bulk::BulkOperator;
pub use config::{ConfigError, SyncConfig};
pub use identity::{
    IdentityError, IdentityGateway, IdentityProvider, LocalIdentityProvider, Session,
};
pub use lifecycle::{Clock, LifecycleController, SaveError, SaveReceipt, SystemClock};
pub use prefs::{Preferences, PreferencesError};
pub use session::SessionDriver;
pub use state::AppState;
pub use subscriptions::{CollectionView, SubscriptionManager, SubscriptionState, ViewSink};
