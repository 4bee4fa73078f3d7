//! Session management module.
//!
//! This module provides the session identifier and its providers, the
//! session record, the cancelable expiry that evicts idle records, and the
//! store that ties them together.

mod expiry;
mod id;
mod record;
mod store;

pub(crate) use expiry::ExpiryHandle;
pub use expiry::{ExpiryPolicy, DEFAULT_IDLE_TIMEOUT, EVICTION_SLACK};
pub use id::{CounterIdProvider, IdError, IdProvider, RandomIdProvider, SessionId};
pub(crate) use record::Session;
pub use record::SessionData;
pub use store::{SessionStore, SessionStoreBuilder, StoreConfig};
