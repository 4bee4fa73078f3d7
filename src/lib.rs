//! # session-cleaner
//!
//! Concurrent in-memory session store with idle-timeout eviction.
//!
//! Sessions hold an opaque key/value payload. Every session owns a
//! cancelable expiry task; a session that is not updated within the idle
//! window is removed from the store by that task. Updates restart the
//! window, and an expiry that was superseded by an update is ignored.
//!
//! ## Features
//!
//! - **Concurrent access**: one `RwLock` guards the session map; reads share it
//! - **Per-session expiry**: independent tokio timer per session, no global sweep
//! - **Pluggable IDs**: OS-random tokens by default, or any [`IdProvider`]
//! - **Expiry policy**: side-effect-free reads by default, sliding on request
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use session_cleaner::{SessionData, SessionStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> session_cleaner::Result<()> {
//!     // Initialize logging
//!     session_cleaner::logging::try_init().ok();
//!
//!     let config = StoreConfig::default().with_idle_timeout(Duration::from_secs(5));
//!     let store = SessionStore::new(config)?;
//!
//!     let id = store.create_session()?;
//!
//!     let mut data = SessionData::new();
//!     data.insert("website".into(), "longhoang.de".into());
//!     store.update_session_data(&id, data)?;
//!
//!     println!("{:?}", store.get_session_data(&id)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use session::{
    CounterIdProvider, ExpiryPolicy, IdError, IdProvider, RandomIdProvider, SessionData,
    SessionId, SessionStore, SessionStoreBuilder, StoreConfig,
};
