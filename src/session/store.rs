//! Session storage with idle-timeout eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::{
    ExpiryHandle, ExpiryPolicy, IdProvider, RandomIdProvider, Session, SessionData, SessionId,
    DEFAULT_IDLE_TIMEOUT,
};
use crate::error::SessionError;
use crate::Result;

/// Configuration for a session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Idle window after which a session is evicted.
    pub idle_timeout: Duration,
    /// Which operations restart the idle window.
    pub policy: ExpiryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            policy: ExpiryPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Set the idle window.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Set the expiry policy.
    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

struct Inner {
    sessions: RwLock<HashMap<SessionId, Session>>,
    config: StoreConfig,
    ids: Box<dyn IdProvider>,
    runtime: Handle,
    generation: AtomicU64,
}

impl Inner {
    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SessionId, Session>>> {
        self.sessions.read().map_err(|_| SessionError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionId, Session>>> {
        self.sessions.write().map_err(|_| SessionError::LockPoisoned)
    }

    /// Remove `id` if it is still guarded by the timer of `generation`.
    ///
    /// Returns whether a session was removed. Fires for sessions that were
    /// re-armed, already evicted, or never existed are no-ops.
    fn evict(&self, id: &str, generation: u64) -> bool {
        let removed = {
            let mut sessions = match self.sessions.write() {
                Ok(sessions) => sessions,
                Err(_) => {
                    warn!(session_id = id, "lock poisoned, skipping eviction");
                    return false;
                }
            };

            if sessions.get(id).map(Session::generation) == Some(generation) {
                sessions.remove(id)
            } else {
                None
            }
        };

        match removed {
            Some(session) => {
                debug!(
                    session_id = id,
                    idle = ?session.idle_duration(),
                    "evicted idle session"
                );
                true
            }
            None => {
                trace!(session_id = id, generation, "stale expiry ignored");
                false
            }
        }
    }
}

/// Builder for [`SessionStore`].
pub struct SessionStoreBuilder {
    config: StoreConfig,
    ids: Option<Box<dyn IdProvider>>,
    runtime: Option<Handle>,
}

impl SessionStoreBuilder {
    /// Use a custom ID provider instead of [`RandomIdProvider`].
    pub fn id_provider<P: IdProvider>(mut self, provider: P) -> Self {
        self.ids = Some(Box::new(provider));
        self
    }

    /// Schedule expiry timers on `runtime` instead of the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the store.
    ///
    /// Fails with [`SessionError::NoRuntime`] if no runtime was given and the
    /// caller is not inside a tokio runtime.
    pub fn build(self) -> Result<SessionStore> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| SessionError::NoRuntime)?,
        };

        Ok(SessionStore {
            inner: Arc::new(Inner {
                sessions: RwLock::new(HashMap::new()),
                config: self.config,
                ids: self.ids.unwrap_or_else(|| Box::new(RandomIdProvider)),
                runtime,
                generation: AtomicU64::new(1),
            }),
        })
    }
}

/// Thread-safe session registry that evicts sessions after an idle window.
///
/// Cloning is cheap; clones share the same sessions. Each session owns one
/// expiry task on the tokio runtime. When the last clone is dropped, all
/// pending expiries are aborted.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create a store that schedules expiries on the current tokio runtime.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create a store that schedules expiries on the given runtime.
    ///
    /// The store can then be used from threads outside the runtime.
    pub fn with_runtime(config: StoreConfig, runtime: Handle) -> Result<Self> {
        Self::builder(config).runtime(runtime).build()
    }

    /// Start building a store.
    pub fn builder(config: StoreConfig) -> SessionStoreBuilder {
        SessionStoreBuilder {
            config,
            ids: None,
            runtime: None,
        }
    }

    /// Create a new empty session and arm its expiry.
    ///
    /// Returns the newly assigned session ID.
    pub fn create_session(&self) -> Result<SessionId> {
        let id = self.inner.ids.next_id()?;

        let mut sessions = self.inner.write()?;
        if sessions.contains_key(&id) {
            return Err(SessionError::SessionExists(id.into_inner()));
        }
        let expiry = self.arm(&id);
        sessions.insert(id.clone(), Session::new(id.clone(), expiry));
        drop(sessions);

        debug!(session_id = %id, "created session");
        Ok(id)
    }

    /// Get a snapshot of the session's data.
    ///
    /// Under [`ExpiryPolicy::OnUpdate`] this does not extend the session's
    /// life. Under [`ExpiryPolicy::Sliding`] it restarts the idle window.
    pub fn get_session_data(&self, id: impl AsRef<str>) -> Result<SessionData> {
        let id = id.as_ref();

        match self.inner.config.policy {
            ExpiryPolicy::OnUpdate => {
                let sessions = self.inner.read()?;
                sessions
                    .get(id)
                    .map(|session| session.data().clone())
                    .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))
            }
            ExpiryPolicy::Sliding => {
                let mut sessions = self.inner.write()?;
                let session = sessions
                    .get_mut(id)
                    .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))?;
                let expiry = self.arm(session.id());
                session.rearm(expiry);
                Ok(session.data().clone())
            }
        }
    }

    /// Overwrite the session's data and restart its idle window.
    pub fn update_session_data(&self, id: impl AsRef<str>, data: SessionData) -> Result<()> {
        let id = id.as_ref();

        let mut sessions = self.inner.write()?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))?;

        session.replace_data(data);
        let expiry = self.arm(session.id());
        session.rearm(expiry);
        drop(sessions);

        trace!(session_id = id, "updated session");
        Ok(())
    }

    /// Check if a session exists.
    pub fn contains(&self, id: impl AsRef<str>) -> Result<bool> {
        let sessions = self.inner.read()?;
        Ok(sessions.contains_key(id.as_ref()))
    }

    /// Get the number of live sessions.
    pub fn count(&self) -> usize {
        self.inner.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// List all live session IDs.
    pub fn list_ids(&self) -> Result<Vec<SessionId>> {
        let sessions = self.inner.read()?;
        Ok(sessions.keys().cloned().collect())
    }

    /// Configured idle window.
    pub fn idle_timeout(&self) -> Duration {
        self.inner.config.idle_timeout
    }

    /// Configured expiry policy.
    pub fn policy(&self) -> ExpiryPolicy {
        self.inner.config.policy
    }

    /// Arm a fresh expiry for `id` with a new generation.
    ///
    /// Must be called with the write lock held so the handle is installed
    /// before the timer can observe the map.
    fn arm(&self, id: &SessionId) -> ExpiryHandle {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let store: Weak<Inner> = Arc::downgrade(&self.inner);
        let id = id.clone();

        ExpiryHandle::schedule(
            &self.inner.runtime,
            generation,
            self.inner.config.idle_timeout,
            move || {
                if let Some(inner) = store.upgrade() {
                    inner.evict(id.as_str(), generation);
                }
            },
        )
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.inner.config)
            .field("sessions", &self.count())
            .finish()
    }
}
