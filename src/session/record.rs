//! Session records.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{ExpiryHandle, SessionId};

/// Opaque session payload. The store never inspects its contents.
pub type SessionData = HashMap<String, serde_json::Value>;

/// A live session held by the store.
#[derive(Debug)]
pub(crate) struct Session {
    id: SessionId,
    data: SessionData,
    expiry: ExpiryHandle,
    last_update: Instant,
}

impl Session {
    /// Create an empty session guarded by the given expiry.
    pub(crate) fn new(id: SessionId, expiry: ExpiryHandle) -> Self {
        Self {
            id,
            data: SessionData::new(),
            expiry,
            last_update: Instant::now(),
        }
    }

    /// Session identifier.
    pub(crate) fn id(&self) -> &SessionId {
        &self.id
    }

    /// Current payload.
    pub(crate) fn data(&self) -> &SessionData {
        &self.data
    }

    /// Timer generation currently trusted by this record.
    pub(crate) fn generation(&self) -> u64 {
        self.expiry.generation()
    }

    /// Time elapsed since the last update (or sliding read).
    pub(crate) fn idle_duration(&self) -> Duration {
        self.last_update.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn expiry(&self) -> &ExpiryHandle {
        &self.expiry
    }

    /// Overwrite the payload.
    pub(crate) fn replace_data(&mut self, data: SessionData) {
        self.data = data;
    }

    /// Swap in a freshly armed expiry; the previous one is aborted on drop.
    pub(crate) fn rearm(&mut self, expiry: ExpiryHandle) {
        self.expiry = expiry;
        self.last_update = Instant::now();
    }
}
