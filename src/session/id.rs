//! Session identifiers and the providers that mint them.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};

/// Global counter for [`CounterIdProvider`].
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Number of random bytes behind a [`RandomIdProvider`] token.
const RANDOM_ID_BYTES: usize = 32;

/// Opaque, immutable identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Borrow the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the ID and return the underlying token.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::new("session id must not be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Failure reported by an [`IdProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct IdError(String);

impl IdError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Source of fresh session identifiers.
///
/// Implementations must never hand out the same token twice during the
/// lifetime of a store. The store does not retry on failure.
pub trait IdProvider: Send + Sync + 'static {
    /// Produce a new, unique identifier.
    fn next_id(&self) -> Result<SessionId, IdError>;
}

impl<F> IdProvider for F
where
    F: Fn() -> Result<SessionId, IdError> + Send + Sync + 'static,
{
    fn next_id(&self) -> Result<SessionId, IdError> {
        self()
    }
}

/// Random tokens drawn from the operating system's entropy source.
///
/// Tokens are 32 random bytes, base64 URL-safe encoded without padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdProvider;

impl IdProvider for RandomIdProvider {
    fn next_id(&self) -> Result<SessionId, IdError> {
        let mut bytes = [0u8; RANDOM_ID_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IdError::new(format!("os entropy source failed: {e}")))?;
        Ok(SessionId(URL_SAFE_NO_PAD.encode(bytes)))
    }
}

/// Sequential tokens formatted as `sess-XXXXXXXX` (hexadecimal).
///
/// Backed by a process-wide counter, so two providers never collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterIdProvider;

impl IdProvider for CounterIdProvider {
    fn next_id(&self) -> Result<SessionId, IdError> {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(SessionId(format!("sess-{:08x}", n)))
    }
}
