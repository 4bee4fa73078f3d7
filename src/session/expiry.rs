//! Deferred, cancelable session expiry.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
#[cfg(test)]
use tokio::task::AbortHandle;
use tokio::task::JoinHandle;

/// Default idle window after which an untouched session is evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on how late an eviction may run past the idle window at the
/// default timeout.
pub const EVICTION_SLACK: Duration = Duration::from_secs(2);

/// Which operations restart a session's idle window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Only `update_session_data` restarts the window; reads are side-effect free.
    #[default]
    OnUpdate,
    /// Successful reads restart the window as well.
    Sliding,
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnUpdate => f.write_str("on_update"),
            Self::Sliding => f.write_str("sliding"),
        }
    }
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_update" | "on-update" | "update" => Ok(Self::OnUpdate),
            "sliding" => Ok(Self::Sliding),
            other => Err(other.to_string()),
        }
    }
}

/// Owned handle to a pending eviction.
///
/// The eviction runs on a tokio task that sleeps for the idle window and
/// then invokes its callback. Dropping the handle aborts the task if it has
/// not fired yet. A task that already woke up cannot be recalled, so every
/// callback carries the `generation` it was armed with and the store
/// ignores fires whose generation is no longer current.
pub(crate) struct ExpiryHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl ExpiryHandle {
    /// Arm a new expiry on `runtime` that calls `on_expire` after `timeout`.
    pub(crate) fn schedule<F>(
        runtime: &Handle,
        generation: u64,
        timeout: Duration,
        on_expire: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            on_expire();
        });

        Self { generation, task }
    }

    /// Generation number this handle was armed with.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the expiry task has completed or been aborted.
    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Handle that observes the task after this one is dropped.
    #[cfg(test)]
    pub(crate) fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }
}

impl Drop for ExpiryHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl fmt::Debug for ExpiryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryHandle")
            .field("generation", &self.generation)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn flag() -> (Arc<AtomicBool>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&fired);
        (fired, move || setter.store(true, Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_timeout() {
        let (fired, on_expire) = flag();
        let handle =
            ExpiryHandle::schedule(&Handle::current(), 1, Duration::from_secs(5), on_expire);

        sleep(Duration::from_millis(4_900)).await;
        assert!(!fired.load(Ordering::SeqCst));

        sleep(Duration::from_millis(200)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_prevents_fire() {
        let (fired, on_expire) = flag();
        let handle =
            ExpiryHandle::schedule(&Handle::current(), 7, Duration::from_secs(1), on_expire);
        assert_eq!(handle.generation(), 7);
        let task = handle.abort_handle();

        drop(handle);
        sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
        assert!(task.is_finished());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("sliding".parse::<ExpiryPolicy>().unwrap(), ExpiryPolicy::Sliding);
        assert_eq!("on_update".parse::<ExpiryPolicy>().unwrap(), ExpiryPolicy::OnUpdate);
        assert_eq!("On-Update".parse::<ExpiryPolicy>().unwrap(), ExpiryPolicy::OnUpdate);
        assert!("forever".parse::<ExpiryPolicy>().is_err());
    }

    #[test]
    fn test_policy_default_and_display() {
        assert_eq!(ExpiryPolicy::default(), ExpiryPolicy::OnUpdate);
        assert_eq!(ExpiryPolicy::Sliding.to_string(), "sliding");
        assert_eq!(
            serde_json::to_string(&ExpiryPolicy::OnUpdate).unwrap(),
            "\"on_update\""
        );
    }
}
