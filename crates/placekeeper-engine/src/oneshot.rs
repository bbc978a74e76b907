//! Named one-shot timers with cancellation support.
//!
//! A timer runs its callback once after a delay. While a name is armed,
//! further requests for the same name are dropped rather than restarting the
//! delay, so a burst of signals yields a single callback. The name stays
//! armed until the callback has returned.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Upper bound on how long `clear_async` waits for each cancelled timer.
pub const STOP_WAIT_TIMEOUT_MS: u64 = 250;

/// A pending timer.
struct Pending {
    /// Cancels the sleep.
    token: CancellationToken,
    /// Task running the timer.
    handle: JoinHandle<()>,
}

/// Set of named one-shot timers. Cloning shares the set.
#[derive(Clone, Default)]
pub struct OneShot {
    /// Armed timers by name.
    entries: Arc<Mutex<HashMap<&'static str, Pending>>>,
}

impl OneShot {
    /// Create an empty timer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is armed.
    pub fn is_armed(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Arm `name` to run `f` after `delay`.
    ///
    /// Returns false, leaving the existing timer untouched, if `name` is
    /// already armed. Must be called from within a tokio runtime.
    pub fn arm<F>(&self, name: &'static str, delay: Duration, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            trace!("oneshot_coalesced" = name);
            return false;
        }

        let token = CancellationToken::new();
        let cancel = token.clone();
        let set = Arc::clone(&self.entries);
        let fut = async move {
            trace!("oneshot_armed" = name, delay_ms = delay.as_millis());
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    trace!("oneshot_cancelled" = name);
                    return;
                }
            }
            f();
            set.lock().remove(name);
            trace!("oneshot_fired" = name);
        };
        let handle = tokio::spawn(fut);
        entries.insert(name, Pending { token, handle });
        true
    }

    /// Cancel `name` if armed.
    pub fn cancel(&self, name: &str) {
        if let Some(p) = self.entries.lock().remove(name) {
            p.token.cancel();
            trace!("oneshot_stop" = name);
        }
    }

    /// Cancel every timer and wait briefly for the tasks to finish.
    pub async fn clear_async(&self) {
        let entries: Vec<Pending> = {
            let mut map = self.entries.lock();
            map.drain().map(|(_, p)| p).collect()
        };
        for p in &entries {
            p.token.cancel();
        }
        for p in entries {
            let _ = time::timeout(Duration::from_millis(STOP_WAIT_TIMEOUT_MS), p.handle).await;
        }
        trace!("oneshot_clear_async");
    }
}
