//! Re-armable cancellable timer.
//!
//! `arm` aborts whatever is pending and schedules the new action, so only
//! the last arm within the idle window ever fires. Used for filter debounce.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Default)]
pub struct CancellableTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the pending action (if any) and schedule `action` after `delay`.
    ///
    /// Once the delay elapses the action runs on its own task; cancelling the
    /// timer after that point does not interrupt it.
    pub fn arm<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
            trace!("Re-armed timer, previous action cancelled");
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        }));
    }

    /// Cancel the pending action. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        // A poisoned slot still holds a valid handle
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }
}
