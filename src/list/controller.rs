//! Async driver for the list view.
//!
//! Descriptor mutations are applied to [`ListState`] synchronously; the
//! fetch they trigger runs afterwards. Filter edits go through the debounce
//! timer, discrete actions (clear, sort, page) fetch immediately. Every
//! change is published on a `watch` channel for the presentation layer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::{FetchOutcome, ListSnapshot, ListState};
use crate::api::CityApi;
use crate::error::Result;
use crate::model::Column;
use crate::timer::CancellableTimer;

struct Inner {
    state: Mutex<ListState>,
    api: CityApi,
    debounce: CancellableTimer,
    debounce_delay: Duration,
    updates: watch::Sender<ListSnapshot>,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl ListController {
    pub fn new(api: CityApi, page_size: u32, debounce_delay: Duration) -> Self {
        let state = ListState::new(page_size);
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                api,
                debounce: CancellableTimer::new(),
                debounce_delay,
                updates,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.lock().snapshot()
    }

    /// Run `f` against the state and publish the result.
    fn mutate<R>(&self, f: impl FnOnce(&mut ListState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.inner.updates.send_replace(state.snapshot());
        result
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -------------------------------------------------------------------------
    // User actions
    // -------------------------------------------------------------------------

    /// Text-stream edit: re-arms the debounce so only the last edit in the
    /// idle window fetches.
    pub fn set_filter(&self, column: Column, value: impl Into<String>) {
        let value = value.into();
        debug!(column = column.as_str(), %value, "Filter edited");
        self.mutate(|s| s.set_filter(column, value));

        let this = self.clone();
        self.inner.debounce.arm(self.inner.debounce_delay, async move {
            this.refetch(false).await;
        });
    }

    pub async fn clear_filter(&self, column: Column) -> FetchOutcome {
        self.inner.debounce.cancel();
        self.mutate(|s| s.clear_filter(column));
        self.refetch(false).await
    }

    pub async fn clear_all_filters(&self) -> FetchOutcome {
        self.inner.debounce.cancel();
        self.mutate(ListState::clear_all_filters);
        self.refetch(false).await
    }

    pub async fn set_sort(&self, column: Column) -> FetchOutcome {
        // the immediate fetch already carries any pending filter text
        self.inner.debounce.cancel();
        self.mutate(|s| s.set_sort(column));
        self.refetch(false).await
    }

    /// `None` when the page is out of range (nothing fetched).
    pub async fn set_page(&self, page: u32) -> Option<FetchOutcome> {
        if !self.mutate(|s| s.set_page(page)) {
            debug!(page, "Ignoring out-of-range page");
            return None;
        }
        Some(self.refetch(false).await)
    }

    /// Fetch the current descriptor. Silent fetches do not toggle loading.
    pub async fn refetch(&self, silent: bool) -> FetchOutcome {
        let ticket = self.mutate(|s| s.begin_fetch(silent));
        debug!(seq = ticket.seq, silent, "List fetch issued");

        let result = self.inner.api.list(&ticket.query).await;

        let outcome = self.mutate(|s| s.complete_fetch(ticket.seq, result));
        match &outcome {
            FetchOutcome::Applied => debug!(seq = ticket.seq, "List page applied"),
            FetchOutcome::Failed(e) => warn!(seq = ticket.seq, error = %e, "List fetch failed"),
            FetchOutcome::Stale => {}
        }
        outcome
    }

    /// Delete then refresh. A 404 still refreshes so the stale row goes away.
    pub async fn delete(&self, id: i64) -> Result<()> {
        match self.inner.api.delete(id).await {
            Ok(()) => {
                info!(id, "City deleted");
                self.refetch(false).await;
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(id, "City already gone, refreshing list");
                self.refetch(false).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub fn has_pending_filter(&self) -> bool {
        self.inner.debounce.is_armed()
    }

    /// Cancel the debounce timer. Fetches already running complete normally.
    pub fn teardown(&self) {
        if self.inner.debounce.cancel() {
            debug!("Pending filter fetch cancelled on teardown");
        }
    }
}
