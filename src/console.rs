//! List view wiring.
//!
//! Mounting connects the realtime channel, subscribes one handler to every
//! mutation event (each event triggers a silent refetch) and loads the first
//! page. If the channel gives up reconnecting the view falls back to silent
//! polling. Unmounting undoes all of it: listeners removed, debounce
//! cancelled, poller stopped, socket closed.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::CityApi;
use crate::config::ConsoleConfig;
use crate::form::{EntityForm, FormOutcome};
use crate::list::{FetchOutcome, ListController};
use crate::realtime::{ChannelStatus, EventKind, Listener, RealtimeChannel, RealtimeEvent};

pub struct CityConsole {
    api: CityApi,
    list: ListController,
    channel: Arc<RealtimeChannel>,
    listener: Listener,
    watcher: Option<JoinHandle<()>>,
}

impl CityConsole {
    /// Wire the list to the channel and fetch the first page.
    pub async fn mount(api: CityApi, channel: Arc<RealtimeChannel>, config: &ConsoleConfig) -> Self {
        let list = ListController::new(api.clone(), config.page_size, config.filter_debounce);

        let listener: Listener = {
            let list = list.clone();
            Arc::new(move |event: &RealtimeEvent| {
                debug!(kind = %event.kind, "Server mutation, refreshing list");
                let list = list.clone();
                tokio::spawn(async move {
                    list.refetch(true).await;
                });
            })
        };
        for kind in EventKind::ALL {
            channel.add_listener(kind, listener.clone());
        }
        channel.connect();

        let watcher = tokio::spawn(poll_when_exhausted(
            list.clone(),
            channel.subscribe_status(),
            config.poll_interval,
        ));

        info!("City console mounted");
        list.refetch(false).await;

        Self {
            api,
            list,
            channel,
            listener,
            watcher: Some(watcher),
        }
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn api(&self) -> &CityApi {
        &self.api
    }

    pub fn channel(&self) -> &Arc<RealtimeChannel> {
        &self.channel
    }

    /// Refresh after the form saved an entity.
    pub async fn after_save(&self) -> FetchOutcome {
        self.list.refetch(false).await
    }

    /// Submit the form. The list is refreshed when the server accepted it,
    /// and also when the edited entity turned out to be gone (404) so the
    /// stale row drops out.
    pub async fn submit_form(&self, form: &mut EntityForm) -> FormOutcome {
        let outcome = form.submit(&self.api).await;
        match &outcome {
            FormOutcome::Saved => {
                self.after_save().await;
            }
            FormOutcome::Failed(e) if e.is_not_found() => {
                debug!("Edited city no longer exists, refreshing list");
                self.after_save().await;
            }
            _ => {}
        }
        outcome
    }

    /// Tear everything down. Safe to call more than once.
    pub async fn unmount(&mut self) {
        for kind in EventKind::ALL {
            self.channel.remove_listener(kind, &self.listener);
        }
        self.list.teardown();
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.channel.disconnect().await;
        info!("City console unmounted");
    }
}

impl Drop for CityConsole {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.list.teardown();
    }
}

/// Silent refetch every `interval` for as long as the channel reports
/// `Exhausted`.
async fn poll_when_exhausted(
    list: ListController,
    mut status: watch::Receiver<ChannelStatus>,
    interval: Duration,
) {
    loop {
        let exhausted = *status.borrow_and_update() == ChannelStatus::Exhausted;
        if !exhausted {
            if status.changed().await.is_err() {
                return;
            }
            continue;
        }

        warn!(
            interval_ms = interval.as_millis() as u64,
            "Realtime updates unavailable, polling instead"
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                changed = status.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                _ = ticker.tick() => {
                    list.refetch(true).await;
                }
            }
        }
        debug!("Polling stopped");
    }
}
