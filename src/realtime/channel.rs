//! Realtime Channel
//!
//! Owns one push connection for the lifetime of the list view:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected (retry)
//!                                               |
//!                                               +-> Exhausted (budget spent)
//! ```
//!
//! On close the channel schedules a reconnect after `base * 2^attempt`
//! (capped) while `attempt < max_attempts`; a successful connect resets the
//! counter. `disconnect()` cancels any pending reconnect and closes the
//! socket with a normal closure. Malformed frames are logged and dropped.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::{parse_message, EventKind};
use super::listeners::{Listener, ListenerRegistry};
use super::policy::ReconnectPolicy;
use super::socket::SocketConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before reconnect attempt number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect budget spent; no further automatic attempts.
    Exhausted,
    /// Torn down by `disconnect()`.
    Closed,
}

struct Shared {
    url: String,
    connector: Arc<dyn SocketConnector>,
    policy: ReconnectPolicy,
    listeners: Mutex<ListenerRegistry>,
    status: watch::Sender<ChannelStatus>,
    attempts: AtomicU32,
}

struct Running {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Explicitly owned push channel; construct once per application root.
pub struct RealtimeChannel {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

impl RealtimeChannel {
    pub fn new(
        url: impl Into<String>,
        connector: Arc<dyn SocketConnector>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (status, _) = watch::channel(ChannelStatus::Disconnected);
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                connector,
                policy,
                listeners: Mutex::new(ListenerRegistry::new()),
                status,
                attempts: AtomicU32::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start the connection loop. No-op if it is already running.
    pub fn connect(&self) {
        let mut running = self.lock_running();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        self.shared.attempts.store(0, Ordering::SeqCst);
        let shared = self.shared.clone();
        let task = tokio::spawn(async move { shared.run(shutdown_rx).await });
        *running = Some(Running { shutdown, task });
    }

    /// Cancel any pending reconnect, close the socket and wait for the loop
    /// to finish. Suppresses auto-retry until `connect()` is called again.
    pub async fn disconnect(&self) {
        let running = self.lock_running().take();
        if let Some(Running { shutdown, task }) = running {
            let _ = shutdown.send(true);
            if let Err(e) = task.await {
                warn!(error = ?e, "Realtime channel task ended abnormally");
            }
        }
        self.shared.status.send_replace(ChannelStatus::Closed);
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    pub fn add_listener(&self, kind: EventKind, listener: Listener) -> bool {
        self.shared.lock_listeners().add(kind, listener)
    }

    pub fn remove_listener(&self, kind: EventKind, listener: &Listener) -> bool {
        self.shared.lock_listeners().remove(kind, listener)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.shared.lock_listeners().count(kind)
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    pub fn status(&self) -> ChannelStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ChannelStatus> {
        self.shared.status.subscribe()
    }

    /// Reconnects scheduled since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Feed one raw frame through parsing and dispatch.
    pub fn dispatch_text(&self, text: &str) {
        self.shared.dispatch(text);
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        if let Some(running) = self.lock_running().take() {
            let _ = running.shutdown.send(true);
            running.task.abort();
        }
    }
}

impl Shared {
    fn lock_listeners(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: ChannelStatus) {
        self.status.send_replace(status);
    }

    fn dispatch(&self, text: &str) {
        let event = match parse_message(text) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(message = %text, "Ignoring realtime message of unknown type");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed realtime message");
                return;
            }
        };

        let listeners = self.lock_listeners().listeners_for(event.kind);
        debug!(kind = %event.kind, listeners = listeners.len(), "Dispatching realtime event");
        for listener in listeners {
            listener(&event);
        }
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut attempts = 0u32;

        loop {
            self.set_status(ChannelStatus::Connecting);
            let connected = tokio::select! {
                _ = shutdown.changed() => break,
                result = self.connector.connect(&self.url) => result,
            };

            match connected {
                Ok(mut socket) => {
                    attempts = 0;
                    self.attempts.store(0, Ordering::SeqCst);
                    self.set_status(ChannelStatus::Connected);
                    info!(url = %self.url, "Realtime channel connected");

                    loop {
                        tokio::select! {
                            _ = shutdown.changed() => {
                                socket.close().await;
                                info!("Realtime channel closed");
                                return;
                            }
                            frame = socket.next_text() => match frame {
                                Some(Ok(text)) => self.dispatch(&text),
                                Some(Err(e)) => {
                                    warn!(error = %e, "Realtime channel read failed");
                                    break;
                                }
                                None => break,
                            },
                        }
                    }
                    info!("Realtime channel disconnected");
                }
                Err(e) => warn!(error = %e, attempts, "Realtime connect failed"),
            }

            if *shutdown.borrow() {
                break;
            }
            self.set_status(ChannelStatus::Disconnected);

            if !self.policy.should_retry(attempts) {
                warn!(
                    attempts,
                    max_attempts = self.policy.max_attempts,
                    "Realtime reconnect budget exhausted"
                );
                self.set_status(ChannelStatus::Exhausted);
                return;
            }

            let delay = self.policy.delay_for(attempts);
            attempts += 1;
            self.attempts.store(attempts, Ordering::SeqCst);
            self.set_status(ChannelStatus::Reconnecting {
                attempt: attempts,
                delay,
            });
            info!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Scheduling realtime reconnect"
            );

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
