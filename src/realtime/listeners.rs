//! Listener registry keyed by event kind.

use std::collections::HashMap;
use std::sync::Arc;

use super::event::{EventKind, RealtimeEvent};

/// Callback invoked for every event of the kind it is registered for.
pub type Listener = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

/// Listeners are compared by identity (`Arc::ptr_eq`), so registering the
/// same `Arc` twice is a no-op and removal needs the same `Arc`.
#[derive(Default)]
pub struct ListenerRegistry {
    by_kind: HashMap<EventKind, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the listener was already registered for `kind`.
    pub fn add(&mut self, kind: EventKind, listener: Listener) -> bool {
        let entry = self.by_kind.entry(kind).or_default();
        if entry.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        entry.push(listener);
        true
    }

    /// Returns false if it was not registered. Removing the last listener
    /// for a kind drops the kind's entry.
    pub fn remove(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let Some(entry) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|l| !Arc::ptr_eq(l, listener));
        let removed = entry.len() != before;
        if entry.is_empty() {
            self.by_kind.remove(&kind);
        }
        removed
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    pub fn has_kind(&self, kind: EventKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Clone the listeners for `kind` so they can be called without holding
    /// the registry lock.
    pub fn listeners_for(&self, kind: EventKind) -> Vec<Listener> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }
}
