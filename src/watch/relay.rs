// src/watch/relay.rs

//! Event relay: per-category subscription slots.
//!
//! Each [`ChangeKind`] has an ordered list of handlers. [`EventRelay::dispatch`]
//! calls every handler of the event's slot, in registration order, with the
//! event exactly as it was received. The relay does not filter, coalesce or
//! deduplicate, and never touches the files named by events.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, error, warn};

use crate::watch::event::{ChangeEvent, ChangeKind};

/// Callback attached to a subscription slot.
pub type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync + 'static>;

/// Identifies a registered handler so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
pub struct EventRelay {
    slots: RwLock<HashMap<ChangeKind, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EventRelay");
        for kind in ChangeKind::ALL {
            s.field(&kind.to_string(), &self.handler_count(kind));
        }
        s.finish()
    }
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: ChangeKind, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn on_created<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(ChangeKind::Created, handler)
    }

    pub fn on_changed<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(ChangeKind::Changed, handler)
    }

    pub fn on_renamed<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(ChangeKind::Renamed, handler)
    }

    pub fn on_deleted<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(ChangeKind::Deleted, handler)
    }

    pub fn on_error<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe(ChangeKind::Error, handler)
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        for handlers in slots.values_mut() {
            if let Some(pos) = handlers.iter().position(|(h, _)| *h == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, kind: ChangeKind) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler of its slot and return how many ran.
    ///
    /// A panicking handler is logged and skipped; the others still run.
    pub fn dispatch(&self, event: &ChangeEvent) -> usize {
        let kind = event.kind();
        match event {
            ChangeEvent::Error { path, message } => {
                warn!(?path, %message, "watcher reported an error")
            }
            _ => debug!(%kind, path = ?event.path(), "relaying change event"),
        }

        // Snapshot the slot so handlers may (un)subscribe while running.
        let handlers: Vec<Handler> = {
            let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
            slots
                .get(&kind)
                .map(|hs| hs.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        for (index, handler) in handlers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(%kind, index, "event handler panicked");
            }
        }

        handlers.len()
    }
}
