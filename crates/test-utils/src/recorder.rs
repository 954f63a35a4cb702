use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use dirwatch::watch::{ChangeEvent, ChangeKind, EventRelay, HandlerId};

/// A relay subscriber that:
/// - records every event it is handed, in delivery order
/// - lets tests wait until an expected event shows up.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
    notify: Arc<Notify>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every slot of `relay`.
    pub fn attach(&self, relay: &EventRelay) -> Vec<HandlerId> {
        ChangeKind::ALL
            .into_iter()
            .map(|kind| self.attach_kind(relay, kind))
            .collect()
    }

    /// Subscribe to a single slot of `relay`.
    pub fn attach_kind(&self, relay: &EventRelay, kind: ChangeKind) -> HandlerId {
        let recorder = self.clone();
        relay.subscribe(kind, move |event| recorder.record(event))
    }

    pub fn record(&self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
        self.notify.notify_waiters();
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Wait until an event matching `pred` has been recorded.
    ///
    /// Returns `None` if nothing matched within `timeout`.
    pub async fn wait_for<F>(&self, timeout: Duration, pred: F) -> Option<ChangeEvent>
    where
        F: Fn(&ChangeEvent) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking, so a record in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(found) = self.events().into_iter().find(|e| pred(e)) {
                return Some(found);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }
}
