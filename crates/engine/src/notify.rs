//! Notification sink collaborator.
//!
//! Informed of terminal transitions only. Strictly best-effort: the
//! engine calls `notify` after the transition is committed and ignores
//! whatever happens inside; a missed notification never fails or blocks
//! a transition.

use std::sync::Mutex;

/// Terminal workflow events worth telling people about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Validated,
    Rejected,
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, entity_id: &str, event: EventKind, recipients: &[String]);
}

/// Discards every notification.
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _entity_id: &str, _event: EventKind, _recipients: &[String]) {}
}

/// Records notifications for assertion in tests.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<(String, EventKind, Vec<String>)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<(String, EventKind, Vec<String>)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, entity_id: &str, event: EventKind, recipients: &[String]) {
        if let Ok(mut events) = self.events.lock() {
            events.push((entity_id.to_string(), event, recipients.to_vec()));
        }
    }
}
