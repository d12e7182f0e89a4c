//! Child-event subscriptions

use serde_json::Value;
use tokio::sync::mpsc;

/// Kind of child event a subscription listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildEventKind {
    Added,
    Changed,
    Removed,
}

/// One incremental event about a direct child of the subscribed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEvent {
    /// Key of the child under the subscribed path
    pub key: String,
    /// Child value after the event (the removed value for removal events)
    pub value: Value,
}

/// Live feed of child events.
///
/// Dropping the subscription detaches it from the backend; events already
/// queued are discarded with it.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<ChildEvent>,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Assemble a subscription from a receiver and a detach hook
    pub fn new(rx: mpsc::UnboundedReceiver<ChildEvent>, detach: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            rx,
            detach: Some(detach),
        }
    }

    /// Wait for the next event. `None` once the backend drops the feed.
    pub async fn recv(&mut self) -> Option<ChildEvent> {
        self.rx.recv().await
    }

    /// Take an already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<ChildEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
