//! Room view - windowed load plus incremental merge for one room
//!
//! The view owns two store subscriptions and a merge task. The baseline is a
//! `read_window(W)` of the room log; a concurrent last-1 child-added feed
//! covers sends that land while the baseline is in flight. Events queued
//! before the baseline resolves are upserted by id, so overlap with the
//! baseline is harmless and a send that raced the read is not lost.
//! After that, child-added events upsert into the window and child-changed
//! events (reactions, soft deletes) upsert unconditionally. Push-id order is
//! trusted; the view never reorders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use hall_common::AppResult;
use hall_core::entities::Message;
use hall_core::value_objects::RoomId;
use hall_store::{RealtimeStore, Subscription};

use crate::paths;

/// Live handle onto one room's message window.
///
/// Dropping the view aborts the merge task, which detaches both store
/// subscriptions with it.
pub struct RoomView {
    rx: watch::Receiver<Vec<Message>>,
    display_count: AtomicUsize,
    page: usize,
    window: usize,
    task: JoinHandle<()>,
}

impl RoomView {
    /// Load the room and start merging live events.
    ///
    /// `window` is the network window W; `page` is the display page size
    /// (initial display count and the "load older" increment).
    pub async fn open(
        store: &Arc<dyn RealtimeStore>,
        room: &RoomId,
        window: usize,
        page: usize,
    ) -> AppResult<Self> {
        let log_path = paths::room_messages(room);

        // The live feed attaches before the baseline read so nothing sent
        // in between is lost.
        let mut added = store.subscribe_child_added(&log_path, Some(1)).await?;
        let changed = store.subscribe_child_changed(&log_path).await?;

        let baseline = store.read_window(&log_path, window).await?;

        let mut messages = Vec::with_capacity(baseline.len());
        for (key, value) in baseline {
            match serde_json::from_value::<Message>(value) {
                Ok(msg) => messages.push(msg),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed message node"),
            }
        }

        // Events queued while the baseline ran mostly overlap with it;
        // upserting by id absorbs the overlap and keeps a send that landed
        // after the read.
        while let Some(event) = added.try_recv() {
            upsert(&mut messages, &event.key, event.value, window);
        }

        let (tx, rx) = watch::channel(messages.clone());
        let task = tokio::spawn(merge_loop(messages, added, changed, tx, window));

        Ok(Self {
            rx,
            display_count: AtomicUsize::new(page.min(window)),
            page,
            window,
            task,
        })
    }

    /// Watch channel carrying the full network-window snapshot
    pub fn watch(&self) -> watch::Receiver<Vec<Message>> {
        self.rx.clone()
    }

    /// Current network-window snapshot, oldest first
    pub fn snapshot(&self) -> Vec<Message> {
        self.rx.borrow().clone()
    }

    /// The slice of the snapshot the UI should render: the newest
    /// `display_count` messages
    pub fn visible(&self) -> Vec<Message> {
        let snapshot = self.rx.borrow();
        let count = self.display_count.load(Ordering::Acquire);
        let start = snapshot.len().saturating_sub(count);
        snapshot[start..].to_vec()
    }

    /// Number of messages currently displayed
    pub fn display_count(&self) -> usize {
        self.display_count
            .load(Ordering::Acquire)
            .min(self.rx.borrow().len())
    }

    /// Reveal one more page of already-loaded history. A no-op once the
    /// display count reaches the network window; older history is not
    /// fetched.
    pub fn load_older(&self) {
        let next = (self.display_count.load(Ordering::Acquire) + self.page).min(self.window);
        self.display_count.store(next, Ordering::Release);
    }

    /// Whether `load_older` would reveal anything
    pub fn can_load_older(&self) -> bool {
        self.display_count.load(Ordering::Acquire) < self.rx.borrow().len()
    }
}

impl Drop for RoomView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn merge_loop(
    mut messages: Vec<Message>,
    mut added: Subscription,
    mut changed: Subscription,
    tx: watch::Sender<Vec<Message>>,
    window: usize,
) {
    loop {
        let event = tokio::select! {
            ev = added.recv() => ev,
            ev = changed.recv() => ev,
        };
        let Some(event) = event else { break };
        if upsert(&mut messages, &event.key, event.value, window) && tx.send(messages.clone()).is_err() {
            // All receivers gone; the view itself keeps one, so this only
            // happens during teardown.
            break;
        }
    }
    debug!("Room merge loop ended");
}

/// Insert or replace by id, keeping push-id order, then truncate the oldest
/// entries beyond the window. Returns whether the snapshot changed.
fn upsert(messages: &mut Vec<Message>, key: &str, value: Value, window: usize) -> bool {
    let msg = match serde_json::from_value::<Message>(value) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(key = %key, error = %e, "Ignoring malformed message event");
            return false;
        }
    };
    match messages.binary_search_by(|m| m.id.cmp(&msg.id)) {
        Ok(i) => messages[i] = msg,
        Err(i) => messages.insert(i, msg),
    }
    if messages.len() > window {
        let excess = messages.len() - window;
        messages.drain(..excess);
    }
    true
}
