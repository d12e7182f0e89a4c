//! Presence - online/offline state and the coalesced member list
//!
//! Presence records are single-writer (each member writes only their own),
//! so plain last-writer-wins sets suffice. The store's on-disconnect hook
//! covers the case where the client disappears without an orderly close.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use hall_common::AppResult;
use hall_core::entities::PresenceRecord;
use hall_core::value_objects::MemberId;
use hall_store::{RealtimeStore, Subscription};

use crate::paths;

use super::coalesce::FlushGate;

/// Writer side of one member's presence record.
#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn RealtimeStore>,
    me: MemberId,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn RealtimeStore>, me: MemberId) -> Self {
        Self { store, me }
    }

    /// Go online: write the online record and register the server-side
    /// offline write for an unclean disconnect.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> AppResult<()> {
        let path = paths::presence(&self.me);
        self.store
            .write(&path, serde_json::to_value(PresenceRecord::online_now())?)
            .await?;
        self.store
            .on_disconnect_set(&path, serde_json::to_value(PresenceRecord::offline_now())?)
            .await?;
        Ok(())
    }

    /// Explicit offline write (app hidden or page unloading)
    pub async fn mark_hidden(&self) -> AppResult<()> {
        self.store
            .write(
                &paths::presence(&self.me),
                serde_json::to_value(PresenceRecord::offline_now())?,
            )
            .await?;
        Ok(())
    }

    /// Back to the foreground: same as connecting
    pub async fn mark_visible(&self) -> AppResult<()> {
        self.connect().await
    }

    /// Watch the connection signal and re-establish the online record and
    /// disconnect hook after every reconnect.
    pub fn spawn_reconnect_loop(&self) -> JoinHandle<()> {
        let tracker = self.clone();
        let mut state = self.store.connection_state();
        tokio::spawn(async move {
            let mut was_connected = *state.borrow();
            while state.changed().await.is_ok() {
                let connected = *state.borrow();
                if connected && !was_connected {
                    debug!("Reconnected; restoring presence");
                    if let Err(e) = tracker.connect().await {
                        warn!(error = %e, "Failed to restore presence after reconnect");
                    }
                }
                was_connected = connected;
            }
        })
    }

    /// Live map of everyone's presence, coalesced through a bounded-latency
    /// batcher (`flush_interval` is about one UI frame).
    pub async fn roster_view(&self, flush_interval: Duration) -> AppResult<PresenceList> {
        let root = paths::presence_root();
        let added = self.store.subscribe_child_added(&root, None).await?;
        let changed = self.store.subscribe_child_changed(&root).await?;
        let removed = self.store.subscribe_child_removed(&root).await?;
        Ok(PresenceList::spawn(added, changed, removed, flush_interval))
    }
}

/// Live, batched view of all presence records keyed by member id.
///
/// Dropping the list aborts its task and detaches the subscriptions.
pub struct PresenceList {
    rx: watch::Receiver<HashMap<MemberId, PresenceRecord>>,
    task: JoinHandle<()>,
}

impl PresenceList {
    fn spawn(
        added: Subscription,
        changed: Subscription,
        removed: Subscription,
        flush_interval: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(HashMap::new());
        let task = tokio::spawn(track_presence(added, changed, removed, tx, flush_interval));
        Self { rx, task }
    }

    /// Watch channel carrying the presence map
    pub fn watch(&self) -> watch::Receiver<HashMap<MemberId, PresenceRecord>> {
        self.rx.clone()
    }

    /// Members currently online
    pub fn online_members(&self) -> Vec<MemberId> {
        self.rx
            .borrow()
            .iter()
            .filter(|(_, record)| record.online)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl Drop for PresenceList {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn track_presence(
    mut added: Subscription,
    mut changed: Subscription,
    mut removed: Subscription,
    tx: watch::Sender<HashMap<MemberId, PresenceRecord>>,
    flush_interval: Duration,
) {
    let mut map: HashMap<MemberId, PresenceRecord> = HashMap::new();
    let mut gate = FlushGate::new(flush_interval);
    loop {
        let event = tokio::select! {
            ev = added.recv() => ev.map(|e| (e, false)),
            ev = changed.recv() => ev.map(|e| (e, false)),
            ev = removed.recv() => ev.map(|e| (e, true)),
            () = gate.expired(), if gate.is_dirty() => {
                gate.take();
                if tx.send(map.clone()).is_err() {
                    break;
                }
                continue;
            }
        };
        let Some((event, is_removal)) = event else {
            break;
        };
        if is_removal {
            map.remove(&MemberId::new(event.key));
        } else {
            match serde_json::from_value::<PresenceRecord>(event.value) {
                Ok(record) => {
                    map.insert(MemberId::new(event.key), record);
                }
                Err(e) => {
                    warn!(member = %event.key, error = %e, "Skipping malformed presence record");
                    continue;
                }
            }
        }
        gate.mark_dirty();
    }
    // Publish whatever was pending before the feed ended.
    if gate.is_dirty() {
        let _ = tx.send(map);
    }
}
