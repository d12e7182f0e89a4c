//! Chat engine - send pipeline, reactions, soft delete, unread counters
//!
//! The engine acts on behalf of one member. Sending is three steps with
//! distinct failure policies: the log append is awaited and fallible, the
//! chat-meta update and the unread fan-out are spawned and best-effort
//! (logged, never surfaced, never retried).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use hall_common::{AppError, AppResult, ChatConfig};
use hall_core::entities::{ChatMeta, Message, MessageKind, ReplyPreview};
use hall_core::error::DomainError;
use hall_core::value_objects::{MemberId, PushId, PushIdGenerator, RoomId};
use hall_store::{RealtimeStore, Subscription};

use crate::paths;

use super::room_view::RoomView;

/// Chat engine bound to one member.
pub struct ChatEngine {
    store: Arc<dyn RealtimeStore>,
    config: ChatConfig,
    ids: Arc<PushIdGenerator>,
    me: MemberId,
    my_name: String,
    /// Current member roster, fed by the membership directory. Group sends
    /// fan unread increments out to everyone here except the sender.
    roster: RwLock<Vec<MemberId>>,
}

impl ChatEngine {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        config: ChatConfig,
        ids: Arc<PushIdGenerator>,
        me: MemberId,
        my_name: String,
    ) -> Self {
        Self {
            store,
            config,
            ids,
            me,
            my_name,
            roster: RwLock::new(Vec::new()),
        }
    }

    /// The member this engine acts for
    pub fn member_id(&self) -> &MemberId {
        &self.me
    }

    /// Replace the fan-out roster
    pub fn set_roster(&self, members: Vec<MemberId>) {
        *self.roster.write() = members;
    }

    /// Open a live view onto `room`: baseline window plus incremental merge.
    #[instrument(skip(self))]
    pub async fn open_room(&self, room: &RoomId) -> AppResult<RoomView> {
        let window = self.window_for(room);
        RoomView::open(&self.store, room, window, self.config.display_page).await
    }

    fn window_for(&self, room: &RoomId) -> usize {
        if room.is_group() {
            self.config.group_window
        } else {
            self.config.private_window
        }
    }

    /// Send a message. Empty (after trimming) content is a silent no-op and
    /// returns `None`; otherwise the appended message is returned once the
    /// log write has been acknowledged.
    #[instrument(skip(self, content, reply_to), fields(room = %room))]
    pub async fn send_message(
        &self,
        room: &RoomId,
        content: &str,
        kind: MessageKind,
        reply_to: Option<&Message>,
    ) -> AppResult<Option<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let id = self.ids.generate();
        let msg = match reply_to {
            Some(target) => Message::new_reply(
                id,
                room.clone(),
                self.me.clone(),
                self.my_name.clone(),
                content.to_owned(),
                kind,
                ReplyPreview::of(target),
            ),
            None => Message::new(
                id,
                room.clone(),
                self.me.clone(),
                self.my_name.clone(),
                content.to_owned(),
                kind,
            ),
        };

        // Step 1: the log append. The only fallible step; nothing below
        // runs if it is rejected.
        self.store
            .write(&paths::message(room, &msg.id), serde_json::to_value(&msg)?)
            .await?;

        // Step 2: chat meta, fire and forget.
        {
            let store = self.store.clone();
            let path = paths::chat_meta(room);
            let meta = ChatMeta::of(&msg);
            tokio::spawn(async move {
                match serde_json::to_value(&meta) {
                    Ok(value) => {
                        if let Err(e) = store.write(&path, value).await {
                            warn!(path = %path, error = %e, "Chat meta update failed");
                        }
                    }
                    Err(e) => warn!(error = %e, "Chat meta serialization failed"),
                }
            });
        }

        // Step 3: unread fan-out, fire and forget.
        {
            let store = self.store.clone();
            let room = room.clone();
            let recipients = self.fanout_targets(&room);
            let chunk = self.config.fanout_chunk.max(1);
            tokio::spawn(async move {
                fan_out_unread(&store, &room, recipients, chunk).await;
            });
        }

        Ok(Some(msg))
    }

    /// Everyone who should see their unread counter bump for a send to
    /// `room`
    fn fanout_targets(&self, room: &RoomId) -> Vec<MemberId> {
        if room.is_group() {
            self.roster
                .read()
                .iter()
                .filter(|m| **m != self.me)
                .cloned()
                .collect()
        } else {
            room.other_participant(&self.me).cloned().into_iter().collect()
        }
    }

    /// Toggle this member's reaction under `emoji` on a message.
    /// Double-toggling restores the original state. Tombstones are left
    /// untouched.
    #[instrument(skip(self), fields(room = %room, message = %message_id))]
    pub async fn toggle_reaction(
        &self,
        room: &RoomId,
        message_id: &PushId,
        emoji: &str,
    ) -> AppResult<()> {
        let path = paths::message(room, message_id);
        if self.store.read(&path).await?.is_none() {
            return Err(AppError::Domain(DomainError::MessageNotFound(
                message_id.clone(),
            )));
        }

        let me = self.me.clone();
        let emoji = emoji.to_owned();
        self.store
            .transact(
                &path,
                Box::new(move |current| {
                    let current = current?;
                    let Ok(mut msg) = serde_json::from_value::<Message>(current.clone()) else {
                        return Some(current);
                    };
                    if msg.is_deleted() {
                        return Some(current);
                    }
                    msg.toggle_reaction(&emoji, &me);
                    serde_json::to_value(&msg).map_or(Some(current), Some)
                }),
            )
            .await?;
        Ok(())
    }

    /// Soft-delete a message. Only the original sender may delete; the
    /// check is enforced here, not left to callers.
    #[instrument(skip(self), fields(room = %room, message = %message_id))]
    pub async fn delete_message(&self, room: &RoomId, message_id: &PushId) -> AppResult<()> {
        let path = paths::message(room, message_id);
        let current = self
            .store
            .read(&path)
            .await?
            .ok_or_else(|| DomainError::MessageNotFound(message_id.clone()))?;
        let msg: Message = serde_json::from_value(current)?;
        if msg.sender_id != self.me {
            return Err(AppError::Domain(DomainError::NotMessageAuthor));
        }

        self.store
            .transact(
                &path,
                Box::new(move |current| {
                    let current = current?;
                    let Ok(mut msg) = serde_json::from_value::<Message>(current.clone()) else {
                        return Some(current);
                    };
                    msg.soft_delete();
                    serde_json::to_value(&msg).map_or(Some(current), Some)
                }),
            )
            .await?;
        debug!("Message soft-deleted");
        Ok(())
    }

    /// Clear this member's unread counter for `room` (called when the room
    /// is opened)
    #[instrument(skip(self), fields(room = %room))]
    pub async fn mark_room_read(&self, room: &RoomId) -> AppResult<()> {
        self.store
            .remove(&paths::unread_counter(&self.me, room))
            .await?;
        Ok(())
    }

    /// Live map of this member's unread counters, keyed by room id
    pub async fn unread_counts(&self) -> AppResult<UnreadCounts> {
        let root = paths::unread_root(&self.me);
        let added = self.store.subscribe_child_added(&root, None).await?;
        let changed = self.store.subscribe_child_changed(&root).await?;
        let removed = self.store.subscribe_child_removed(&root).await?;
        Ok(UnreadCounts::spawn(added, changed, removed))
    }
}

/// Apply one unread increment per recipient, `chunk_size` recipients at a
/// time with a scheduler yield between chunks so a large roster cannot
/// monopolize the executor.
async fn fan_out_unread(
    store: &Arc<dyn RealtimeStore>,
    room: &RoomId,
    recipients: Vec<MemberId>,
    chunk_size: usize,
) {
    for chunk in recipients.chunks(chunk_size) {
        for recipient in chunk {
            let path = paths::unread_counter(recipient, room);
            let result = store
                .transact(
                    &path,
                    Box::new(|current| {
                        let count = current.as_ref().and_then(Value::as_i64).unwrap_or(0);
                        Some(json!(count + 1))
                    }),
                )
                .await;
            if let Err(e) = result {
                warn!(recipient = %recipient, room = %room, error = %e, "Unread increment failed");
            }
        }
        tokio::task::yield_now().await;
    }
}

/// Live handle onto one member's unread counters.
///
/// Dropping the handle aborts the tracking task, which detaches the store
/// subscriptions.
pub struct UnreadCounts {
    rx: watch::Receiver<HashMap<String, i64>>,
    task: JoinHandle<()>,
}

impl UnreadCounts {
    fn spawn(added: Subscription, changed: Subscription, removed: Subscription) -> Self {
        let (tx, rx) = watch::channel(HashMap::new());
        let task = tokio::spawn(track_unread(added, changed, removed, tx));
        Self { rx, task }
    }

    /// Watch channel carrying the counter map
    pub fn watch(&self) -> watch::Receiver<HashMap<String, i64>> {
        self.rx.clone()
    }

    /// Counter for one room; zero when no counter exists
    pub fn for_room(&self, room: &RoomId) -> i64 {
        self.rx.borrow().get(&room.to_string()).copied().unwrap_or(0)
    }

    /// Sum across all rooms (the app badge)
    pub fn total(&self) -> i64 {
        self.rx.borrow().values().sum()
    }
}

impl Drop for UnreadCounts {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn track_unread(
    mut added: Subscription,
    mut changed: Subscription,
    mut removed: Subscription,
    tx: watch::Sender<HashMap<String, i64>>,
) {
    let mut counts: HashMap<String, i64> = HashMap::new();
    loop {
        let (event, is_removal) = tokio::select! {
            ev = added.recv() => (ev, false),
            ev = changed.recv() => (ev, false),
            ev = removed.recv() => (ev, true),
        };
        let Some(event) = event else { break };
        if is_removal {
            counts.remove(&event.key);
        } else {
            // Counters are non-negative by construction; clamp anyway so a
            // damaged node cannot produce a negative badge.
            counts.insert(event.key, event.value.as_i64().unwrap_or(0).max(0));
        }
        if tx.send(counts.clone()).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hall_store::MemoryStore;

    fn engine_for(member: &str, name: &str) -> (Arc<dyn RealtimeStore>, ChatEngine) {
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
        let engine = ChatEngine::new(
            store.clone(),
            ChatConfig::default(),
            Arc::new(PushIdGenerator::new()),
            MemberId::new(member),
            name.to_owned(),
        );
        (store, engine)
    }

    #[tokio::test]
    async fn test_empty_content_is_a_no_op() {
        let (store, engine) = engine_for("m1", "Mina");
        let sent = engine
            .send_message(&RoomId::group(), "   \n ", MessageKind::Text, None)
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(store
            .read(&paths::room_messages(&RoomId::group()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_send_appends_to_log() {
        let (store, engine) = engine_for("m1", "Mina");
        let room = RoomId::group();
        let sent = engine
            .send_message(&room, "hello", MessageKind::Text, None)
            .await
            .unwrap()
            .expect("non-empty send returns the message");

        let node = store
            .read(&paths::message(&room, &sent.id))
            .await
            .unwrap()
            .expect("message is in the log");
        let stored: Message = serde_json::from_value(node).unwrap();
        assert_eq!(stored.content, "hello");
        assert_eq!(stored.sender_id, MemberId::new("m1"));
    }

    #[tokio::test]
    async fn test_send_updates_chat_meta() {
        let (store, engine) = engine_for("m1", "Mina");
        let room = RoomId::group();
        engine
            .send_message(&room, "latest", MessageKind::Text, None)
            .await
            .unwrap();

        // Meta is written by a spawned task.
        tokio::task::yield_now().await;
        let meta: ChatMeta = serde_json::from_value(
            store
                .read(&paths::chat_meta(&room))
                .await
                .unwrap()
                .expect("meta written"),
        )
        .unwrap();
        assert_eq!(meta.last_message, "latest");
        assert_eq!(meta.last_sender_name, "Mina");
    }

    #[tokio::test]
    async fn test_group_fanout_skips_sender() {
        let (store, engine) = engine_for("m1", "Mina");
        engine.set_roster(vec![
            MemberId::new("m1"),
            MemberId::new("m2"),
            MemberId::new("m3"),
        ]);
        let room = RoomId::group();
        engine
            .send_message(&room, "hi all", MessageKind::Text, None)
            .await
            .unwrap();

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let read_count = |member: &str| {
            let store = store.clone();
            let path = paths::unread_counter(&MemberId::new(member), &room);
            async move { store.read(&path).await.unwrap().and_then(|v| v.as_i64()) }
        };
        assert_eq!(read_count("m2").await, Some(1));
        assert_eq!(read_count("m3").await, Some(1));
        assert_eq!(read_count("m1").await, None, "sender gets no counter");
    }

    #[tokio::test]
    async fn test_private_fanout_targets_other_participant() {
        let (store, engine) = engine_for("m1", "Mina");
        let room = RoomId::private(MemberId::new("m1"), MemberId::new("m2"));
        engine
            .send_message(&room, "psst", MessageKind::Text, None)
            .await
            .unwrap();

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let count = store
            .read(&paths::unread_counter(&MemberId::new("m2"), &room))
            .await
            .unwrap()
            .and_then(|v| v.as_i64());
        assert_eq!(count, Some(1));
    }

    #[tokio::test]
    async fn test_reaction_toggle_roundtrip() {
        let (store, engine) = engine_for("m1", "Mina");
        let room = RoomId::group();
        let sent = engine
            .send_message(&room, "react to me", MessageKind::Text, None)
            .await
            .unwrap()
            .unwrap();

        engine.toggle_reaction(&room, &sent.id, "👍").await.unwrap();
        let path = paths::message(&room, &sent.id);
        let msg: Message =
            serde_json::from_value(store.read(&path).await.unwrap().unwrap()).unwrap();
        assert!(msg.reactions["👍"].contains(&MemberId::new("m1")));

        engine.toggle_reaction(&room, &sent.id, "👍").await.unwrap();
        let msg: Message =
            serde_json::from_value(store.read(&path).await.unwrap().unwrap()).unwrap();
        assert!(msg.reactions.is_empty(), "double toggle restores state");
    }

    #[tokio::test]
    async fn test_reaction_on_unknown_message() {
        let (_store, engine) = engine_for("m1", "Mina");
        let err = engine
            .toggle_reaction(&RoomId::group(), &PushIdGenerator::new().generate(), "👍")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_sender_only() {
        let (store, sender) = engine_for("m1", "Mina");
        let other = ChatEngine::new(
            store.clone(),
            ChatConfig::default(),
            Arc::new(PushIdGenerator::new()),
            MemberId::new("m2"),
            "Bo".to_owned(),
        );
        let room = RoomId::group();
        let sent = sender
            .send_message(&room, "secret", MessageKind::Text, None)
            .await
            .unwrap()
            .unwrap();

        let err = other.delete_message(&room, &sent.id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_MESSAGE_AUTHOR");

        sender.delete_message(&room, &sent.id).await.unwrap();
        let msg: Message = serde_json::from_value(
            store
                .read(&paths::message(&room, &sent.id))
                .await
                .unwrap()
                .unwrap(),
        )
        .unwrap();
        assert!(msg.is_deleted());
        assert_eq!(msg.content, "");
        assert_eq!(msg.id, sent.id, "identity survives the tombstone");
    }

    #[tokio::test]
    async fn test_unread_counts_track_and_reset() {
        let (store, engine) = engine_for("m2", "Bo");
        let room = RoomId::private(MemberId::new("m1"), MemberId::new("m2"));
        let counts = engine.unread_counts().await.unwrap();
        let mut rx = counts.watch();

        // A peer increments m2's counter twice.
        for _ in 0..2 {
            store
                .transact(
                    &paths::unread_counter(&MemberId::new("m2"), &room),
                    Box::new(|current| {
                        Some(json!(current.as_ref().and_then(Value::as_i64).unwrap_or(0) + 1))
                    }),
                )
                .await
                .unwrap();
        }
        while counts.for_room(&room) != 2 {
            rx.changed().await.unwrap();
        }
        assert_eq!(counts.total(), 2);

        engine.mark_room_read(&room).await.unwrap();
        while counts.for_room(&room) != 0 {
            rx.changed().await.unwrap();
        }
        assert_eq!(counts.total(), 0, "reset lands on exact zero");
    }

    #[tokio::test]
    async fn test_unread_counts_clamp_damaged_negative_counter() {
        let (store, engine) = engine_for("m2", "Bo");
        let room = RoomId::private(MemberId::new("m1"), MemberId::new("m2"));
        let counts = engine.unread_counts().await.unwrap();
        let mut rx = counts.watch();

        // A damaged counter node must never surface as a negative badge.
        store
            .write(
                &paths::unread_counter(&MemberId::new("m2"), &room),
                json!(-3),
            )
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(counts.for_room(&room), 0);
        assert_eq!(counts.total(), 0);
    }
}
