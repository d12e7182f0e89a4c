//! End-to-end chat tests
//!
//! Two members share one in-memory store; each acts through their own
//! engine, the way two clients share the hosted backend.

use std::sync::Arc;

use integration_tests::TestBackend;

use hall_common::ChatConfig;
use hall_core::entities::MessageKind;
use hall_core::value_objects::{MemberId, PushIdGenerator, RoomId};
use hall_engine::ChatEngine;

/// Scenario: Mina sends to the group; Bo's open view receives the message
/// and Bo's unread counter bumps by one; opening the room clears it.
#[tokio::test]
async fn test_group_send_reaches_subscriber_and_bumps_unread() {
    let backend = TestBackend::new();
    let mina = backend.chat_engine_for("m1", "Mina");
    let bo = backend.chat_engine_for("m2", "Bo");
    mina.set_roster(vec![MemberId::new("m1"), MemberId::new("m2")]);

    let room = RoomId::group();
    let bo_view = bo.open_room(&room).await.unwrap();
    let bo_unread = bo.unread_counts().await.unwrap();
    let mut messages = bo_view.watch();
    let mut unread = bo_unread.watch();

    let sent = mina
        .send_message(&room, "hello study hall", MessageKind::Text, None)
        .await
        .unwrap()
        .expect("non-empty send");

    messages.changed().await.unwrap();
    {
        let snapshot = messages.borrow();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, sent.id);
        assert_eq!(snapshot[0].sender_name, "Mina");
    }

    while bo_unread.for_room(&room) != 1 {
        unread.changed().await.unwrap();
    }

    bo.mark_room_read(&room).await.unwrap();
    while bo_unread.for_room(&room) != 0 {
        unread.changed().await.unwrap();
    }
    assert_eq!(bo_unread.total(), 0);
}

#[tokio::test]
async fn test_private_room_is_symmetric() {
    let backend = TestBackend::new();
    let mina = backend.chat_engine_for("m1", "Mina");
    let bo = backend.chat_engine_for("m2", "Bo");

    // Both sides derive the same room id regardless of argument order.
    let from_mina = RoomId::private(MemberId::new("m1"), MemberId::new("m2"));
    let from_bo = RoomId::private(MemberId::new("m2"), MemberId::new("m1"));
    assert_eq!(from_mina, from_bo);

    let bo_view = bo.open_room(&from_bo).await.unwrap();
    let mut messages = bo_view.watch();

    mina.send_message(&from_mina, "psst", MessageKind::Text, None)
        .await
        .unwrap();
    messages.changed().await.unwrap();
    assert_eq!(messages.borrow()[0].content, "psst");
}

/// A small custom window proves the bound end to end: the view never grows
/// past W no matter how many messages land.
#[tokio::test]
async fn test_network_window_bound() {
    let backend = TestBackend::new();
    let config = ChatConfig {
        group_window: 5,
        display_page: 2,
        ..ChatConfig::default()
    };
    let mina = ChatEngine::new(
        backend.store.clone(),
        config,
        Arc::new(PushIdGenerator::new()),
        MemberId::new("m1"),
        "Mina".to_owned(),
    );

    let room = RoomId::group();
    for i in 0..4 {
        mina.send_message(&room, &format!("warmup {i}"), MessageKind::Text, None)
            .await
            .unwrap();
    }

    let view = mina.open_room(&room).await.unwrap();
    let mut messages = view.watch();
    for i in 0..6 {
        mina.send_message(&room, &format!("burst {i}"), MessageKind::Text, None)
            .await
            .unwrap();
    }

    while messages.borrow().last().map(|m| m.content.clone()) != Some("burst 5".to_owned()) {
        messages.changed().await.unwrap();
    }
    let snapshot = messages.borrow();
    assert_eq!(snapshot.len(), 5, "window bound holds");
    assert_eq!(snapshot[0].content, "burst 1", "oldest entries rolled off");
}

#[tokio::test]
async fn test_reaction_and_soft_delete_propagate_to_subscribers() {
    let backend = TestBackend::new();
    let mina = backend.chat_engine_for("m1", "Mina");
    let bo = backend.chat_engine_for("m2", "Bo");

    let room = RoomId::group();
    let sent = mina
        .send_message(&room, "react or delete", MessageKind::Text, None)
        .await
        .unwrap()
        .unwrap();

    let bo_view = bo.open_room(&room).await.unwrap();
    let mut messages = bo_view.watch();

    // Bo reacts; Mina's double toggle from another engine is an involution.
    bo.toggle_reaction(&room, &sent.id, "🔥").await.unwrap();
    messages.changed().await.unwrap();
    assert!(messages.borrow()[0].reactions["🔥"].contains(&MemberId::new("m2")));

    mina.toggle_reaction(&room, &sent.id, "🔥").await.unwrap();
    mina.toggle_reaction(&room, &sent.id, "🔥").await.unwrap();
    // Wait until the double toggle has settled back to Bo's lone reaction.
    while messages.borrow()[0]
        .reactions
        .get("🔥")
        .is_none_or(|set| !(set.len() == 1 && set.contains(&MemberId::new("m2"))))
    {
        messages.changed().await.unwrap();
    }

    // Only the sender may delete.
    let err = bo.delete_message(&room, &sent.id).await.unwrap_err();
    assert_eq!(err.code(), "NOT_MESSAGE_AUTHOR");

    mina.delete_message(&room, &sent.id).await.unwrap();
    while !messages.borrow()[0].is_deleted() {
        messages.changed().await.unwrap();
    }
    let snapshot = messages.borrow();
    assert_eq!(snapshot[0].content, "");
    assert!(snapshot[0].reactions.is_empty());
    assert_eq!(snapshot[0].id, sent.id, "identity survives");
    assert_eq!(snapshot[0].timestamp, sent.timestamp);
}

#[tokio::test]
async fn test_reply_carries_truncated_preview() {
    let backend = TestBackend::new();
    let mina = backend.chat_engine_for("m1", "Mina");
    let bo = backend.chat_engine_for("m2", "Bo");

    let room = RoomId::group();
    let long = "q".repeat(300);
    let original = mina
        .send_message(&room, &long, MessageKind::Text, None)
        .await
        .unwrap()
        .unwrap();

    let reply = bo
        .send_message(&room, "quoting you", MessageKind::Text, Some(&original))
        .await
        .unwrap()
        .unwrap();

    let preview = reply.reply_to.expect("reply preview attached");
    assert_eq!(preview.id, original.id);
    assert_eq!(preview.content.len(), 80);
}
