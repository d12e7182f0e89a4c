//! Message entity - one entry in a room's append-mostly log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::value_objects::{MemberId, PushId, RoomId};

/// Maximum length of a reply-preview excerpt.
const REPLY_PREVIEW_LEN: usize = 80;

/// Message payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Emoji,
    Gif,
    /// Soft-deleted tombstone; content and mutable payload are cleared
    Deleted,
}

/// Truncated excerpt of the message being replied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub id: PushId,
    pub sender_name: String,
    pub content: String,
}

impl ReplyPreview {
    /// Build a preview of `target`, truncating content to 80 characters
    pub fn of(target: &Message) -> Self {
        Self {
            id: target.id.clone(),
            sender_name: target.sender_name.clone(),
            content: truncate_on_char_boundary(&target.content, REPLY_PREVIEW_LEN).to_owned(),
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: PushId,
    pub room_id: RoomId,
    pub sender_id: MemberId,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
    /// Emoji string -> reacting member ids. Set semantics: membership unique,
    /// order irrelevant.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reactions: BTreeMap<String, BTreeSet<MemberId>>,
}

impl Message {
    /// Create a new message
    pub fn new(
        id: PushId,
        room_id: RoomId,
        sender_id: MemberId,
        sender_name: String,
        content: String,
        kind: MessageKind,
    ) -> Self {
        Self {
            id,
            room_id,
            sender_id,
            sender_name,
            content,
            timestamp: Utc::now(),
            kind,
            reply_to: None,
            reactions: BTreeMap::new(),
        }
    }

    /// Create a reply message
    pub fn new_reply(
        id: PushId,
        room_id: RoomId,
        sender_id: MemberId,
        sender_name: String,
        content: String,
        kind: MessageKind,
        reply_to: ReplyPreview,
    ) -> Self {
        let mut msg = Self::new(id, room_id, sender_id, sender_name, content, kind);
        msg.reply_to = Some(reply_to);
        msg
    }

    /// Check if this message has been soft-deleted
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.kind == MessageKind::Deleted
    }

    /// Check if the message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Soft-delete the message.
    ///
    /// Clears content, reactions, and the reply reference but keeps id,
    /// timestamp, and sender so surrounding replies and date grouping stay
    /// valid.
    pub fn soft_delete(&mut self) {
        self.kind = MessageKind::Deleted;
        self.content.clear();
        self.reactions.clear();
        self.reply_to = None;
    }

    /// Toggle `member`'s reaction under `emoji`.
    ///
    /// Returns `true` if the reaction is present after the toggle. Calling
    /// twice with the same member restores the original state. An emptied
    /// emoji entry is pruned.
    pub fn toggle_reaction(&mut self, emoji: &str, member: &MemberId) -> bool {
        let set = self.reactions.entry(emoji.to_owned()).or_default();
        let now_present = if set.contains(member) {
            set.remove(member);
            false
        } else {
            set.insert(member.clone());
            true
        };
        if set.is_empty() {
            self.reactions.remove(emoji);
        }
        now_present
    }

    /// Get a truncated preview of the content (for chat-meta and
    /// notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        truncate_on_char_boundary(&self.content, max_len)
    }

    /// Check if message content is empty after trimming
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Truncate without splitting a multi-byte character.
fn truncate_on_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}
