//! Chat meta - denormalized per-room preview for contact lists
//!
//! Updated best-effort after each send; eventually consistent with the room
//! log and never read back by the send path itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::message::{Message, MessageKind};
use crate::value_objects::MemberId;

/// Length of the text preview stored in chat meta.
const META_PREVIEW_LEN: usize = 80;

/// Per-room last-message cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMeta {
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub last_sender_id: MemberId,
    pub last_sender_name: String,
}

impl ChatMeta {
    /// Derive the meta record for a just-sent message
    pub fn of(msg: &Message) -> Self {
        let last_message = match msg.kind {
            MessageKind::Gif => "GIF".to_owned(),
            MessageKind::Deleted => "Message deleted".to_owned(),
            MessageKind::Text | MessageKind::Emoji => msg.preview(META_PREVIEW_LEN).to_owned(),
        };
        Self {
            last_message,
            last_message_time: msg.timestamp,
            last_sender_id: msg.sender_id.clone(),
            last_sender_name: msg.sender_name.clone(),
        }
    }
}
