//! Presence entity - per-member online/offline/typing state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::RoomId;

/// Readers ignore typing entries older than this; the second half of the
/// double guard against stuck indicators (the writer self-clears after 3 s).
pub const TYPING_STALE_AFTER_SECS: i64 = 5;

/// Typing indicator written by the member themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingState {
    pub room_id: RoomId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

impl TypingState {
    /// Check if the indicator is recent enough to display
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < Duration::seconds(TYPING_STALE_AFTER_SECS)
    }
}

/// Per-member presence record.
///
/// Single-writer: only the member themselves (or the store's on-disconnect
/// hook acting for them) ever writes it, so plain last-writer-wins sets are
/// sufficient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub online: bool,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub typing: Option<TypingState>,
}

impl PresenceRecord {
    /// Record for a member who just came online
    pub fn online_now() -> Self {
        Self {
            online: true,
            last_seen: Utc::now(),
            typing: None,
        }
    }

    /// Record for a member who went (or was marked) offline
    pub fn offline_now() -> Self {
        Self {
            online: false,
            last_seen: Utc::now(),
            typing: None,
        }
    }

    /// The typing indicator, filtered through the reader-side staleness guard
    pub fn fresh_typing(&self, now: DateTime<Utc>) -> Option<&TypingState> {
        self.typing.as_ref().filter(|t| t.is_fresh(now))
    }
}
