//! Domain entities

mod activity;
mod attendance;
mod chat_meta;
mod due;
mod member;
mod message;
mod presence;

pub use activity::{Activity, ActivityKind};
pub use attendance::AttendanceRecord;
pub use chat_meta::ChatMeta;
pub use due::{FeeRecord, FeeStatus};
pub use member::{Member, MemberStatus};
pub use message::{Message, MessageKind, ReplyPreview};
pub use presence::{PresenceRecord, TypingState, TYPING_STALE_AFTER_SECS};
