//! # hall-core
//!
//! Domain layer containing entities, value objects, and domain errors for the
//! study-hall membership backend. This crate has zero dependencies on
//! infrastructure (realtime store, async runtime, etc.).

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Activity, ActivityKind, AttendanceRecord, ChatMeta, FeeRecord, FeeStatus, Member,
    MemberStatus, Message, MessageKind, PresenceRecord, ReplyPreview, TypingState,
};
pub use error::DomainError;
pub use value_objects::{
    MemberId, PushId, PushIdGenerator, PushIdParseError, ReceiptGenerator, ReceiptNumber, RoomId,
    RoomIdParseError,
};
