//! Value objects - immutable domain primitives

mod member_id;
mod push_id;
mod receipt;
mod room;

pub use member_id::MemberId;
pub use push_id::{PushId, PushIdGenerator, PushIdParseError};
pub use receipt::{ReceiptGenerator, ReceiptNumber};
pub use room::{RoomId, RoomIdParseError};
