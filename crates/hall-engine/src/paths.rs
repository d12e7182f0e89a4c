//! Tree layout - every path the engine reads or writes
//!
//! One keyspace holds both the realtime data (messages, presence, unread)
//! and the document collections (members, dues, attendance, activities).

use hall_core::value_objects::{MemberId, PushId, RoomId};
use hall_store::TreePath;

/// `messages/{room}` - the append-mostly log of one room
pub fn room_messages(room: &RoomId) -> TreePath {
    TreePath::new("messages").child(&room.to_string())
}

/// `messages/{room}/{push_id}` - one message node
pub fn message(room: &RoomId, id: &PushId) -> TreePath {
    room_messages(room).child(id.as_str())
}

/// `chat_meta/{room}` - denormalized last-message preview
pub fn chat_meta(room: &RoomId) -> TreePath {
    TreePath::new("chat_meta").child(&room.to_string())
}

/// `unread/{member}` - all unread counters of one member
pub fn unread_root(member: &MemberId) -> TreePath {
    TreePath::new("unread").child(member.as_str())
}

/// `unread/{member}/{room}` - one unread counter
pub fn unread_counter(member: &MemberId, room: &RoomId) -> TreePath {
    unread_root(member).child(&room.to_string())
}

/// `presence` - all presence records
pub fn presence_root() -> TreePath {
    TreePath::new("presence")
}

/// `presence/{member}` - one member's presence record
pub fn presence(member: &MemberId) -> TreePath {
    presence_root().child(member.as_str())
}

/// `members` - the member collection
pub fn members_root() -> TreePath {
    TreePath::new("members")
}

/// `members/{id}` - one member document
pub fn member(id: &MemberId) -> TreePath {
    members_root().child(id.as_str())
}

/// `dues` - the fee-record collection
pub fn dues_root() -> TreePath {
    TreePath::new("dues")
}

/// `dues/{id}` - one fee record
pub fn due(id: &PushId) -> TreePath {
    dues_root().child(id.as_str())
}

/// `attendance` - the attendance collection
pub fn attendance_root() -> TreePath {
    TreePath::new("attendance")
}

/// `attendance/{id}` - one attendance record
pub fn attendance(id: &PushId) -> TreePath {
    attendance_root().child(id.as_str())
}

/// `activities` - the audit trail
pub fn activities_root() -> TreePath {
    TreePath::new("activities")
}

/// `activities/{id}` - one audit entry
pub fn activity(id: &PushId) -> TreePath {
    activities_root().child(id.as_str())
}
