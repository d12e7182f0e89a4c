//! Realtime chat engine
//!
//! Windowed room views with incremental merge, the three-step send
//! pipeline, reaction toggles, soft delete, unread counters, typing
//! indicators, and presence tracking.

mod coalesce;
mod engine;
mod presence;
mod room_view;
mod typing;

pub use coalesce::FlushGate;
pub use engine::{ChatEngine, UnreadCounts};
pub use presence::{PresenceList, PresenceTracker};
pub use room_view::RoomView;
pub use typing::TypingIndicator;
