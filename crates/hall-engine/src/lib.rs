//! # hall-engine
//!
//! The application core: the realtime chat engine (windowed load with
//! incremental merge, send pipeline with unread fan-out, reactions, soft
//! delete, typing, presence), the idempotent fee reconciler, and the thin
//! supporting services (membership directory, attendance recorder, activity
//! log). Everything talks to the realtime tree through the
//! [`hall_store::RealtimeStore`] trait.

pub mod activity_log;
pub mod attendance;
pub mod billing;
pub mod chat;
pub mod members;
pub mod paths;
pub mod session;

pub use activity_log::ActivityLog;
pub use attendance::AttendanceRecorder;
pub use billing::{plan_periods, FeeReconciler, PaymentService, ReconcileOutcome};
pub use chat::{ChatEngine, PresenceList, PresenceTracker, RoomView, TypingIndicator, UnreadCounts};
pub use members::{EnrollMemberRequest, MemberDirectory};
pub use session::await_ready;
