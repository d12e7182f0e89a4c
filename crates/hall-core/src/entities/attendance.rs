//! Attendance entity - entry/exit timestamping with duration derivation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MemberId, PushId};

/// One visit: entry stamp, optional exit stamp, derived duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: PushId,
    pub member_id: MemberId,
    pub member_name: String,
    pub date: NaiveDate,
    pub entry_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl AttendanceRecord {
    /// Open a new record at the moment of entry
    pub fn new_entry(
        id: PushId,
        member_id: MemberId,
        member_name: String,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            member_id,
            member_name,
            date: entry_time.date_naive(),
            entry_time,
            exit_time: None,
            duration_minutes: None,
        }
    }

    /// Check if the member has not checked out yet
    #[inline]
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Stamp the exit and derive the visit duration in whole minutes.
    /// An exit before the entry clamps to zero.
    pub fn close(&mut self, exit_time: DateTime<Utc>) {
        self.exit_time = Some(exit_time);
        self.duration_minutes = Some((exit_time - self.entry_time).num_minutes().max(0));
    }
}
