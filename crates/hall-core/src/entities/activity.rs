//! Activity entity - audit trail of administrative actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MemberId, PushId};

/// Kind of audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    MemberEnrolled,
    MemberDeactivated,
    MemberRemoved,
    PaymentRecorded,
}

/// Audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: PushId,
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    /// Create an entry about a specific member
    pub fn for_member(
        id: PushId,
        kind: ActivityKind,
        member_id: MemberId,
        member_name: String,
        detail: String,
    ) -> Self {
        Self {
            id,
            kind,
            member_id: Some(member_id),
            member_name: Some(member_name),
            detail,
            timestamp: Utc::now(),
        }
    }
}
