//! Member entity - an enrolled member of the study hall

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::MemberId;

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

/// Member entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: MemberStatus,
    /// Date the membership started; billing anchors here when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    /// Fee per 30-day billing period, in currency minor units
    pub monthly_fee: i64,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Create a new active member
    pub fn new(
        id: MemberId,
        name: String,
        email: String,
        phone: Option<String>,
        join_date: Option<NaiveDate>,
        monthly_fee: i64,
    ) -> Self {
        Self {
            id,
            name,
            email,
            phone,
            status: MemberStatus::Active,
            join_date,
            monthly_fee,
            created_at: Utc::now(),
        }
    }

    /// Check if the member is active
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Deactivate the member (membership is kept, billing stops)
    pub fn deactivate(&mut self) {
        self.status = MemberStatus::Inactive;
    }

    /// The date billing periods are anchored at: the join date, falling back
    /// to the account-creation date when no join date was recorded.
    pub fn billing_anchor(&self) -> NaiveDate {
        self.join_date.unwrap_or_else(|| self.created_at.date_naive())
    }
}
