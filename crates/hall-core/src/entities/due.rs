//! Fee record entity - one 30-day billing period for one member

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::value_objects::{MemberId, PushId, ReceiptNumber};

/// Payment status of a fee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Paid,
    Overdue,
}

/// Fee record (due) entity.
///
/// Exactly one record exists per (member, 30-day period); periods are
/// contiguous non-overlapping windows anchored at the member's join date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: PushId,
    pub member_id: MemberId,
    pub member_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<ReceiptNumber>,
}

impl FeeRecord {
    /// Create a pending record for one billing period. The due date is the
    /// period end.
    pub fn new_pending(
        id: PushId,
        member_id: MemberId,
        member_name: String,
        period_start: NaiveDate,
        period_end: NaiveDate,
        amount: i64,
    ) -> Self {
        Self {
            id,
            member_id,
            member_name,
            period_start,
            period_end,
            amount,
            due_date: period_end,
            status: FeeStatus::Pending,
            paid_date: None,
            receipt_number: None,
        }
    }

    /// Check if the record has been paid
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == FeeStatus::Paid
    }

    /// Mark the record paid, stamping the payment date and receipt
    pub fn mark_paid(&mut self, paid_date: NaiveDate, receipt: ReceiptNumber) {
        self.status = FeeStatus::Paid;
        self.paid_date = Some(paid_date);
        self.receipt_number = Some(receipt);
    }

    /// Status as of `today`: a pending record past its due date reports as
    /// overdue without being rewritten in the store.
    pub fn effective_status(&self, today: NaiveDate) -> FeeStatus {
        match self.status {
            FeeStatus::Pending if self.due_date < today => FeeStatus::Overdue,
            other => other,
        }
    }
}
