//! Payment recording - marks dues paid and issues receipts

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use hall_common::{AppError, AppResult};
use hall_core::entities::{ActivityKind, FeeRecord, FeeStatus};
use hall_core::error::DomainError;
use hall_core::value_objects::{PushId, ReceiptGenerator};
use hall_store::RealtimeStore;

use crate::activity_log::ActivityLog;
use crate::paths;

/// Records payments against fee records.
pub struct PaymentService {
    store: Arc<dyn RealtimeStore>,
    receipts: Arc<ReceiptGenerator>,
    activity: Arc<ActivityLog>,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        receipts: Arc<ReceiptGenerator>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            store,
            receipts,
            activity,
        }
    }

    /// Mark a due paid as of `today`, issuing a receipt and writing an
    /// audit entry. Paying an already-paid due is rejected.
    #[instrument(skip(self), fields(due = %due_id))]
    pub async fn record_payment(&self, due_id: &PushId, today: NaiveDate) -> AppResult<FeeRecord> {
        let path = paths::due(due_id);
        let node = self
            .store
            .read(&path)
            .await?
            .ok_or_else(|| DomainError::DueNotFound(due_id.clone()))?;
        let mut due: FeeRecord = serde_json::from_value(node)?;
        if due.is_paid() {
            return Err(AppError::Domain(DomainError::DueAlreadyPaid));
        }

        due.mark_paid(today, self.receipts.issue());
        self.store
            .write(&path, serde_json::to_value(&due)?)
            .await?;

        info!(member = %due.member_id, amount = due.amount, "Payment recorded");
        self.activity
            .record(
                ActivityKind::PaymentRecorded,
                due.member_id.clone(),
                due.member_name.clone(),
                format!(
                    "paid {} for {}..{}",
                    due.amount, due.period_start, due.period_end
                ),
            )
            .await;
        Ok(due)
    }

    /// Dues that are effectively overdue as of `today`. Pending records past
    /// their due date report as overdue; nothing is rewritten in the store.
    #[instrument(skip(self))]
    pub async fn overdue(&self, today: NaiveDate) -> AppResult<Vec<FeeRecord>> {
        let Some(node) = self.store.read(&paths::dues_root()).await? else {
            return Ok(Vec::new());
        };
        let Some(children) = node.as_object() else {
            return Ok(Vec::new());
        };
        let mut overdue = Vec::new();
        for value in children.values() {
            if let Ok(due) = serde_json::from_value::<FeeRecord>(value.clone()) {
                if due.effective_status(today) == FeeStatus::Overdue {
                    overdue.push(due);
                }
            }
        }
        overdue.sort_by_key(|due| due.due_date);
        Ok(overdue)
    }
}
