//! Attendance recorder - entry/exit stamping with duration derivation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use hall_common::{AppError, AppResult};
use hall_core::entities::AttendanceRecord;
use hall_core::error::DomainError;
use hall_core::value_objects::{MemberId, PushIdGenerator};
use hall_store::RealtimeStore;

use crate::paths;

/// Store-backed attendance recorder.
///
/// At most one open record (entry without exit) exists per member per day.
pub struct AttendanceRecorder {
    store: Arc<dyn RealtimeStore>,
    ids: Arc<PushIdGenerator>,
}

impl AttendanceRecorder {
    pub fn new(store: Arc<dyn RealtimeStore>, ids: Arc<PushIdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Stamp an entry for `member` at `now`. Rejected while a record from
    /// the same day is still open.
    #[instrument(skip(self, member_name))]
    pub async fn mark_entry(
        &self,
        member: &MemberId,
        member_name: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceRecord> {
        if self.open_record(member, now).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyCheckedIn));
        }

        let record = AttendanceRecord::new_entry(
            self.ids.generate(),
            member.clone(),
            member_name.to_owned(),
            now,
        );
        self.store
            .write(
                &paths::attendance(&record.id),
                serde_json::to_value(&record)?,
            )
            .await?;
        info!(member = %member, "Entry stamped");
        Ok(record)
    }

    /// Stamp the exit on the member's open record for today and derive the
    /// visit duration.
    #[instrument(skip(self))]
    pub async fn mark_exit(
        &self,
        member: &MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceRecord> {
        let mut record = self
            .open_record(member, now)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::NotCheckedIn))?;

        record.close(now);
        self.store
            .write(
                &paths::attendance(&record.id),
                serde_json::to_value(&record)?,
            )
            .await?;
        info!(member = %member, minutes = record.duration_minutes, "Exit stamped");
        Ok(record)
    }

    /// All records for one day, oldest first
    #[instrument(skip(self))]
    pub async fn records_for_day(
        &self,
        day: chrono::NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        Ok(self
            .all_records()
            .await?
            .into_iter()
            .filter(|record| record.date == day)
            .collect())
    }

    async fn open_record(
        &self,
        member: &MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceRecord>> {
        let today = now.date_naive();
        Ok(self
            .all_records()
            .await?
            .into_iter()
            .find(|record| record.member_id == *member && record.date == today && record.is_open()))
    }

    async fn all_records(&self) -> AppResult<Vec<AttendanceRecord>> {
        let Some(node) = self.store.read(&paths::attendance_root()).await? else {
            return Ok(Vec::new());
        };
        let Some(children) = node.as_object() else {
            return Ok(Vec::new());
        };
        let mut records = Vec::with_capacity(children.len());
        for (key, value) in children {
            match serde_json::from_value::<AttendanceRecord>(value.clone()) {
                Ok(record) => records.push(record),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed attendance record"),
            }
        }
        Ok(records)
    }
}
