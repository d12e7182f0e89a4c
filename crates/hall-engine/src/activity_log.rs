//! Activity log - append-only audit trail of administrative actions

use std::sync::Arc;

use tracing::{instrument, warn};

use hall_common::AppResult;
use hall_core::entities::{Activity, ActivityKind};
use hall_core::value_objects::{MemberId, PushIdGenerator};
use hall_store::RealtimeStore;

use crate::paths;

/// Writer/reader for the audit trail.
///
/// Writes are best-effort: a failed audit write is logged but never fails
/// the operation it documents.
pub struct ActivityLog {
    store: Arc<dyn RealtimeStore>,
    ids: Arc<PushIdGenerator>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn RealtimeStore>, ids: Arc<PushIdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Append an entry about `member`. Failures are logged and swallowed.
    pub async fn record(
        &self,
        kind: ActivityKind,
        member_id: MemberId,
        member_name: String,
        detail: impl Into<String>,
    ) {
        let entry = Activity::for_member(
            self.ids.generate(),
            kind,
            member_id,
            member_name,
            detail.into(),
        );
        let path = paths::activity(&entry.id);
        match serde_json::to_value(&entry) {
            Ok(value) => {
                if let Err(e) = self.store.write(&path, value).await {
                    warn!(error = %e, kind = ?kind, "Failed to write activity entry");
                }
            }
            Err(e) => warn!(error = %e, kind = ?kind, "Failed to serialize activity entry"),
        }
    }

    /// The most recent `limit` entries, newest last.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: usize) -> AppResult<Vec<Activity>> {
        let children = self
            .store
            .read_window(&paths::activities_root(), limit)
            .await?;
        let mut entries = Vec::with_capacity(children.len());
        for (key, value) in children {
            match serde_json::from_value(value) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed activity entry"),
            }
        }
        Ok(entries)
    }
}
