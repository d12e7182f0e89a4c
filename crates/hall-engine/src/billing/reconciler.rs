//! Fee reconciler - closes the gap between elapsed time and billed periods
//!
//! Runs on demand (typically at admin sign-in). For every active member it
//! proposes consecutive 30-day periods from the last billed period end up to
//! today and creates a pending fee record for each, skipping anything that
//! already exists. Safe to run any number of times: a second pass over the
//! same state creates nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{info, instrument, warn};

use hall_common::AppResult;
use hall_core::entities::{FeeRecord, Member};
use hall_core::value_objects::{MemberId, PushIdGenerator};
use hall_store::RealtimeStore;

use crate::paths;

/// Billing periods a member is missing as of `today`.
///
/// Pure planning half of the reconciler, separated from the store writes:
///
/// - anchor = join date (the caller falls back to the creation date);
/// - members enrolled less than one period ago are left alone (grace);
/// - the latest existing period end seeds the walk; with no existing dues
///   the walk starts so that the first period begins on the anchor itself;
/// - a proposed period whose start or end collides with any existing record
///   aborts the member's walk (conservative duplicate guard).
pub fn plan_periods(
    anchor: NaiveDate,
    existing: &[FeeRecord],
    today: NaiveDate,
    period_days: i64,
) -> Vec<(NaiveDate, NaiveDate)> {
    if (today - anchor).num_days() < period_days {
        return Vec::new();
    }

    let mut latest_end = existing
        .iter()
        .map(|due| due.period_end)
        .max()
        .unwrap_or(anchor - Duration::days(1));

    let mut planned = Vec::new();
    while (today - latest_end).num_days() >= period_days {
        let start = latest_end + Duration::days(1);
        let end = latest_end + Duration::days(period_days);
        let collides = existing
            .iter()
            .any(|due| due.period_start == start || due.period_end == end);
        if collides {
            warn!(%start, %end, "Planned period collides with an existing record; stopping");
            break;
        }
        planned.push((start, end));
        latest_end = end;
    }
    planned
}

/// Result of one reconciliation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Another pass was already in flight; this trigger was dropped, not
    /// queued
    AlreadyRunning,
    Completed {
        /// Fee records created across all members
        created: usize,
        /// Members whose pass failed (logged, others unaffected)
        failed_members: usize,
    },
}

/// Store-backed reconciler with a single-flight guard.
pub struct FeeReconciler {
    store: Arc<dyn RealtimeStore>,
    ids: Arc<PushIdGenerator>,
    period_days: i64,
    in_flight: AtomicBool,
}

/// Clears the single-flight flag when the pass ends, on every exit path.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FeeReconciler {
    pub fn new(store: Arc<dyn RealtimeStore>, ids: Arc<PushIdGenerator>, period_days: i64) -> Self {
        Self {
            store,
            ids,
            period_days,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation pass as of `today`.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, today: NaiveDate) -> AppResult<ReconcileOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Reconciliation already in flight; ignoring trigger");
            return Ok(ReconcileOutcome::AlreadyRunning);
        }
        let _guard = PassGuard(&self.in_flight);

        let members = self.load_members().await?;
        let all_dues = self.load_dues().await?;

        let mut created = 0;
        let mut failed_members = 0;
        for member in members.iter().filter(|m| m.is_active()) {
            let existing: Vec<&FeeRecord> = all_dues
                .iter()
                .filter(|due| due.member_id == member.id)
                .collect();
            match self.reconcile_member(member, &existing, today).await {
                Ok(n) => created += n,
                Err(e) => {
                    warn!(member = %member.id, error = %e, "Reconciliation failed for member");
                    failed_members += 1;
                }
            }
        }

        info!(created, failed_members, "Reconciliation pass finished");
        Ok(ReconcileOutcome::Completed {
            created,
            failed_members,
        })
    }

    async fn reconcile_member(
        &self,
        member: &Member,
        existing: &[&FeeRecord],
        today: NaiveDate,
    ) -> AppResult<usize> {
        let owned: Vec<FeeRecord> = existing.iter().map(|due| (*due).clone()).collect();
        let planned = plan_periods(member.billing_anchor(), &owned, today, self.period_days);

        for &(start, end) in &planned {
            let record = FeeRecord::new_pending(
                self.ids.generate(),
                member.id.clone(),
                member.name.clone(),
                start,
                end,
                member.monthly_fee,
            );
            self.store
                .write(&paths::due(&record.id), serde_json::to_value(&record)?)
                .await?;
        }
        Ok(planned.len())
    }

    async fn load_members(&self) -> AppResult<Vec<Member>> {
        let Some(node) = self.store.read(&paths::members_root()).await? else {
            return Ok(Vec::new());
        };
        Ok(parse_collection(node, "member"))
    }

    async fn load_dues(&self) -> AppResult<Vec<FeeRecord>> {
        let Some(node) = self.store.read(&paths::dues_root()).await? else {
            return Ok(Vec::new());
        };
        Ok(parse_collection(node, "fee record"))
    }

    /// All fee records of one member, for screens and tests
    pub async fn dues_for(&self, member: &MemberId) -> AppResult<Vec<FeeRecord>> {
        let mut dues: Vec<FeeRecord> = self
            .load_dues()
            .await?
            .into_iter()
            .filter(|due| due.member_id == *member)
            .collect();
        dues.sort_by_key(|due| due.period_start);
        Ok(dues)
    }
}

/// Deserialize every child of a collection node, skipping damaged entries.
fn parse_collection<T: serde::de::DeserializeOwned>(node: serde_json::Value, what: &str) -> Vec<T> {
    let Some(children) = node.as_object() else {
        warn!(what, "Collection node is not an object");
        return Vec::new();
    };
    let mut parsed = Vec::with_capacity(children.len());
    for (key, value) in children {
        match serde_json::from_value(value.clone()) {
            Ok(item) => parsed.push(item),
            Err(e) => warn!(what, key = %key, error = %e, "Skipping malformed record"),
        }
    }
    parsed
}
