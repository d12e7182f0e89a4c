//! End-to-end billing tests
//!
//! Enrollment through the directory, reconciliation, and payment against
//! one shared in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use integration_tests::{unique_enrollment, FlakyStore, TestBackend};

use hall_core::entities::FeeStatus;
use hall_engine::ReconcileOutcome;
use hall_store::MemoryStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Scenario: joined 2024-01-01, reconciled on 2024-03-15. Exactly two
/// periods are due, the second ending on the leap day.
#[tokio::test]
async fn test_catch_up_creates_exact_periods() {
    let backend = TestBackend::new();
    let member = backend
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();

    let outcome = backend.reconciler.reconcile(date(2024, 3, 15)).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Completed {
            created: 2,
            failed_members: 0
        }
    );

    let dues = backend.reconciler.dues_for(&member.id).await.unwrap();
    assert_eq!(dues.len(), 2);
    assert_eq!(
        (dues[0].period_start, dues[0].period_end),
        (date(2024, 1, 1), date(2024, 1, 30))
    );
    assert_eq!(
        (dues[1].period_start, dues[1].period_end),
        (date(2024, 1, 31), date(2024, 2, 29))
    );
    assert!(dues.iter().all(|due| due.status == FeeStatus::Pending));
    assert!(dues.iter().all(|due| due.amount == 50_000));
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let backend = TestBackend::new();
    let member = backend
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();

    for _ in 0..3 {
        backend.reconciler.reconcile(date(2024, 3, 15)).await.unwrap();
    }
    let dues = backend.reconciler.dues_for(&member.id).await.unwrap();
    assert_eq!(dues.len(), 2, "repeat passes create nothing new");
}

#[tokio::test]
async fn test_grace_period_boundary() {
    let backend = TestBackend::new();
    let member = backend
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();

    backend.reconciler.reconcile(date(2024, 1, 30)).await.unwrap();
    assert!(
        backend
            .reconciler
            .dues_for(&member.id)
            .await
            .unwrap()
            .is_empty(),
        "29 days elapsed: still in grace"
    );

    backend.reconciler.reconcile(date(2024, 1, 31)).await.unwrap();
    assert_eq!(
        backend.reconciler.dues_for(&member.id).await.unwrap().len(),
        1,
        "30 days elapsed: first period billed"
    );
}

#[tokio::test]
async fn test_later_pass_extends_without_overlap() {
    let backend = TestBackend::new();
    let member = backend
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();

    backend.reconciler.reconcile(date(2024, 2, 15)).await.unwrap();
    backend.reconciler.reconcile(date(2024, 5, 1)).await.unwrap();

    let dues = backend.reconciler.dues_for(&member.id).await.unwrap();
    assert_eq!(dues.len(), 4);
    for pair in dues.windows(2) {
        assert_eq!(
            pair[0].period_end + chrono::Duration::days(1),
            pair[1].period_start,
            "periods stay contiguous across passes"
        );
    }
}

/// One member's store failures are logged and isolated; everyone else is
/// billed normally.
#[tokio::test]
async fn test_member_failure_is_isolated() {
    let inner = Arc::new(MemoryStore::new());
    // Enroll through a clean backend first so both members exist.
    let clean = TestBackend::over(inner.clone());
    let healthy = clean
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();
    let poisoned = clean
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();

    let flaky = TestBackend::over(Arc::new(FlakyStore::poisoning(inner, &poisoned.id)));
    let outcome = flaky.reconciler.reconcile(date(2024, 3, 15)).await.unwrap();
    let ReconcileOutcome::Completed {
        created,
        failed_members,
    } = outcome
    else {
        panic!("pass should run");
    };
    assert_eq!(failed_members, 1);
    assert!(created >= 2, "healthy member fully billed");

    let dues = flaky.reconciler.dues_for(&healthy.id).await.unwrap();
    assert_eq!(dues.len(), 2);
}

#[tokio::test]
async fn test_payment_flow() {
    let backend = TestBackend::new();
    let member = backend
        .directory
        .enroll(unique_enrollment(Some(date(2024, 1, 1))))
        .await
        .unwrap();
    backend.reconciler.reconcile(date(2024, 3, 15)).await.unwrap();

    let dues = backend.reconciler.dues_for(&member.id).await.unwrap();
    let first = &dues[0];

    // The first period is past its due date by March.
    let overdue = backend.payments.overdue(date(2024, 3, 15)).await.unwrap();
    assert!(overdue.iter().any(|due| due.id == first.id));

    let paid = backend
        .payments
        .record_payment(&first.id, date(2024, 3, 16))
        .await
        .unwrap();
    assert_eq!(paid.status, FeeStatus::Paid);
    assert!(paid.receipt_number.is_some());

    // Paying twice is rejected; the paid record leaves the overdue list.
    let err = backend
        .payments
        .record_payment(&first.id, date(2024, 3, 17))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DUE_ALREADY_PAID");
    let overdue = backend.payments.overdue(date(2024, 3, 17)).await.unwrap();
    assert!(overdue.iter().all(|due| due.id != first.id));
}
