//! Billing - the 30-day fee reconciler and payment recording

mod payments;
mod reconciler;

pub use payments::PaymentService;
pub use reconciler::{plan_periods, FeeReconciler, ReconcileOutcome};
