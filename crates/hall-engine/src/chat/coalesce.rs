//! Bounded-latency batching for bursty event feeds
//!
//! A roster-wide presence change (everyone reconnecting after a network
//! blip, say) arrives as one child event per member. Publishing each one
//! individually would redraw the list once per member; batching them behind
//! a flush deadline caps the redraw rate while keeping worst-case latency
//! at one flush interval.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Deadline tracker for a coalesced publisher.
///
/// `mark_dirty` arms the deadline on the first unflushed change and leaves
/// it alone on subsequent ones, so a continuous stream of events cannot
/// starve the flush.
#[derive(Debug)]
pub struct FlushGate {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FlushGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Note an unflushed change
    pub fn mark_dirty(&mut self) {
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.interval);
        }
    }

    /// Whether anything is waiting to be flushed
    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending deadline; the caller flushes now
    pub fn take(&mut self) {
        self.deadline = None;
    }

    /// Wait until the armed deadline. Pending forever while clean, which
    /// makes this safe to use as a `select!` branch guarded by `is_dirty`.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
