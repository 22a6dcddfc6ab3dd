//! Manager metrics
//!
//! The counters use Relaxed ordering: they are observational only and do
//! not synchronize any other memory.

use conduit_core::TransferOutcome;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a manager
#[derive(Debug, Default)]
pub(crate) struct MetricCounters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    completed_ok: AtomicU64,
    timed_out: AtomicU64,
    failed: AtomicU64,
    released: AtomicU64,
    unmatched_completions: AtomicU64,
    callback_panics: AtomicU64,
}

impl MetricCounters {
    pub(crate) fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: &TransferOutcome) {
        let counter = match outcome {
            TransferOutcome::Ok => &self.completed_ok,
            TransferOutcome::Timeout => &self.timed_out,
            TransferOutcome::Error(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmatched(&self) {
        self.unmatched_completions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_panic(&self) {
        self.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ManagerMetrics {
        ManagerMetrics {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed_ok: self.completed_ok.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            unmatched_completions: self.unmatched_completions.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of manager activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagerMetrics {
    /// Transactions accepted by submit
    pub submitted: u64,
    /// Submits refused with a configuration error
    pub rejected: u64,
    /// Callbacks delivered with `Ok`
    pub completed_ok: u64,
    /// Callbacks delivered with `Timeout`
    pub timed_out: u64,
    /// Callbacks delivered with `Error`
    pub failed: u64,
    /// Successful releases
    pub released: u64,
    /// Engine completions that matched no tracked transaction
    pub unmatched_completions: u64,
    /// Callbacks that panicked during dispatch
    pub callback_panics: u64,
}

impl ManagerMetrics {
    /// Callbacks delivered, whatever the outcome
    pub fn total_completed(&self) -> u64 {
        self.completed_ok + self.timed_out + self.failed
    }

    /// Submitted transactions without a delivered callback.
    ///
    /// Includes transactions released before completing.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.total_completed())
    }
}
