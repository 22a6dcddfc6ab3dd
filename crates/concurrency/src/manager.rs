//! Transaction manager for asynchronous HTTP transfers
//!
//! Accepts request descriptions from any thread, hands them to a
//! [`TransferEngine`], and reports each transaction's outcome exactly once
//! through its callback when the driver thread polls.
//!
//! ## Poll Sequence
//!
//! ```text
//! 1. try_lock(poll_guard)        - a concurrent or re-entrant poll returns at once
//! 2. lock(state)
//!    a. swap intake, register each still-tracked transfer with the engine
//!    b. engine.step()           - non-blocking I/O
//!    c. engine.drain_completed() and match each transfer to its handle
//!    d. classify code -> outcome, take the callback out of the transaction
//! 3. unlock(state)
//! 4. invoke callbacks on this thread (panics are caught and counted)
//! 5. lock(state), mark each still-tracked transaction Completed, unlock
//! ```
//!
//! Success and failure completions take exactly the same path.
//!
//! ## Locking
//!
//! One table-wide lock guards the table, the engine and the intake queue.
//! Callbacks run with the lock released, so a callback may submit, query or
//! release (even its own handle) without deadlocking. A transaction stays
//! `Pending` while its callback runs and becomes `Completed` in step 5,
//! which keeps `result.is_some() ⇔ Completed` true at every instant. If the
//! transaction is released while its callback runs, the callback still runs
//! exactly once and step 5 skips it.
//!
//! Callbacks run on the polling thread: a callback that blocks delays every
//! other completion reported by the same poll.
//!
//! ## Unknown Handles
//!
//! `is_completed` answers `true` for handles that are not tracked (released
//! or never issued) so a polling loop on a released handle terminates. It
//! must not be used to ask whether a handle was ever valid.

use crate::handle::HandleAllocator;
use crate::intake::IntakeQueue;
use crate::metrics::{ManagerMetrics, MetricCounters};
use crate::table::TransactionTable;
use crate::transaction::{ResultCallback, Transaction, TransactionStatus, TransactionView};
use bytes::Bytes;
use conduit_core::{
    Error, RequestSpec, Result, TransactionHandle, TransferCode, TransferId, TransferOutcome,
};
use conduit_engine::{Completion, TransferEngine};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// State guarded by the table-wide lock
struct ManagerState<E> {
    table: TransactionTable,
    engine: E,
    /// Transfers created by submit, waiting to be registered by poll
    intake: IntakeQueue<TransferId>,
}

/// A completion ready to be delivered outside the lock
struct Dispatch {
    transfer: TransferId,
    view: TransactionView,
    body: Bytes,
    callback: ResultCallback,
}

/// What one call to [`TransactionManager::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    /// Transfers handed to the engine
    pub registered: usize,
    /// Callbacks invoked
    pub dispatched: usize,
    /// Engine completions that matched no tracked transaction
    pub unmatched: usize,
    /// True if another poll was already running and this one did nothing
    pub skipped: bool,
}

/// Manages transaction lifecycle over a transfer engine
///
/// All state lives in the instance: handle counter, table, engine and
/// metrics. Share it between threads with `Arc`.
pub struct TransactionManager<E: TransferEngine> {
    allocator: HandleAllocator,
    state: Mutex<ManagerState<E>>,
    /// Serializes poll; held for the whole poll including dispatch
    poll_guard: Mutex<()>,
    metrics: MetricCounters,
}

impl<E: TransferEngine> TransactionManager<E> {
    /// Create a manager driving `engine`
    pub fn new(engine: E) -> Self {
        Self::with_allocator(engine, HandleAllocator::new())
    }

    /// Create a manager with a specific handle allocator
    ///
    /// Used to resume handle numbering or to exercise wraparound.
    pub fn with_allocator(engine: E, allocator: HandleAllocator) -> Self {
        Self {
            allocator,
            state: Mutex::new(ManagerState {
                table: TransactionTable::new(),
                engine,
                intake: IntakeQueue::new(),
            }),
            poll_guard: Mutex::new(()),
            metrics: MetricCounters::default(),
        }
    }

    /// Submit a request
    ///
    /// Validates `spec`, has the engine create the transfer, tracks a new
    /// `Pending` transaction and returns its handle. The transfer starts
    /// moving on the next poll. Never waits on network I/O.
    ///
    /// # Errors
    /// `Error::Configuration` if the spec is invalid or the engine refuses
    /// the transfer. Nothing is tracked in that case.
    pub fn submit<F>(&self, spec: RequestSpec, callback: F) -> Result<TransactionHandle>
    where
        F: FnOnce(&TransactionView, &[u8]) + Send + 'static,
    {
        if let Err(e) = spec.validate() {
            self.metrics.record_rejected();
            debug!(target: "conduit::txn", error = %e, "Submit rejected");
            return Err(e);
        }

        let mut state = self.state.lock();
        let created = state.engine.create_transfer(&spec);
        let transfer = match created {
            Ok(transfer) => transfer,
            Err(e) => {
                drop(state);
                self.metrics.record_rejected();
                debug!(target: "conduit::txn", url = spec.url(), error = %e, "Engine refused transfer");
                return Err(match e {
                    Error::Configuration(_) => e,
                    other => Error::configuration(other.to_string()),
                });
            }
        };

        let mut txn = Transaction::new(
            self.allocator.allocate(),
            transfer,
            spec.method(),
            spec.url().to_owned(),
            Box::new(callback),
        );
        let handle = loop {
            let handle = txn.handle();
            match state.table.insert(txn) {
                Ok(()) => break handle,
                Err(rejected) => {
                    warn!(target: "conduit::txn", handle = %handle, "Handle still in use after wraparound, reallocating");
                    txn = rejected.with_handle(self.allocator.allocate());
                }
            }
        };
        state.intake.push(transfer);
        drop(state);

        self.metrics.record_submit();
        debug!(
            target: "conduit::txn",
            handle = %handle,
            method = %spec.method(),
            url = spec.url(),
            "Transaction submitted"
        );
        Ok(handle)
    }

    /// Drive the engine and deliver completions
    ///
    /// Registers newly submitted transfers, advances the engine without
    /// blocking, and invokes the callback of every transaction that reached
    /// a terminal state, in the order the engine reports them. Callbacks run
    /// synchronously on the calling thread.
    ///
    /// Meant to be called from one driver thread. A call made while another
    /// poll is in progress (from another thread, or from inside a callback)
    /// returns immediately with `skipped` set.
    pub fn poll(&self) -> PollReport {
        let Some(_driver) = self.poll_guard.try_lock() else {
            trace!(target: "conduit::txn", "Poll already in progress, skipping");
            return PollReport {
                skipped: true,
                ..PollReport::default()
            };
        };

        let mut report = PollReport::default();
        let dispatches = self.collect_completions(&mut report);

        let mut delivered = Vec::with_capacity(dispatches.len());
        for dispatch in dispatches {
            let Dispatch {
                transfer,
                view,
                body,
                callback,
            } = dispatch;
            self.metrics.record_outcome(&view.outcome);

            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(&view, &body)));
            if let Err(payload) = result {
                self.metrics.record_callback_panic();
                error!(
                    target: "conduit::txn",
                    handle = %view.handle,
                    "Completion callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }

            report.dispatched += 1;
            delivered.push((view.handle, transfer, view.outcome));
        }

        if !delivered.is_empty() {
            let mut state = self.state.lock();
            for (handle, transfer, outcome) in delivered {
                match state.table.get_mut(handle) {
                    Some(txn) if txn.transfer() == transfer => {
                        if let Err(e) = txn.mark_completed(outcome) {
                            warn!(target: "conduit::txn", error = %e, "Completion recorded twice");
                        }
                    }
                    _ => {
                        debug!(target: "conduit::txn", handle = %handle, "Released during dispatch");
                    }
                }
            }
        }

        report
    }

    /// Steps 2a-2d of the poll sequence, under the table lock
    fn collect_completions(&self, report: &mut PollReport) -> Vec<Dispatch> {
        let mut state = self.state.lock();
        let ManagerState {
            table,
            engine,
            intake,
        } = &mut *state;

        let mut refused = Vec::new();
        for transfer in intake.swap() {
            // Released before it was ever registered
            if !table.tracks_transfer(transfer) {
                continue;
            }
            match engine.register(transfer) {
                Ok(()) => report.registered += 1,
                Err(e) => {
                    warn!(target: "conduit::txn", transfer = %transfer, error = %e, "Engine refused registration");
                    engine.abort(transfer);
                    refused.push(Completion::without_body(
                        transfer,
                        TransferCode::Rejected {
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        engine.step();

        let mut dispatches = Vec::new();
        for completion in refused.into_iter().chain(engine.drain_completed()) {
            let matched = table
                .handle_for_transfer(completion.transfer)
                .and_then(|handle| table.get_mut(handle));
            let Some(txn) = matched else {
                report.unmatched += 1;
                self.metrics.record_unmatched();
                warn!(
                    target: "conduit::txn",
                    transfer = %completion.transfer,
                    "Completion for untracked transfer ignored"
                );
                continue;
            };
            let Some(callback) = txn.take_callback() else {
                report.unmatched += 1;
                self.metrics.record_unmatched();
                warn!(
                    target: "conduit::txn",
                    handle = %txn.handle(),
                    "Duplicate completion ignored"
                );
                continue;
            };

            let outcome = TransferOutcome::from_code(&completion.code);
            trace!(target: "conduit::txn", handle = %txn.handle(), code = ?completion.code, "Transfer finished");
            dispatches.push(Dispatch {
                transfer: completion.transfer,
                view: txn.view(outcome),
                body: completion.body,
                callback,
            });
        }
        dispatches
    }

    /// True unless the handle maps to a `Pending` transaction
    ///
    /// Unknown handles (released or never issued) read as completed.
    pub fn is_completed(&self, handle: TransactionHandle) -> bool {
        self.state
            .lock()
            .table
            .get(handle)
            .map_or(true, |txn| txn.is_completed())
    }

    /// Stop tracking a transaction and free its engine transfer
    ///
    /// Returns false if the handle was not tracked. Releasing a pending
    /// transaction aborts its transfer and drops its callback uninvoked.
    pub fn release(&self, handle: TransactionHandle) -> bool {
        let mut state = self.state.lock();
        let Some(txn) = state.table.remove(handle) else {
            trace!(target: "conduit::txn", handle = %handle, "Release of untracked handle");
            return false;
        };
        let ManagerState { engine, intake, .. } = &mut *state;
        intake.remove_where(|transfer| *transfer == txn.transfer());
        engine.abort(txn.transfer());
        drop(state);

        self.metrics.record_release();
        debug!(
            target: "conduit::txn",
            handle = %handle,
            status = ?txn.status(),
            "Transaction released"
        );
        true
    }

    /// Outcome of a completed transaction
    pub fn outcome(&self, handle: TransactionHandle) -> Option<TransferOutcome> {
        self.state.lock().table.get(handle).and_then(|txn| txn.result())
    }

    /// Status of a tracked transaction, `None` if untracked
    pub fn status(&self, handle: TransactionHandle) -> Option<TransactionStatus> {
        self.state.lock().table.get(handle).map(|txn| txn.status())
    }

    /// Tracked transactions, pending or completed
    pub fn tracked(&self) -> usize {
        self.state.lock().table.len()
    }

    /// Tracked transactions still pending
    pub fn pending(&self) -> usize {
        self.state.lock().table.pending_count()
    }

    /// Snapshot of activity counters
    pub fn metrics(&self) -> ManagerMetrics {
        self.metrics.snapshot()
    }

    /// Poll until every handle reads as completed or `timeout` elapses
    ///
    /// Sleeps `interval` between polls. Returns true if all completed.
    pub fn poll_until(
        &self,
        handles: &[TransactionHandle],
        timeout: Duration,
        interval: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if handles.iter().all(|handle| self.is_completed(*handle)) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(interval);
        }
    }

    /// Inspect the engine under the table lock
    ///
    /// `f` must not call back into this manager.
    pub fn with_engine<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.state.lock().engine)
    }

    /// Mutate the engine under the table lock
    ///
    /// `f` must not call back into this manager.
    pub fn with_engine_mut<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.state.lock().engine)
    }
}

impl<E: TransferEngine> Drop for TransactionManager<E> {
    fn drop(&mut self) {
        let ManagerState {
            table,
            engine,
            intake,
        } = self.state.get_mut();
        intake.swap().for_each(drop);

        let mut abandoned = 0usize;
        for txn in table.drain() {
            if txn.is_pending() {
                abandoned += 1;
            }
            engine.abort(txn.transfer());
        }
        if abandoned > 0 {
            debug!(target: "conduit::txn", abandoned, "Manager dropped with pending transactions");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}
