//! Transaction records
//!
//! A [`Transaction`] is the manager's bookkeeping for one submitted request.
//! It is owned exclusively by the manager's table; callers only ever see its
//! [`TransactionHandle`] and, during completion, a [`TransactionView`].

use conduit_core::{Method, TransactionHandle, TransferId, TransferOutcome};
use std::fmt;
use std::time::{Duration, Instant};

/// Completion callback
///
/// Runs exactly once, on the thread that called `poll`, with a view of the
/// finished transaction and the response body (empty when none was read).
pub type ResultCallback = Box<dyn FnOnce(&TransactionView, &[u8]) + Send + 'static>;

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Pending` → `Completed` (terminal result observed by poll)
///
/// `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// The engine is still driving the transfer
    Pending,
    /// Outcome recorded and callback delivered
    Completed,
}

impl TransactionStatus {
    /// True for `Completed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed)
    }
}

/// Read-only view handed to callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionView {
    /// Handle returned by submit
    pub handle: TransactionHandle,
    /// Classified result
    pub outcome: TransferOutcome,
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: String,
    /// Time from submit to the poll that observed completion
    pub elapsed: Duration,
}

/// Error returned for an illegal state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    /// Transaction concerned
    pub handle: TransactionHandle,
    /// Status it was in
    pub from: TransactionStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot complete {} from state {:?}",
            self.handle, self.from
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// One submitted, not-yet-released request
///
/// Invariant: `result.is_some()` exactly when `status == Completed`.
pub struct Transaction {
    handle: TransactionHandle,
    transfer: TransferId,
    method: Method,
    url: String,
    callback: Option<ResultCallback>,
    status: TransactionStatus,
    result: Option<TransferOutcome>,
    submitted_at: Instant,
}

impl Transaction {
    /// New pending transaction
    pub fn new(
        handle: TransactionHandle,
        transfer: TransferId,
        method: Method,
        url: String,
        callback: ResultCallback,
    ) -> Self {
        Self {
            handle,
            transfer,
            method,
            url,
            callback: Some(callback),
            status: TransactionStatus::Pending,
            result: None,
            submitted_at: Instant::now(),
        }
    }

    /// Same transaction under another handle (handle collision after wraparound)
    pub(crate) fn with_handle(mut self, handle: TransactionHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Caller-facing handle
    pub fn handle(&self) -> TransactionHandle {
        self.handle
    }

    /// Engine-side transfer
    pub fn transfer(&self) -> TransferId {
        self.transfer
    }

    /// Request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Outcome, once completed
    pub fn result(&self) -> Option<TransferOutcome> {
        self.result
    }

    /// Check if transaction is pending
    pub fn is_pending(&self) -> bool {
        matches!(self.status, TransactionStatus::Pending)
    }

    /// Check if transaction is completed
    pub fn is_completed(&self) -> bool {
        matches!(self.status, TransactionStatus::Completed)
    }

    /// Time since submit
    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    /// Take the callback out for dispatch. Yields it at most once.
    pub fn take_callback(&mut self) -> Option<ResultCallback> {
        self.callback.take()
    }

    /// True once the callback has been taken for dispatch
    pub fn is_dispatched(&self) -> bool {
        self.callback.is_none()
    }

    /// View passed to the callback for `outcome`
    pub fn view(&self, outcome: TransferOutcome) -> TransactionView {
        TransactionView {
            handle: self.handle,
            outcome,
            method: self.method,
            url: self.url.clone(),
            elapsed: self.elapsed(),
        }
    }

    /// Record the outcome and transition to `Completed`
    ///
    /// # Errors
    /// Returns [`InvalidTransition`] if already completed.
    ///
    /// # State Transition
    /// `Pending` → `Completed`
    pub fn mark_completed(&mut self, outcome: TransferOutcome) -> Result<(), InvalidTransition> {
        match self.status {
            TransactionStatus::Pending => {
                self.result = Some(outcome);
                self.status = TransactionStatus::Completed;
                Ok(())
            }
            from => Err(InvalidTransition {
                handle: self.handle,
                from,
            }),
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("handle", &self.handle)
            .field("transfer", &self.transfer)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("dispatched", &self.is_dispatched())
            .field("status", &self.status)
            .field("result", &self.result)
            .finish()
    }
}
