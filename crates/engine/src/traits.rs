//! The transfer engine contract
//!
//! A [`TransferEngine`] performs the actual network I/O for many transfers at
//! once. The manager treats it as an opaque capability: create a transfer
//! from a request description, hand it over to be driven, advance it without
//! blocking, and read back terminal results exactly once.
//!
//! ## Transfer lifecycle
//!
//! ```text
//! create_transfer() -> Created --register()--> Driven --(terminal)--> drained once
//!                          \                      |
//!                           +------ abort() ------+--> gone, never drained
//! ```

use bytes::Bytes;
use conduit_core::{RequestSpec, Result, TransferCode, TransferId};

/// One transfer that reached a terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Transfer that finished
    pub transfer: TransferId,
    /// Engine result code
    pub code: TransferCode,
    /// Response body, empty when no response was read
    pub body: Bytes,
}

impl Completion {
    /// Completion without a body
    pub fn without_body(transfer: TransferId, code: TransferCode) -> Self {
        Self {
            transfer,
            code,
            body: Bytes::new(),
        }
    }
}

/// Non-blocking driver for many simultaneous transfers
///
/// Implementations must uphold:
/// - every registered transfer is drained at most once
/// - an aborted transfer is never drained afterwards
/// - `step` and `drain_completed` never wait on network I/O
pub trait TransferEngine: Send {
    /// Configure a transfer for `spec` without starting it.
    ///
    /// # Errors
    /// `Error::Configuration` if the spec cannot be expressed as a transfer
    /// or the engine is out of resources.
    fn create_transfer(&mut self, spec: &RequestSpec) -> Result<TransferId>;

    /// Add a created transfer to the set being driven.
    ///
    /// # Errors
    /// Fails for unknown or already-registered transfers, or when the engine
    /// can no longer drive I/O.
    fn register(&mut self, id: TransferId) -> Result<()>;

    /// Advance all registered transfers as far as possible without waiting.
    fn step(&mut self);

    /// Terminal transfers observed since the previous call.
    fn drain_completed(&mut self) -> Vec<Completion>;

    /// Stop driving a transfer and free its resources.
    ///
    /// Returns false if the engine did not know the transfer.
    fn abort(&mut self, id: TransferId) -> bool;

    /// Transfers created or registered and not yet drained or aborted
    fn in_flight(&self) -> usize;
}

impl<E: TransferEngine + ?Sized> TransferEngine for Box<E> {
    fn create_transfer(&mut self, spec: &RequestSpec) -> Result<TransferId> {
        (**self).create_transfer(spec)
    }

    fn register(&mut self, id: TransferId) -> Result<()> {
        (**self).register(id)
    }

    fn step(&mut self) {
        (**self).step()
    }

    fn drain_completed(&mut self) -> Vec<Completion> {
        (**self).drain_completed()
    }

    fn abort(&mut self, id: TransferId) -> bool {
        (**self).abort(id)
    }

    fn in_flight(&self) -> usize {
        (**self).in_flight()
    }
}
