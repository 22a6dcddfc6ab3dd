//! Identifier types
//!
//! - [`TransactionHandle`]: the opaque, comparable identifier callers hold
//! - [`TransferId`]: the engine-side reference to one transfer, never exposed
//!   to callers of the manager

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing identifier of a submitted transaction
///
/// A handle is only a table key. It carries no ownership: once the
/// transaction is released, the handle simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionHandle(u32);

impl TransactionHandle {
    /// Distinguished value never issued by allocation
    pub const INVALID: TransactionHandle = TransactionHandle(0);

    /// Wrap a raw value. Intended for allocators and tests.
    pub const fn from_raw(raw: u32) -> Self {
        TransactionHandle(raw)
    }

    /// Raw integer value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// False only for [`TransactionHandle::INVALID`]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Default for TransactionHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "txn#{}", self.0)
        } else {
            f.write_str("txn#invalid")
        }
    }
}

/// Engine-side reference to one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(u64);

impl TransferId {
    /// Wrap a raw value
    pub const fn new(raw: u64) -> Self {
        TransferId(raw)
    }

    /// Raw integer value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handle_is_not_valid() {
        assert!(!TransactionHandle::INVALID.is_valid());
        assert_eq!(TransactionHandle::default(), TransactionHandle::INVALID);
        assert_eq!(TransactionHandle::INVALID.to_string(), "txn#invalid");
    }

    #[test]
    fn test_handles_compare_by_value() {
        let a = TransactionHandle::from_raw(7);
        let b = TransactionHandle::from_raw(7);
        let c = TransactionHandle::from_raw(8);
        assert_eq!(a, b);
        assert!(a < c);
        assert_eq!(a.to_string(), "txn#7");
    }

    #[test]
    fn test_transfer_id_display() {
        assert_eq!(TransferId::new(3).to_string(), "transfer-3");
        assert_eq!(TransferId::new(3).as_u64(), 3);
    }

    #[test]
    fn test_handle_serializes_as_integer() {
        let json = serde_json::to_string(&TransactionHandle::from_raw(42)).unwrap();
        assert_eq!(json, "42");
    }
}
