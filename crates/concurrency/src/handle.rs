//! Handle allocation
//!
//! Handles come from a single atomic counter per manager. The counter wraps
//! at [`HANDLE_MODULUS`] back to 1 so [`TransactionHandle::INVALID`] is never
//! issued.
//!
//! There is no reuse detection here: after `HANDLE_MODULUS - 1` allocations
//! a value can come around again while an old transaction with the same
//! value is still tracked. The manager checks its table before inserting and
//! allocates again on collision.

use conduit_core::TransactionHandle;
use std::sync::atomic::{AtomicU32, Ordering};

/// Allocation wraps once the counter reaches this value
pub const HANDLE_MODULUS: u32 = 0xFFFF_FFFF;

/// Lock-free, monotonically increasing handle source
#[derive(Debug)]
pub struct HandleAllocator {
    /// Last handle issued (0 before the first allocation)
    last: AtomicU32,
}

impl HandleAllocator {
    /// Allocator whose first handle is 1
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Allocator whose first handle follows `last`
    ///
    /// Used to resume numbering, and by tests to exercise wraparound.
    pub fn starting_at(last: u32) -> Self {
        Self {
            last: AtomicU32::new(last % HANDLE_MODULUS),
        }
    }

    /// Issue the next handle. Never returns `INVALID`.
    pub fn allocate(&self) -> TransactionHandle {
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(next_value(last))
            })
            .unwrap_or_else(|last| last);
        TransactionHandle::from_raw(next_value(previous))
    }

    /// Most recently issued raw value (0 if none)
    pub fn last_issued(&self) -> u32 {
        self.last.load(Ordering::Acquire)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn next_value(last: u32) -> u32 {
    if last >= HANDLE_MODULUS - 1 {
        1
    } else {
        last + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_handle_is_one() {
        let allocator = HandleAllocator::new();
        assert_eq!(allocator.allocate().as_u32(), 1);
        assert_eq!(allocator.allocate().as_u32(), 2);
        assert_eq!(allocator.last_issued(), 2);
    }

    #[test]
    fn test_wraps_before_modulus_and_skips_invalid() {
        let allocator = HandleAllocator::starting_at(HANDLE_MODULUS - 2);
        assert_eq!(allocator.allocate().as_u32(), HANDLE_MODULUS - 1);
        let wrapped = allocator.allocate();
        assert_eq!(wrapped.as_u32(), 1);
        assert!(wrapped.is_valid());
    }

    #[test]
    fn test_concurrent_allocations_are_distinct() {
        let allocator = Arc::new(HandleAllocator::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || (0..1000).map(|_| allocator.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for t in threads {
            for handle in t.join().unwrap() {
                assert!(seen.insert(handle), "duplicate handle {}", handle);
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    proptest! {
        #[test]
        fn test_never_issues_invalid(start in any::<u32>(), count in 1usize..64) {
            let allocator = HandleAllocator::starting_at(start);
            for _ in 0..count {
                let handle = allocator.allocate();
                prop_assert!(handle.is_valid());
                prop_assert!(handle.as_u32() < HANDLE_MODULUS);
            }
        }

        #[test]
        fn test_consecutive_handles_differ(start in any::<u32>()) {
            let allocator = HandleAllocator::starting_at(start);
            let a = allocator.allocate();
            let b = allocator.allocate();
            prop_assert_ne!(a, b);
        }
    }
}
