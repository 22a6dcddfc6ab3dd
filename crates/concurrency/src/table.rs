//! Transaction table
//!
//! Sole owner of every tracked [`Transaction`]. Entries are keyed by handle,
//! with a reverse index from engine transfer to handle so completions can be
//! matched back to their transaction. Removing an entry drops the
//! transaction; a stale handle simply stops resolving.
//!
//! The table itself is not synchronized. The manager keeps it behind its
//! table-wide lock.

use crate::transaction::Transaction;
use conduit_core::{TransactionHandle, TransferId};
use std::collections::HashMap;

/// Handle-keyed arena of transactions
#[derive(Debug, Default)]
pub struct TransactionTable {
    entries: HashMap<TransactionHandle, Transaction>,
    by_transfer: HashMap<TransferId, TransactionHandle>,
}

impl TransactionTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a transaction
    ///
    /// Returns the transaction back if its handle is already tracked; the
    /// existing entry is left untouched.
    pub fn insert(&mut self, txn: Transaction) -> Result<(), Transaction> {
        let handle = txn.handle();
        if self.entries.contains_key(&handle) {
            return Err(txn);
        }
        self.by_transfer.insert(txn.transfer(), handle);
        self.entries.insert(handle, txn);
        Ok(())
    }

    /// Look up by handle
    pub fn get(&self, handle: TransactionHandle) -> Option<&Transaction> {
        self.entries.get(&handle)
    }

    /// Look up by handle, mutably
    pub fn get_mut(&mut self, handle: TransactionHandle) -> Option<&mut Transaction> {
        self.entries.get_mut(&handle)
    }

    /// Handle owning an engine transfer
    pub fn handle_for_transfer(&self, transfer: TransferId) -> Option<TransactionHandle> {
        self.by_transfer.get(&transfer).copied()
    }

    /// Stop tracking a transaction and hand it back
    pub fn remove(&mut self, handle: TransactionHandle) -> Option<Transaction> {
        let txn = self.entries.remove(&handle)?;
        self.by_transfer.remove(&txn.transfer());
        Some(txn)
    }

    /// Remove every entry
    pub fn drain(&mut self) -> impl Iterator<Item = Transaction> + '_ {
        self.by_transfer.clear();
        self.entries.drain().map(|(_, txn)| txn)
    }

    /// True if the handle is tracked
    pub fn contains(&self, handle: TransactionHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// True if the transfer belongs to a tracked transaction
    pub fn tracks_transfer(&self, transfer: TransferId) -> bool {
        self.by_transfer.contains_key(&transfer)
    }

    /// Tracked transactions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked transactions still pending
    pub fn pending_count(&self) -> usize {
        self.entries.values().filter(|txn| txn.is_pending()).count()
    }
}
