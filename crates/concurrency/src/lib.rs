//! Transaction management for conduit
//!
//! This crate turns fire-and-forget request submission into tracked
//! transactions:
//! - TransactionManager: submit / poll / is_completed / release
//! - HandleAllocator: wrapping handle source that never issues 0
//! - TransactionTable: handle-keyed ownership of live transactions
//! - IntakeQueue: double-buffered hand-off from submitters to the driver
//! - ManagerMetrics: activity counters
//!
//! Any thread may submit, query or release. One driver thread polls, and
//! completion callbacks run on that thread.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handle;
pub mod intake;
pub mod manager;
pub mod metrics;
pub mod table;
pub mod transaction;

pub use handle::{HandleAllocator, HANDLE_MODULUS};
pub use intake::IntakeQueue;
pub use manager::{PollReport, TransactionManager};
pub use metrics::ManagerMetrics;
pub use table::TransactionTable;
pub use transaction::{
    InvalidTransition, ResultCallback, Transaction, TransactionStatus, TransactionView,
};
