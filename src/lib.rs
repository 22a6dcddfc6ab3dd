//! Conduit - asynchronous HTTP transactions with handle-based completion
//!
//! Conduit lets any thread submit an HTTP request and get back a handle at
//! once. A single driver thread polls the manager; each transaction's
//! callback fires exactly once, on that thread, with the classified outcome
//! and the response body.
//!
//! # Quick Start
//!
//! ```ignore
//! use conduit::{HttpEngine, RequestSpec, TransactionManager};
//! use std::time::Duration;
//!
//! let manager = TransactionManager::new(HttpEngine::new()?);
//!
//! let handle = manager.submit(RequestSpec::get("http://localhost:8080/"), |view, body| {
//!     println!("{} -> {} ({} bytes)", view.url, view.outcome, body.len());
//! })?;
//!
//! manager.poll_until(&[handle], Duration::from_secs(10), Duration::from_millis(5));
//! manager.release(handle);
//! ```
//!
//! # Architecture
//!
//! - `conduit-core`: request, handle and outcome vocabulary, errors, config
//! - `conduit-engine`: the [`TransferEngine`] seam, the reqwest-backed
//!   [`HttpEngine`] and the in-memory [`ScriptedEngine`]
//! - `conduit-concurrency`: [`TransactionManager`] and its handle table

pub use conduit_concurrency::{
    HandleAllocator, ManagerMetrics, PollReport, TransactionManager, TransactionStatus,
    TransactionView,
};
pub use conduit_core::{
    ClientConfig, Error, ErrorCode, Method, RequestSpec, Result, TransactionHandle,
    TransferCode, TransferId, TransferOutcome,
};
pub use conduit_engine::{
    Completion, CompletionOrder, HttpEngine, Route, ScriptedEngine, ScriptedResponse,
    TransferEngine,
};
