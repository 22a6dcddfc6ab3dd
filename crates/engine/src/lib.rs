//! Transfer engines for conduit
//!
//! The manager never performs network I/O itself. It delegates every
//! transfer to a [`TransferEngine`]:
//! - [`HttpEngine`]: real HTTP/HTTPS via `reqwest` on a private tokio runtime
//! - [`ScriptedEngine`]: deterministic in-memory engine for tests and benches

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;
pub mod scripted;
pub mod traits;

pub use http::HttpEngine;
pub use scripted::{CompletionOrder, Route, ScriptedEngine, ScriptedResponse};
pub use traits::{Completion, TransferEngine};
