//! Core types for conduit
//!
//! This crate defines the vocabulary shared by the engine and manager layers:
//! - RequestSpec / Method: what to request
//! - TransactionHandle: caller-facing identifier
//! - TransferId: engine-side transfer reference
//! - TransferCode / TransferOutcome / ErrorCode: terminal results
//! - Error: synchronous error hierarchy
//! - ClientConfig: `conduit.toml` settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod outcome;
pub mod request;
pub mod types;

pub use config::{ClientConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use outcome::{ErrorCode, TransferCode, TransferOutcome};
pub use request::{Method, RequestSpec};
pub use types::{TransactionHandle, TransferId};
