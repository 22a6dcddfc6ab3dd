//! Error types for conduit
//!
//! Only synchronous failures are modelled here. Per-request failures are
//! never errors: they arrive through the completion callback as a
//! [`TransferOutcome`](crate::outcome::TransferOutcome). Querying or
//! releasing an unknown handle is not an error either.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for conduit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for conduit
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be turned into a transfer (bad spec, engine
    /// refused it, resource exhaustion). Surfaced synchronously by submit,
    /// never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transfer engine failure outside of submit (runtime startup, shutdown)
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O error (config file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Config file exists but could not be parsed
    #[error("Invalid config file '{}': {message}", path.display())]
    ConfigFile {
        /// Path of the offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl Error {
    /// Build a [`Error::Configuration`] from anything displayable
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Build a [`Error::Engine`] from anything displayable
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// True for the synchronous submit failure class
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
