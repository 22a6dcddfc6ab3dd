//! Transfer result codes
//!
//! Engines report a raw [`TransferCode`] for every transfer that reaches a
//! terminal state. The manager classifies it into the caller-facing
//! [`TransferOutcome`]:
//!
//! | TransferCode | TransferOutcome |
//! |--------------|-----------------|
//! | `Completed { status < 400 }` | `Ok` |
//! | `Completed { status >= 400 }` | `Error(Status(status))` |
//! | `TimedOut` | `Timeout` |
//! | `ConnectFailed` | `Error(Connect)` |
//! | `Failed { .. }` | `Error(Transport)` |
//! | `Rejected { .. }` | `Error(Rejected)` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// First status code treated as a server rejection
pub const FIRST_REJECTION_STATUS: u16 = 400;

/// Terminal code reported by a transfer engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferCode {
    /// A response was received and its body read completely
    Completed {
        /// HTTP status code
        status: u16,
    },
    /// The transfer exceeded its configured timeout
    TimedOut,
    /// No connection could be established
    ConnectFailed,
    /// Any other transport failure
    Failed {
        /// Engine-provided description
        reason: String,
    },
    /// The engine refused to start a transfer it had created
    Rejected {
        /// Engine-provided description
        reason: String,
    },
}

/// Why a transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Server answered with a rejection status (>= 400)
    Status(u16),
    /// Connection could not be established
    Connect,
    /// Transfer failed mid-flight
    Transport,
    /// Engine refused to drive the transfer
    Rejected,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Status(status) => write!(f, "status {}", status),
            ErrorCode::Connect => f.write_str("connect failed"),
            ErrorCode::Transport => f.write_str("transport failure"),
            ErrorCode::Rejected => f.write_str("rejected by engine"),
        }
    }
}

/// Final outcome of a transaction, delivered once through its callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Response received with a non-rejection status
    Ok,
    /// Transfer hit its timeout
    Timeout,
    /// Transfer failed
    Error(ErrorCode),
}

impl TransferOutcome {
    /// Classify an engine code
    pub fn from_code(code: &TransferCode) -> Self {
        match code {
            TransferCode::Completed { status } if *status < FIRST_REJECTION_STATUS => {
                TransferOutcome::Ok
            }
            TransferCode::Completed { status } => {
                TransferOutcome::Error(ErrorCode::Status(*status))
            }
            TransferCode::TimedOut => TransferOutcome::Timeout,
            TransferCode::ConnectFailed => TransferOutcome::Error(ErrorCode::Connect),
            TransferCode::Failed { .. } => TransferOutcome::Error(ErrorCode::Transport),
            TransferCode::Rejected { .. } => TransferOutcome::Error(ErrorCode::Rejected),
        }
    }

    /// True for [`TransferOutcome::Ok`]
    pub fn is_ok(&self) -> bool {
        matches!(self, TransferOutcome::Ok)
    }

    /// True for [`TransferOutcome::Timeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransferOutcome::Timeout)
    }

    /// True for [`TransferOutcome::Error`]
    pub fn is_error(&self) -> bool {
        matches!(self, TransferOutcome::Error(_))
    }

    /// Rejection status, if the server rejected the request
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransferOutcome::Error(ErrorCode::Status(status)) => Some(*status),
            _ => None,
        }
    }
}

impl From<&TransferCode> for TransferOutcome {
    fn from(code: &TransferCode) -> Self {
        TransferOutcome::from_code(code)
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Ok => f.write_str("ok"),
            TransferOutcome::Timeout => f.write_str("timeout"),
            TransferOutcome::Error(code) => write!(f, "error ({})", code),
        }
    }
}
