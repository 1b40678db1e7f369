//! Mockwire Error Types
//!
//! Every error here is synchronous caller misuse. Handshake outcomes are
//! reported through events, never through this type.

use crate::state::ReadyState;
use thiserror::Error;

/// Main error type for mockwire operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed input (address, close reason)
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Sub-protocol name is not a valid token
    #[error("Invalid subprotocol name: '{0}'")]
    InvalidProtocol(String),

    /// Sub-protocol offered more than once
    #[error("The subprotocol '{0}' is duplicated")]
    DuplicateProtocol(String),

    /// Close code outside `{1000} ∪ [3000, 4999]`
    #[error("Invalid close code: {0} (expected 1000 or 3000-4999)")]
    InvalidCloseCode(u16),

    /// Close reason longer than the limit in UTF-8 bytes
    #[error("Close reason too long: {len} bytes (max: {max})")]
    ReasonTooLong { len: usize, max: usize },

    /// Operation not permitted in the current state
    #[error("Invalid state: socket is {0}")]
    InvalidState(ReadyState),

    /// A peer is already bound at this address
    #[error("Address already in use: {0}")]
    AddressInUse(String),
}

/// Result type alias for mockwire operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a syntax error with a message
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Check if this error is raised while constructing an endpoint
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax(_) | Self::InvalidProtocol(_) | Self::DuplicateProtocol(_)
        )
    }

    /// Check if this error rejects the arguments of a close call
    #[must_use]
    pub const fn is_close_argument_error(&self) -> bool {
        matches!(self, Self::InvalidCloseCode(_) | Self::ReasonTooLong { .. })
    }
}
