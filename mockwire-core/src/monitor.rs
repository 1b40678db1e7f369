//! Socket lifecycle monitoring.
//!
//! Provides event streams for tracking endpoint lifecycle transitions
//! independently of the listener API. Async consumers can await the
//! receiver with `recv_async`.

use crate::address::Address;
use std::fmt;

/// Endpoint lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Connection attempt started.
    Connecting(Address),

    /// Handshake accepted by the peer.
    Connected {
        address: Address,
        protocol: String,
    },

    /// Handshake rejected or aborted.
    ConnectFailed {
        address: Address,
        reason: String,
    },

    /// Close handshake started.
    Closing(Address),

    /// Connection reached its terminal state.
    Closed {
        address: Address,
        code: u16,
        reason: String,
        was_clean: bool,
    },

    /// A message was handed to the peer for delivery.
    MessageSent {
        address: Address,
        len: usize,
    },
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting(addr) => write!(f, "Connecting to {addr}"),
            Self::Connected { address, protocol } if protocol.is_empty() => {
                write!(f, "Connected to {address}")
            }
            Self::Connected { address, protocol } => {
                write!(f, "Connected to {address} ({protocol})")
            }
            Self::ConnectFailed { address, reason } => {
                write!(f, "Connect failed for {address}: {reason}")
            }
            Self::Closing(addr) => write!(f, "Closing {addr}"),
            Self::Closed {
                address,
                code,
                reason,
                ..
            } => write!(f, "Closed {address} ({code} {reason})"),
            Self::MessageSent { address, len } => write!(f, "Sent {len} bytes to {address}"),
        }
    }
}

/// Handle for receiving socket events.
///
/// This is a channel receiver that provides a stream of lifecycle events.
pub type SocketMonitor = flume::Receiver<SocketEvent>;

/// Internal sender for socket events.
///
/// This is exposed publicly to allow endpoint implementations to emit events.
pub type SocketEventSender = flume::Sender<SocketEvent>;

/// Creates a new monitoring channel pair.
#[must_use]
pub fn create_monitor() -> (SocketEventSender, SocketMonitor) {
    flume::unbounded()
}
