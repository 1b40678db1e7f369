//! Connection ready-state enumeration.
//!
//! The numeric values are part of the public contract: callers written
//! against the browser socket API compare against `0..=3` directly.

use std::fmt;

/// Lifecycle state of a simulated connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake has not completed yet.
    Connecting = 0,

    /// Handshake succeeded; messages may be sent.
    Open = 1,

    /// A close handshake is in flight.
    Closing = 2,

    /// Terminal state. The endpoint is inert.
    Closed = 3,
}

impl ReadyState {
    /// Numeric value of the state.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Convert a numeric value back into a state.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Connecting),
            1 => Some(Self::Open),
            2 => Some(Self::Closing),
            3 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Get the state as an upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        }
    }

    /// True for `Closing` and `Closed`.
    #[inline]
    #[must_use]
    pub const fn is_closing_or_closed(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values() {
        assert_eq!(ReadyState::Connecting.as_u8(), 0);
        assert_eq!(ReadyState::Open.as_u8(), 1);
        assert_eq!(ReadyState::Closing.as_u8(), 2);
        assert_eq!(ReadyState::Closed.as_u8(), 3);
        assert_eq!(ReadyState::from_u8(2), Some(ReadyState::Closing));
        assert_eq!(ReadyState::from_u8(4), None);
    }

    #[test]
    fn test_ordering_follows_lifecycle() {
        assert!(ReadyState::Connecting < ReadyState::Open);
        assert!(ReadyState::Open < ReadyState::Closing);
        assert!(ReadyState::Closing < ReadyState::Closed);
    }

    #[test]
    fn test_display() {
        assert_eq!(ReadyState::Open.to_string(), "OPEN");
        assert!(ReadyState::Closed.is_closing_or_closed());
        assert!(!ReadyState::Connecting.is_closing_or_closed());
    }
}
