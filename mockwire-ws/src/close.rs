//! Close codes and close-argument validation.

use mockwire_core::error::{Error, Result};
use mockwire_core::protocols::utf8_byte_length;

/// Normal closure. Also the code reported when a handshake is rejected.
pub const NORMAL_CLOSE: u16 = 1000;

/// The peer is going away (server shutdown).
pub const GOING_AWAY: u16 = 1001;

/// Connection dropped without a close frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

/// First code of the range reserved for libraries and applications.
pub const APPLICATION_MIN: u16 = 3000;

/// Last code of the application range.
pub const APPLICATION_MAX: u16 = 4999;

/// Maximum close reason length in UTF-8 bytes.
pub const MAX_REASON_BYTES: usize = 123;

/// Returns true for codes a client may pass to `close`: `1000` or `3000..=4999`.
#[inline]
#[must_use]
pub const fn is_valid_close_code(code: u16) -> bool {
    code == NORMAL_CLOSE || (code >= APPLICATION_MIN && code <= APPLICATION_MAX)
}

/// Validate client-supplied close arguments. The code is checked first.
///
/// # Errors
///
/// - [`Error::InvalidCloseCode`] for a code outside `{1000} ∪ [3000, 4999]`
/// - [`Error::ReasonTooLong`] for a reason over 123 UTF-8 bytes
pub fn validate_close(code: Option<u16>, reason: Option<&str>) -> Result<()> {
    if let Some(code) = code {
        if !is_valid_close_code(code) {
            return Err(Error::InvalidCloseCode(code));
        }
    }

    if let Some(reason) = reason {
        let len = utf8_byte_length(reason);
        if len > MAX_REASON_BYTES {
            return Err(Error::ReasonTooLong {
                len,
                max: MAX_REASON_BYTES,
            });
        }
    }

    Ok(())
}

/// Payload of a `close` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub code: u16,
    pub reason: String,
    /// False when the connection failed instead of completing a handshake.
    pub was_clean: bool,
}

impl CloseEvent {
    pub fn new(code: u16, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }
}
