//! Sub-protocol list validation.

use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Ordered list of offered sub-protocols. Most clients offer one or two.
pub type Protocols = SmallVec<[String; 4]>;

/// Validate an offered sub-protocol list.
///
/// Order is preserved. Each entry must be a non-empty HTTP token and may
/// appear only once.
///
/// # Examples
///
/// ```
/// use mockwire_core::protocols::validate_protocols;
///
/// let protocols = validate_protocols(["chat", "superchat"]).unwrap();
/// assert_eq!(protocols.as_slice(), ["chat", "superchat"]);
///
/// assert!(validate_protocols(["chat", "chat"]).is_err());
/// assert!(validate_protocols(["bad name"]).is_err());
/// ```
///
/// # Errors
///
/// - [`Error::InvalidProtocol`] for an empty or non-token name
/// - [`Error::DuplicateProtocol`] for a repeated name
pub fn validate_protocols<I, S>(input: I) -> Result<Protocols>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut protocols = Protocols::new();

    for name in input {
        let name = name.as_ref();
        if !is_token(name) {
            return Err(Error::InvalidProtocol(name.to_string()));
        }
        if protocols.iter().any(|p| p == name) {
            return Err(Error::DuplicateProtocol(name.to_string()));
        }
        protocols.push(name.to_string());
    }

    Ok(protocols)
}

/// RFC 7230 `token`: one or more `tchar`.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_tchar)
}

#[inline]
const fn is_tchar(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#'
            | b'$'
            | b'%'
            | b'&'
            | b'\''
            | b'*'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~'
            | b'0'..=b'9'
            | b'a'..=b'z'
            | b'A'..=b'Z'
    )
}

/// Length of `s` in bytes when encoded as UTF-8.
#[inline]
pub fn utf8_byte_length(s: &str) -> usize {
    // `str` is always UTF-8
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let protocols = validate_protocols(Vec::<String>::new()).unwrap();
        assert!(protocols.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let protocols = validate_protocols(["v2.chat", "v1.chat", "mqtt"]).unwrap();
        assert_eq!(protocols.as_slice(), ["v2.chat", "v1.chat", "mqtt"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = validate_protocols(["chat", "superchat", "chat"]);
        assert_eq!(result, Err(Error::DuplicateProtocol("chat".into())));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(validate_protocols([""]), Err(Error::InvalidProtocol(_))));
        assert!(matches!(validate_protocols(["a b"]), Err(Error::InvalidProtocol(_))));
        assert!(matches!(validate_protocols(["a,b"]), Err(Error::InvalidProtocol(_))));
        assert!(matches!(validate_protocols(["ch\u{e4}t"]), Err(Error::InvalidProtocol(_))));
    }

    #[test]
    fn test_utf8_byte_length() {
        assert_eq!(utf8_byte_length("bye"), 3);
        assert_eq!(utf8_byte_length("\u{e9}"), 2);
        assert_eq!(utf8_byte_length("\u{1f600}"), 4);
    }
}
