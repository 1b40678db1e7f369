//! Address validation for simulated endpoints.
//!
//! Only `ws://` and `wss://` URLs are accepted. The address is stored in its
//! normalized serialization so that `ws://host` and `ws://host/` resolve to
//! the same registry entry.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A validated, absolute peer address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    url: Url,
}

impl Address {
    /// Parse and validate an address.
    ///
    /// # Examples
    ///
    /// ```
    /// use mockwire_core::address::Address;
    ///
    /// let address = Address::parse("ws://localhost:8080").unwrap();
    /// assert_eq!(address.as_str(), "ws://localhost:8080/");
    ///
    /// assert!(Address::parse("http://localhost:8080").is_err());
    /// assert!(Address::parse("ws://localhost/#chat").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if the input is not an absolute URL, uses a
    /// scheme other than `ws`/`wss`, or carries a fragment.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.parse()
    }

    /// Normalized string form.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// URL scheme (`ws` or `wss`).
    #[inline]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Returns true for `wss://` addresses.
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Host component, if any.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Port, falling back to the scheme default.
    pub fn port_or_default(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)
            .map_err(|e| Error::syntax(format!("The URL '{s}' is invalid: {e}")))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::syntax(format!(
                    "The URL's scheme must be either 'ws' or 'wss'. '{other}' is not allowed."
                )))
            }
        }

        if url.fragment().is_some() {
            return Err(Error::syntax(format!(
                "The URL contains a fragment identifier ('{s}'). Fragment identifiers are not allowed in socket URLs."
            )));
        }

        Ok(Self { url })
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
