//! Server and endpoint configuration.

use std::fmt;
use std::sync::Arc;

/// Handshake gate. Returning false rejects the connection attempt.
pub type Authorizer = Arc<dyn Fn() -> bool + Send + Sync + 'static>;

/// Picks a sub-protocol from the list the client offered.
///
/// An empty return value means "no sub-protocol". A non-empty value that the
/// client did not offer fails the handshake.
pub type ProtocolSelector = Arc<dyn Fn(&[String]) -> String + Send + Sync + 'static>;

/// Server configuration.
///
/// # Examples
///
/// ```
/// use mockwire_ws::options::ServerOptions;
///
/// let opts = ServerOptions::new()
///     .with_authorize(|| true)
///     .with_protocol_selector(|offered| offered.first().cloned().unwrap_or_default());
/// assert!(opts.authorize.is_some());
/// ```
#[derive(Clone, Default)]
pub struct ServerOptions {
    /// Checked first during negotiation.
    ///
    /// - `None` (default): every attempt is authorized
    pub authorize: Option<Authorizer>,

    /// Consulted after authorization succeeds.
    ///
    /// - `None` (default): the client's first offered protocol is kept
    pub select_protocol: Option<ProtocolSelector>,
}

impl ServerOptions {
    /// Create options with no callbacks configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authorization callback.
    #[must_use]
    pub fn with_authorize<F>(mut self, f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.authorize = Some(Arc::new(f));
        self
    }

    /// Set the sub-protocol selection callback.
    #[must_use]
    pub fn with_protocol_selector<F>(mut self, f: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        self.select_protocol = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("authorize", &self.authorize.is_some())
            .field("select_protocol", &self.select_protocol.is_some())
            .finish()
    }
}

/// How binary messages would be surfaced to the caller. Stored only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BinaryType {
    #[default]
    Blob,
    ArrayBuffer,
}

impl BinaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::ArrayBuffer => "arraybuffer",
        }
    }
}

impl fmt::Display for BinaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
