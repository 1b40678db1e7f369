//! Events dispatched to endpoints and servers.

use crate::close::CloseEvent;
use crate::socket::WebSocket;
use bytes::Bytes;
use mockwire_core::address::Address;

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Binary(_) => None,
        }
    }

    /// Raw bytes of either variant.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => &b[..],
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(b: &'static [u8]) -> Self {
        Self::Binary(Bytes::from_static(b))
    }
}

/// A delivered message, tagged with the address it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub origin: Address,
    pub data: Payload,
}

/// Endpoint event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Message,
    Close,
    Error,
}

/// Events observed by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Message(MessageEvent),
    Close(CloseEvent),
    /// Carries a diagnostic description; conforming callers must not parse it.
    Error(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Message(_) => EventKind::Message,
            Self::Close(_) => EventKind::Close,
            Self::Error(_) => EventKind::Error,
        }
    }
}

/// Server event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventKind {
    Connection,
    Message,
    Close,
    Error,
}

/// Events observed by a server. Each carries the endpoint involved.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// An endpoint completed its handshake.
    Connection(WebSocket),

    /// An endpoint sent a message.
    Message {
        socket: WebSocket,
        event: MessageEvent,
    },

    /// A connection finished its close handshake.
    Close {
        socket: WebSocket,
        event: CloseEvent,
    },

    /// A connection was failed by [`Server::simulate_error`](crate::server::Server::simulate_error).
    Error(WebSocket),
}

impl ServerEvent {
    pub fn kind(&self) -> ServerEventKind {
        match self {
            Self::Connection(_) => ServerEventKind::Connection,
            Self::Message { .. } => ServerEventKind::Message,
            Self::Close { .. } => ServerEventKind::Close,
            Self::Error(_) => ServerEventKind::Error,
        }
    }

    /// The endpoint this event concerns.
    pub fn socket(&self) -> &WebSocket {
        match self {
            Self::Connection(socket) | Self::Error(socket) => socket,
            Self::Message { socket, .. } | Self::Close { socket, .. } => socket,
        }
    }
}
