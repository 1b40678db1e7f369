//! Simulated server: the peer side of every [`WebSocket`].
//!
//! A server is bound to one address on a [`Network`]. Endpoints connecting
//! to that address negotiate against its [`ServerOptions`]; once open they
//! deliver messages and close notifications to the server's listeners.
//!
//! ```rust
//! use mockwire_ws::{Network, Server, WebSocket};
//!
//! let network = Network::new();
//! let server = Server::bind(&network, "ws://localhost:8080").unwrap();
//!
//! // Echo every message back to its sender
//! let echo = server.clone();
//! server.on_message(move |socket, message| {
//!     echo.send_to(socket, message.data.clone());
//! });
//!
//! let socket = WebSocket::connect(&network, "ws://localhost:8080", ["chat"]).unwrap();
//! network.run_until_idle();
//! socket.send("ping").unwrap();
//! network.run_until_idle();
//! ```

use crate::close::{CloseEvent, NORMAL_CLOSE};
use crate::event::{MessageEvent, Payload, ServerEvent, ServerEventKind};
use crate::network::{Network, WeakNetwork};
use crate::options::ServerOptions;
use crate::socket::WebSocket;
use mockwire_core::address::Address;
use mockwire_core::error::Result;
use mockwire_core::event_target::{EventTarget, ListenerId};
use mockwire_core::state::ReadyState;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

struct ServerInner {
    address: Address,
    options: ServerOptions,
    network: WeakNetwork,
    events: EventTarget<ServerEventKind, ServerEvent>,
}

/// Peer bound at one address. Cloning yields another handle to it.
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

impl Server {
    /// Bind a server with default options.
    ///
    /// # Errors
    ///
    /// - [`Error::Syntax`](mockwire_core::error::Error::Syntax) for a malformed address
    /// - [`Error::AddressInUse`](mockwire_core::error::Error::AddressInUse) if a server is
    ///   already bound there
    pub fn bind(network: &Network, address: &str) -> Result<Self> {
        Self::bind_with_options(network, address, ServerOptions::default())
    }

    /// Bind a server with explicit options.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub fn bind_with_options(
        network: &Network,
        address: &str,
        options: ServerOptions,
    ) -> Result<Self> {
        let address = Address::parse(address)?;
        let server = Self {
            inner: Arc::new(ServerInner {
                address: address.clone(),
                options,
                network: network.downgrade(),
                events: EventTarget::new(),
            }),
        };
        network.registry().bind(address, server.clone())?;
        debug!(url = %server.address(), options = ?server.options(), "server listening");
        Ok(server)
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    #[inline]
    pub fn options(&self) -> &ServerOptions {
        &self.inner.options
    }

    /// Endpoints attached to this server, in connect order. Includes
    /// endpoints still negotiating.
    pub fn clients(&self) -> Vec<WebSocket> {
        self.network()
            .map(|network| network.connections(self.address()))
            .unwrap_or_default()
    }

    /// Register a listener. Listeners fire in registration order.
    pub fn add_event_listener<F>(&self, kind: ServerEventKind, listener: F) -> ListenerId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.inner.events.add_listener(kind, Arc::new(listener))
    }

    pub fn remove_event_listener(&self, kind: ServerEventKind, id: ListenerId) -> bool {
        self.inner.events.remove_listener(kind, id)
    }

    /// Remove every listener for `kind`. Returns how many were removed.
    pub fn remove_event_listeners(&self, kind: ServerEventKind) -> usize {
        self.inner.events.remove_all(kind)
    }

    /// Called with each endpoint that completes its handshake.
    pub fn on_connection<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&WebSocket) + Send + Sync + 'static,
    {
        self.add_event_listener(ServerEventKind::Connection, move |event| {
            if let ServerEvent::Connection(socket) = event {
                f(socket);
            }
        })
    }

    /// Called with each message an endpoint sends.
    pub fn on_message<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&WebSocket, &MessageEvent) + Send + Sync + 'static,
    {
        self.add_event_listener(ServerEventKind::Message, move |event| {
            if let ServerEvent::Message { socket, event } = event {
                f(socket, event);
            }
        })
    }

    /// Called when a connection completes its close handshake.
    pub fn on_close<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&WebSocket, &CloseEvent) + Send + Sync + 'static,
    {
        self.add_event_listener(ServerEventKind::Close, move |event| {
            if let ServerEvent::Close { socket, event } = event {
                f(socket, event);
            }
        })
    }

    /// Called for each connection failed by [`Server::simulate_error`].
    pub fn on_error<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&WebSocket) + Send + Sync + 'static,
    {
        self.add_event_listener(ServerEventKind::Error, move |event| {
            if let ServerEvent::Error(socket) = event {
                f(socket);
            }
        })
    }

    /// Deliver a message to one endpoint. Dropped if the endpoint is not
    /// open when the delivery runs.
    pub fn send_to(&self, socket: &WebSocket, data: impl Into<Payload>) {
        let event = MessageEvent {
            origin: self.address().clone(),
            data: data.into(),
        };
        trace!(url = %self.address(), id = socket.id(), len = event.data.len(), "server send");

        let Some(network) = self.network() else {
            return;
        };
        let socket = socket.clone();
        network.defer(move || socket.receive(event));
    }

    /// Deliver a message to every open endpoint. Returns how many were
    /// targeted.
    pub fn emit(&self, data: impl Into<Payload>) -> usize {
        let data = data.into();
        let mut targeted = 0;
        for socket in self.clients() {
            if socket.ready_state() == ReadyState::Open {
                self.send_to(&socket, data.clone());
                targeted += 1;
            }
        }
        targeted
    }

    /// Close one connection from the server side.
    ///
    /// Codes are not restricted to the client range; a server may report
    /// e.g. 1001. A connection still negotiating is refused instead.
    pub fn close_client(&self, socket: &WebSocket, code: u16, reason: &str) {
        debug!(url = %self.address(), id = socket.id(), code, "server closing connection");
        socket.close_from_peer(code, reason.to_string());
    }

    /// Fail every attached connection: each endpoint observes `error`
    /// then an unclean `close`.
    pub fn simulate_error(&self) {
        let Some(network) = self.network() else {
            return;
        };
        for socket in network.connections(self.address()) {
            if socket.fail_from_peer() {
                let server = self.clone();
                network.defer(move || {
                    server
                        .inner
                        .events
                        .dispatch(ServerEventKind::Error, &ServerEvent::Error(socket));
                });
            }
        }
    }

    /// Close every connection with `NORMAL_CLOSE` and unbind.
    pub fn stop(&self) {
        self.stop_with(NORMAL_CLOSE, "");
    }

    /// Close every connection and unbind. The address can be bound again
    /// immediately.
    pub fn stop_with(&self, code: u16, reason: &str) {
        let Some(network) = self.network() else {
            return;
        };
        let clients = network.registry().unbind(self.address());
        debug!(url = %self.address(), clients = clients.len(), code, "server stopping");
        for socket in clients {
            socket.close_from_peer(code, reason.to_string());
        }
    }

    fn network(&self) -> Option<Network> {
        self.inner.network.upgrade()
    }

    pub(crate) fn notify_connection(&self, socket: &WebSocket) {
        self.dispatch(ServerEvent::Connection(socket.clone()));
    }

    pub(crate) fn deliver_message(&self, socket: &WebSocket, event: MessageEvent) {
        self.dispatch(ServerEvent::Message {
            socket: socket.clone(),
            event,
        });
    }

    pub(crate) fn notify_close(&self, socket: &WebSocket, event: CloseEvent) {
        self.dispatch(ServerEvent::Close {
            socket: socket.clone(),
            event,
        });
    }

    fn dispatch(&self, event: ServerEvent) {
        let kind = event.kind();
        let invoked = self.inner.events.dispatch(kind, &event);
        trace!(url = %self.address(), ?kind, invoked, "server dispatch");
    }
}

impl PartialEq for Server {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Server {}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("url", &self.inner.address.as_str())
            .field("options", &self.inner.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockwire_core::error::Error;

    #[test]
    fn test_bind_duplicate() {
        let network = Network::new();
        let _server = Server::bind(&network, "ws://localhost:1234").unwrap();
        let result = Server::bind(&network, "ws://localhost:1234/");
        assert!(matches!(result, Err(Error::AddressInUse(_))));
    }

    #[test]
    fn test_stop_releases_address() {
        let network = Network::new();
        let server = Server::bind(&network, "ws://rebind").unwrap();
        server.stop();
        assert!(Server::bind(&network, "ws://rebind").is_ok());
    }

    #[test]
    fn test_clients_tracks_attach_and_close() {
        let network = Network::new();
        let server = Server::bind(&network, "ws://tracked").unwrap();
        let socket = WebSocket::connect(&network, "ws://tracked", Vec::<String>::new()).unwrap();
        assert_eq!(server.clients(), vec![socket.clone()]);

        network.run_until_idle();
        socket.close().unwrap();
        network.run_until_idle();
        assert!(server.clients().is_empty());
    }
}
