//! Simulated WebSocket endpoint.
//!
//! # Lifecycle
//!
//! ```text
//!   connect()
//!      │
//!  CONNECTING ──negotiation rejected / close()──────────────┐
//!      │                                                    │
//!  negotiation accepted                                     │
//!      │                                                    │
//!    OPEN ──close() / peer close──► CLOSING ──close frame──► CLOSED
//!      │                                                    ▲
//!      └──────────────────peer error────────────────────────┘
//! ```
//!
//! Construction never emits events synchronously: negotiation runs as a
//! deferred task on the owning [`Network`], so listeners attached right
//! after `connect` returns observe `open` or `error` + `close`.
//!
//! State flips that callers must see immediately (`CLOSING` on `close()`,
//! `CLOSED` when aborting a handshake) happen inside the call, so a repeated
//! `close()` is a no-op. The events they produce are always deferred.
//!
//! # Concurrent closes
//!
//! Local and peer-initiated closes both enqueue a close frame. The first
//! frame processed moves the endpoint to `CLOSED` and decides the reported
//! code and reason; later frames are dropped.

use crate::close::{validate_close, CloseEvent, ABNORMAL_CLOSE, NORMAL_CLOSE};
use crate::event::{Event, EventKind, MessageEvent, Payload};
use crate::network::{Network, WeakNetwork};
use crate::options::BinaryType;
use crate::server::Server;
use mockwire_core::address::Address;
use mockwire_core::error::{Error, Result};
use mockwire_core::event_target::{EventTarget, Listener, ListenerId};
use mockwire_core::monitor::{create_monitor, SocketEvent, SocketEventSender, SocketMonitor};
use mockwire_core::protocols::{validate_protocols, Protocols};
use mockwire_core::state::ReadyState;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

struct Connection {
    ready_state: ReadyState,
    protocol: String,
    binary_type: BinaryType,
    /// Peer found at attach time; taken when the connection closes so the
    /// peer hears about the close exactly once.
    peer: Option<Server>,
}

struct SocketInner {
    id: u64,
    address: Address,
    requested: Protocols,
    network: WeakNetwork,
    events: EventTarget<EventKind, Event>,
    conn: Mutex<Connection>,
    monitors: Mutex<Vec<SocketEventSender>>,
}

/// Client endpoint of a simulated connection.
///
/// Cloning yields another handle to the same connection.
#[derive(Clone)]
pub struct WebSocket {
    inner: Arc<SocketInner>,
}

impl WebSocket {
    /// Connect to `address` on the global network without sub-protocols.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for a malformed address.
    pub fn new(address: &str) -> Result<Self> {
        Self::connect(&Network::global(), address, Vec::<String>::new())
    }

    /// Connect to `address` on the global network offering `protocols`.
    ///
    /// # Errors
    ///
    /// See [`WebSocket::connect`].
    pub fn with_protocols<I, S>(address: &str, protocols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::connect(&Network::global(), address, protocols)
    }

    /// Start a connection attempt on `network`.
    ///
    /// The attempt is resolved by a deferred negotiation step; this call
    /// only validates its arguments and registers the endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Syntax`] for a malformed address
    /// - [`Error::InvalidProtocol`] / [`Error::DuplicateProtocol`] for a bad
    ///   protocol list
    pub fn connect<I, S>(network: &Network, address: &str, protocols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let address = Address::parse(address)?;
        let requested = validate_protocols(protocols)?;
        let protocol = requested.first().cloned().unwrap_or_default();

        let socket = Self {
            inner: Arc::new(SocketInner {
                id: network.next_connection_id(),
                address,
                requested,
                network: network.downgrade(),
                events: EventTarget::new(),
                conn: Mutex::new(Connection {
                    ready_state: ReadyState::Connecting,
                    protocol,
                    binary_type: BinaryType::Blob,
                    peer: None,
                }),
                monitors: Mutex::new(Vec::new()),
            }),
        };

        let peer = network.registry().attach(socket.clone(), socket.url());
        socket.inner.conn.lock().peer = peer.clone();
        debug!(
            id = socket.id(),
            url = %socket.url(),
            peer_found = peer.is_some(),
            "connecting"
        );

        let this = socket.clone();
        network.defer(move || this.negotiate(peer));
        Ok(socket)
    }

    /// Connection id, unique within the owning network.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The validated peer address.
    #[inline]
    pub fn url(&self) -> &Address {
        &self.inner.address
    }

    /// Sub-protocols offered at construction, in order.
    pub fn requested_protocols(&self) -> &[String] {
        &self.inner.requested
    }

    /// Negotiated sub-protocol; empty for none.
    pub fn protocol(&self) -> String {
        self.inner.conn.lock().protocol.clone()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.conn.lock().ready_state
    }

    pub fn binary_type(&self) -> BinaryType {
        self.inner.conn.lock().binary_type
    }

    pub fn set_binary_type(&self, binary_type: BinaryType) {
        self.inner.conn.lock().binary_type = binary_type;
    }

    /// The network this endpoint belongs to, or `None` once every
    /// [`Network`] handle has been dropped.
    pub fn network(&self) -> Option<Network> {
        self.inner.network.upgrade()
    }

    /// Subscribe to lifecycle transitions.
    ///
    /// Only transitions after this call are reported.
    pub fn monitor(&self) -> SocketMonitor {
        let (tx, rx) = create_monitor();
        self.inner.monitors.lock().push(tx);
        rx
    }

    /// Send a message to the peer.
    ///
    /// Delivery is deferred and unacknowledged. A missing peer is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the endpoint is `OPEN`.
    /// `CONNECTING` is rejected on purpose rather than silently dropped:
    /// nothing is forwarded before the handshake completes.
    pub fn send(&self, data: impl Into<Payload>) -> Result<()> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(Error::InvalidState(state));
        }

        let event = MessageEvent {
            origin: self.inner.address.clone(),
            data: data.into(),
        };
        let len = event.data.len();
        trace!(id = self.id(), url = %self.url(), len, "send");

        let Some(server) = self.network().and_then(|n| n.lookup(self.url())) else {
            return Ok(());
        };

        let this = self.clone();
        self.defer(move || {
            this.emit_monitor(SocketEvent::MessageSent {
                address: this.url().clone(),
                len,
            });
            server.deliver_message(&this, event);
        });
        Ok(())
    }

    /// Close without a code or reason.
    ///
    /// # Errors
    ///
    /// See [`WebSocket::close_with`].
    pub fn close(&self) -> Result<()> {
        self.close_with(None, None)
    }

    /// Close the connection.
    ///
    /// - `CONNECTING`: the handshake is aborted; `error` then `close` follow
    ///   (code defaults to 1006).
    /// - `OPEN`: a close handshake starts; `close` follows (code defaults
    ///   to 1000).
    /// - `CLOSING` / `CLOSED`: nothing happens.
    ///
    /// # Errors
    ///
    /// Arguments are validated before anything else:
    /// - [`Error::InvalidCloseCode`] unless `code` is 1000 or 3000-4999
    /// - [`Error::ReasonTooLong`] if `reason` exceeds 123 UTF-8 bytes
    pub fn close_with(&self, code: Option<u16>, reason: Option<&str>) -> Result<()> {
        validate_close(code, reason)?;
        let reason = reason.unwrap_or_default().to_string();

        let mut conn = self.inner.conn.lock();
        let state = conn.ready_state;
        if state.is_closing_or_closed() {
            trace!(id = self.id(), %state, "close ignored");
            return Ok(());
        }

        if state == ReadyState::Connecting {
            conn.ready_state = ReadyState::Closed;
            conn.peer = None;
            drop(conn);
            self.fail_connection(code.unwrap_or(ABNORMAL_CLOSE), reason, "connection aborted");
        } else {
            conn.ready_state = ReadyState::Closing;
            drop(conn);
            self.start_closing(code.unwrap_or(NORMAL_CLOSE), reason);
        }
        Ok(())
    }

    /// Register a listener. Listeners fire in registration order.
    pub fn add_event_listener<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.add_listener(kind, Arc::new(listener))
    }

    /// Remove a listener added with [`WebSocket::add_event_listener`].
    pub fn remove_event_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.events.remove_listener(kind, id)
    }

    /// Remove every listener for `kind`, the `on*` slot included. Returns
    /// how many were removed.
    pub fn remove_event_listeners(&self, kind: EventKind) -> usize {
        self.inner.events.remove_all(kind)
    }

    pub fn set_onopen(&self, listener: Option<Listener<Event>>) {
        self.inner.events.set_slot(EventKind::Open, listener);
    }

    pub fn onopen(&self) -> Option<Listener<Event>> {
        self.inner.events.slot(EventKind::Open)
    }

    pub fn set_onmessage(&self, listener: Option<Listener<Event>>) {
        self.inner.events.set_slot(EventKind::Message, listener);
    }

    pub fn onmessage(&self) -> Option<Listener<Event>> {
        self.inner.events.slot(EventKind::Message)
    }

    pub fn set_onclose(&self, listener: Option<Listener<Event>>) {
        self.inner.events.set_slot(EventKind::Close, listener);
    }

    pub fn onclose(&self) -> Option<Listener<Event>> {
        self.inner.events.slot(EventKind::Close)
    }

    pub fn set_onerror(&self, listener: Option<Listener<Event>>) {
        self.inner.events.set_slot(EventKind::Error, listener);
    }

    pub fn onerror(&self) -> Option<Listener<Event>> {
        self.inner.events.slot(EventKind::Error)
    }

    /// Deferred handshake. Runs once; does nothing if the attempt was
    /// aborted first.
    fn negotiate(&self, peer: Option<Server>) {
        if self.ready_state() != ReadyState::Connecting {
            trace!(id = self.id(), "negotiation skipped");
            return;
        }
        self.emit_monitor(SocketEvent::Connecting(self.url().clone()));

        let Some(server) = peer else {
            self.reject("no server listening at address");
            return;
        };

        if let Some(authorize) = &server.options().authorize {
            if !authorize() {
                self.reject("authentication failed");
                return;
            }
        }

        if let Some(select) = &server.options().select_protocol {
            let selected = select(self.inner.requested.as_slice());
            if !selected.is_empty() && !self.inner.requested.contains(&selected) {
                warn!(id = self.id(), %selected, "server selected a subprotocol that was not offered");
                self.reject("subprotocol negotiation failed");
                return;
            }
            self.inner.conn.lock().protocol = selected;
        }

        let protocol = {
            let mut conn = self.inner.conn.lock();
            if conn.ready_state != ReadyState::Connecting {
                return;
            }
            conn.ready_state = ReadyState::Open;
            conn.protocol.clone()
        };

        debug!(id = self.id(), url = %self.url(), %protocol, "open");
        self.emit_monitor(SocketEvent::Connected {
            address: self.url().clone(),
            protocol,
        });
        self.dispatch(Event::Open);
        server.notify_connection(self);
    }

    /// Negotiation failure: terminal, reported with `NORMAL_CLOSE`.
    fn reject(&self, reason: &str) {
        {
            let mut conn = self.inner.conn.lock();
            if conn.ready_state == ReadyState::Closed {
                return;
            }
            conn.ready_state = ReadyState::Closed;
            conn.peer = None;
        }
        self.detach();
        warn!(id = self.id(), url = %self.url(), reason, "connection failed");

        self.emit_monitor(SocketEvent::ConnectFailed {
            address: self.url().clone(),
            reason: reason.to_string(),
        });
        self.dispatch(Event::Error(reason.to_string()));
        self.finish_terminal(CloseEvent::new(NORMAL_CLOSE, "", false));
    }

    /// Fail an endpoint that is already marked `CLOSED`: detach now, report
    /// `error` then `close` later. The peer is not told.
    fn fail_connection(&self, code: u16, reason: String, cause: &'static str) {
        self.detach();
        debug!(id = self.id(), url = %self.url(), code, cause, "connection failed");

        let this = self.clone();
        self.defer(move || {
            this.emit_monitor(SocketEvent::ConnectFailed {
                address: this.url().clone(),
                reason: cause.to_string(),
            });
            this.dispatch(Event::Error(cause.to_string()));
            this.finish_terminal(CloseEvent::new(code, reason, false));
        });
    }

    /// Endpoint already marked `CLOSING`; queue the close frame.
    fn start_closing(&self, code: u16, reason: String) {
        debug!(id = self.id(), url = %self.url(), code, "closing");
        self.emit_monitor(SocketEvent::Closing(self.url().clone()));

        let this = self.clone();
        self.defer(move || this.process_close_frame(code, reason));
    }

    /// First frame wins; later frames find `CLOSED` and are dropped.
    fn process_close_frame(&self, code: u16, reason: String) {
        let peer = {
            let mut conn = self.inner.conn.lock();
            if conn.ready_state == ReadyState::Closed {
                trace!(id = self.id(), code, "close frame dropped");
                return;
            }
            conn.ready_state = ReadyState::Closed;
            conn.peer.take()
        };
        self.detach();

        let event = CloseEvent::new(code, reason, true);
        self.finish_terminal(event.clone());
        if let Some(server) = peer {
            server.notify_close(self, event);
        }
    }

    fn finish_terminal(&self, event: CloseEvent) {
        debug!(id = self.id(), url = %self.url(), code = event.code, "closed");
        self.emit_monitor(SocketEvent::Closed {
            address: self.url().clone(),
            code: event.code,
            reason: event.reason.clone(),
            was_clean: event.was_clean,
        });
        self.dispatch(Event::Close(event));
    }

    /// Peer-initiated close. Races any local close frame already queued.
    pub(crate) fn close_from_peer(&self, code: u16, reason: String) {
        let mut conn = self.inner.conn.lock();
        let state = conn.ready_state;
        match state {
            ReadyState::Closed => {}
            ReadyState::Connecting => {
                conn.ready_state = ReadyState::Closed;
                conn.peer = None;
                drop(conn);
                self.fail_connection(code, reason, "connection refused by server");
            }
            ReadyState::Open => {
                conn.ready_state = ReadyState::Closing;
                drop(conn);
                self.start_closing(code, reason);
            }
            ReadyState::Closing => {
                drop(conn);
                let this = self.clone();
                self.defer(move || this.process_close_frame(code, reason));
            }
        }
    }

    /// Peer-initiated failure: `error` then an unclean `close`.
    pub(crate) fn fail_from_peer(&self) -> bool {
        let mut conn = self.inner.conn.lock();
        if conn.ready_state == ReadyState::Closed {
            return false;
        }
        conn.ready_state = ReadyState::Closed;
        conn.peer = None;
        drop(conn);
        self.fail_connection(ABNORMAL_CLOSE, String::new(), "connection error");
        true
    }

    /// Deliver a peer message. Dropped unless the endpoint is `OPEN`.
    pub(crate) fn receive(&self, event: MessageEvent) {
        if self.ready_state() != ReadyState::Open {
            trace!(id = self.id(), "message dropped, socket not open");
            return;
        }
        self.dispatch(Event::Message(event));
    }

    /// Queue `task` on the owning network. Dropped if the network is gone.
    fn defer<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.network() {
            Some(network) => network.defer(task),
            None => trace!(id = self.id(), "network dropped, task discarded"),
        }
    }

    fn detach(&self) {
        if let Some(network) = self.network() {
            network.registry().detach(self, self.url());
        }
    }

    fn dispatch(&self, event: Event) {
        let kind = event.kind();
        let invoked = self.inner.events.dispatch(kind, &event);
        trace!(id = self.id(), ?kind, invoked, "dispatch");
    }

    fn emit_monitor(&self, event: SocketEvent) {
        let mut monitors = self.inner.monitors.lock();
        monitors.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl PartialEq for WebSocket {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WebSocket {}

impl fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conn = self.inner.conn.lock();
        f.debug_struct("WebSocket")
            .field("id", &self.inner.id)
            .field("url", &self.inner.address.as_str())
            .field("ready_state", &conn.ready_state)
            .field("protocol", &conn.protocol)
            .finish()
    }
}
