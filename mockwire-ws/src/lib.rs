//! # Mockwire WS
//!
//! Simulated WebSocket endpoints for environments without a real transport.
//!
//! ## Overview
//!
//! No bytes move over a wire. What is reproduced is the lifecycle contract of
//! the browser socket API:
//! - **Handshake**: deferred negotiation with optional authorization and
//!   sub-protocol selection on the [`Server`] side
//! - **Messaging**: fire-and-forget delivery in both directions
//! - **Close**: strict argument validation, graceful close handshake, and
//!   forced failure while connecting
//!
//! All asynchrony is a FIFO task queue owned by a [`Network`]; nothing
//! happens until the network is driven with [`Network::run_pending`] or
//! [`Network::run_until_idle`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mockwire_ws::{close, EventKind, Network, ReadyState, Server, ServerOptions, WebSocket};
//!
//! let network = Network::new();
//! let options = ServerOptions::new().with_protocol_selector(|_| "chat".to_string());
//! let server = Server::bind_with_options(&network, "ws://localhost:8080", options).unwrap();
//!
//! let socket = WebSocket::connect(&network, "ws://localhost:8080", ["chat", "superchat"]).unwrap();
//! socket.add_event_listener(EventKind::Open, |_| println!("open"));
//!
//! network.run_until_idle();
//! assert_eq!(socket.ready_state(), ReadyState::Open);
//! assert_eq!(socket.protocol(), "chat");
//! assert_eq!(server.clients().len(), 1);
//!
//! socket.close_with(Some(close::NORMAL_CLOSE), Some("bye")).unwrap();
//! network.run_until_idle();
//! assert_eq!(socket.ready_state(), ReadyState::Closed);
//! ```

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod close;
pub mod event;
pub mod network;
pub mod options;
pub mod server;
pub mod socket;

pub use close::CloseEvent;
pub use event::{Event, EventKind, MessageEvent, Payload, ServerEvent, ServerEventKind};
pub use network::Network;
pub use options::{BinaryType, ServerOptions};
pub use server::Server;
pub use socket::WebSocket;

pub use mockwire_core::address::Address;
pub use mockwire_core::error::{Error, Result};
pub use mockwire_core::event_target::{Listener, ListenerId};
pub use mockwire_core::monitor::{SocketEvent, SocketMonitor};
pub use mockwire_core::state::ReadyState;
