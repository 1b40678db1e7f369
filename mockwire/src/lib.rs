//! # Mockwire
//!
//! Simulated socket endpoints for code that must run without a real
//! transport, typically in automated tests.
//!
//! ## Architecture
//!
//! - **`mockwire-core`**: addresses, validation, task queue, listener and
//!   peer registries (protocol-agnostic)
//! - **Protocol crates**: endpoint state machines built on the core
//! - **`mockwire`**: Public API surface (this crate)
//!
//! ## Protocols (feature-gated)
//!
//! - **`ws`** (default) - browser-style WebSocket lifecycle
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "ws")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mockwire::ws::prelude::*;
//!
//! let network = Network::new();
//! let server = Server::bind(&network, "ws://localhost:8080")?;
//! server.on_message(|_socket, message| {
//!     println!("server got {:?}", message.data);
//! });
//!
//! let socket = WebSocket::connect(&network, "ws://localhost:8080", ["chat"])?;
//! socket.add_event_listener(EventKind::Open, |_| println!("open"));
//!
//! // Nothing happens until the network is driven
//! network.run_until_idle();
//! socket.send("hello")?;
//! socket.close()?;
//! network.run_until_idle();
//! assert_eq!(socket.ready_state(), ReadyState::Closed);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "ws"))]
//! # fn main() {}
//! ```
//!
//! ## Logging
//!
//! Every transition is traced with `tracing`. Call
//! [`dev_tracing::init_tracing`] and set `RUST_LOG=mockwire_ws=debug` to see
//! them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;

// Re-export core types
pub use bytes::Bytes;
pub use tracing;
pub use mockwire_core::address::Address;
pub use mockwire_core::error::{Error, Result};
pub use mockwire_core::state::ReadyState;

/// Simulated WebSocket endpoints.
#[cfg(feature = "ws")]
pub mod ws {
    pub use mockwire_ws::*;

    /// Convenient imports for the WebSocket simulation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mockwire::ws::prelude::*;
    ///
    /// // Now you have:
    /// // - WebSocket, Server, Network, ServerOptions
    /// // - Event, EventKind, CloseEvent, Payload, ReadyState
    /// ```
    pub mod prelude {
        pub use mockwire_ws::close::{ABNORMAL_CLOSE, NORMAL_CLOSE};
        pub use mockwire_ws::{
            CloseEvent, Event, EventKind, MessageEvent, Network, Payload, ReadyState, Server,
            ServerEvent, ServerEventKind, ServerOptions, WebSocket,
        };
    }
}
