//! Mockwire Core
//!
//! This crate contains the protocol-agnostic building blocks for simulated
//! socket endpoints:
//! - Address validation (`address`)
//! - Sub-protocol list validation (`protocols`)
//! - Ready-state enumeration (`state`)
//! - Deferred task queue (`scheduler`)
//! - Listener registry with single-slot accessors (`event_target`)
//! - Peer registry keyed by address (`registry`)
//! - Lifecycle monitoring (`monitor`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
pub mod address;
pub mod error;
pub mod event_target;
pub mod monitor;
pub mod protocols;
pub mod registry;
pub mod scheduler;
pub mod state;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::address::Address;
    pub use crate::error::{Error, Result};
    pub use crate::event_target::{EventTarget, Listener, ListenerId};
    pub use crate::monitor::{SocketEvent, SocketMonitor};
    pub use crate::protocols::{validate_protocols, Protocols};
    pub use crate::registry::Registry;
    pub use crate::scheduler::Scheduler;
    pub use crate::state::ReadyState;
}
