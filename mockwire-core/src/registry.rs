//! Peer registry for simulated endpoints.
//!
//! The registry indexes peers ("servers") by [`Address`] and records which
//! connections are attached to each one. It owns neither side: entries hold
//! cheap clone handles, and an entry lives exactly from `bind` to `unbind`.
//!
//! # Usage
//!
//! ```rust
//! use mockwire_core::address::Address;
//! use mockwire_core::registry::Registry;
//!
//! let registry: Registry<&'static str, u32> = Registry::new();
//! let address = Address::parse("ws://localhost:8080").unwrap();
//!
//! // No peer yet: the connection is not recorded
//! assert_eq!(registry.attach(1, &address), None);
//!
//! registry.bind(address.clone(), "server").unwrap();
//! assert_eq!(registry.attach(1, &address), Some("server"));
//! assert_eq!(registry.connections(&address), vec![1]);
//!
//! assert!(registry.detach(&1, &address));
//! assert!(!registry.detach(&1, &address));
//! ```
//!
//! No shard guard escapes a method call, so callbacks invoked with values
//! returned from here may re-enter the registry freely.

use crate::address::Address;
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

struct Binding<P, C> {
    peer: P,
    connections: Vec<C>,
}

/// Index of peers and their attached connections, keyed by address.
pub struct Registry<P, C> {
    bindings: DashMap<Address, Binding<P, C>>,
}

impl<P, C> Registry<P, C>
where
    P: Clone,
    C: Clone + PartialEq,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Register `peer` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressInUse`] if a peer is already bound there.
    pub fn bind(&self, address: Address, peer: P) -> Result<()> {
        match self.bindings.entry(address) {
            Entry::Occupied(occupied) => Err(Error::AddressInUse(occupied.key().to_string())),
            Entry::Vacant(vacant) => {
                debug!(address = %vacant.key(), "peer bound");
                vacant.insert(Binding {
                    peer,
                    connections: Vec::new(),
                });
                Ok(())
            }
        }
    }

    /// Remove the peer at `address`, returning the connections that were
    /// still attached to it.
    pub fn unbind(&self, address: &Address) -> Vec<C> {
        match self.bindings.remove(address) {
            Some((_, binding)) => {
                debug!(%address, attached = binding.connections.len(), "peer unbound");
                binding.connections
            }
            None => Vec::new(),
        }
    }

    /// Attach `conn` to the peer at `address`.
    ///
    /// Returns the peer, or `None` (without recording the connection) when
    /// nothing is bound there.
    pub fn attach(&self, conn: C, address: &Address) -> Option<P> {
        let mut binding = self.bindings.get_mut(address)?;
        if !binding.connections.contains(&conn) {
            binding.connections.push(conn);
        }
        Some(binding.peer.clone())
    }

    /// Detach `conn` from `address`. Returns false if it was not attached,
    /// so a repeated detach is harmless.
    pub fn detach(&self, conn: &C, address: &Address) -> bool {
        let Some(mut binding) = self.bindings.get_mut(address) else {
            return false;
        };
        let before = binding.connections.len();
        binding.connections.retain(|c| c != conn);
        before != binding.connections.len()
    }

    /// Peer bound at `address`, if any.
    pub fn lookup(&self, address: &Address) -> Option<P> {
        self.bindings.get(address).map(|b| b.peer.clone())
    }

    /// Connections currently attached to `address`, in attach order.
    pub fn connections(&self, address: &Address) -> Vec<C> {
        self.bindings
            .get(address)
            .map(|b| b.connections.clone())
            .unwrap_or_default()
    }

    /// Returns true if `conn` is attached at `address`.
    pub fn is_attached(&self, conn: &C, address: &Address) -> bool {
        self.bindings
            .get(address)
            .is_some_and(|b| b.connections.contains(conn))
    }

    /// All bound addresses. Primarily useful for debugging and testing.
    pub fn addresses(&self) -> Vec<Address> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<P, C> Default for Registry<P, C>
where
    P: Clone,
    C: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}
