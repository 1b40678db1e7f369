//! A simulated network: peer registry plus the task queue driving it.
//!
//! Every [`WebSocket`] and [`Server`] belongs to exactly one `Network`.
//! Tests normally create their own instance so that addresses cannot
//! collide across tests; [`Network::global`] exists for code that has no
//! way to thread a handle through.
//!
//! Nothing happens until the network is driven:
//!
//! ```rust
//! use mockwire_ws::{Network, ReadyState, Server, WebSocket};
//!
//! let network = Network::new();
//! let _server = Server::bind(&network, "ws://localhost:8080").unwrap();
//! let socket = WebSocket::connect(&network, "ws://localhost:8080", ["chat"]).unwrap();
//!
//! assert_eq!(socket.ready_state(), ReadyState::Connecting);
//! network.run_until_idle();
//! assert_eq!(socket.ready_state(), ReadyState::Open);
//! ```

use crate::server::Server;
use crate::socket::WebSocket;
use mockwire_core::address::Address;
use mockwire_core::registry::Registry;
use mockwire_core::scheduler::Scheduler;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Process-wide default network
static GLOBAL_NETWORK: Lazy<Network> = Lazy::new(Network::new);

struct NetworkInner {
    registry: Registry<Server, WebSocket>,
    scheduler: Scheduler,
    next_connection_id: AtomicU64,
}

/// Handle to a simulated network. Cheap to clone.
///
/// The network owns its registry and task queue. Servers and endpoints only
/// keep a [`WeakNetwork`], so dropping the last `Network` handle frees the
/// whole graph, including listeners and everything they capture.
#[derive(Clone)]
pub struct Network {
    inner: Arc<NetworkInner>,
}

/// Non-owning network handle held by servers and endpoints.
#[derive(Clone)]
pub(crate) struct WeakNetwork {
    inner: Weak<NetworkInner>,
}

impl WeakNetwork {
    /// `None` once every [`Network`] handle has been dropped.
    pub(crate) fn upgrade(&self) -> Option<Network> {
        self.inner.upgrade().map(|inner| Network { inner })
    }
}

impl Network {
    /// Create an isolated network with no servers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                registry: Registry::new(),
                scheduler: Scheduler::new(),
                next_connection_id: AtomicU64::new(1),
            }),
        }
    }

    /// The process-wide default network.
    pub fn global() -> Self {
        GLOBAL_NETWORK.clone()
    }

    /// Run one scheduling tick: the tasks queued before this call.
    pub fn run_pending(&self) -> usize {
        self.inner.scheduler.run_pending()
    }

    /// Run tasks until nothing is queued.
    pub fn run_until_idle(&self) -> usize {
        self.inner.scheduler.run_until_idle()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.inner.scheduler.pending()
    }

    /// Server bound at `address`, if any.
    pub fn lookup(&self, address: &Address) -> Option<Server> {
        self.inner.registry.lookup(address)
    }

    /// Endpoints attached to the server at `address`.
    pub fn connections(&self, address: &Address) -> Vec<WebSocket> {
        self.inner.registry.connections(address)
    }

    /// Returns true if `socket` is attached to a server.
    pub fn is_attached(&self, socket: &WebSocket) -> bool {
        self.inner.registry.is_attached(socket, socket.url())
    }

    /// All addresses with a bound server.
    pub fn addresses(&self) -> Vec<Address> {
        self.inner.registry.addresses()
    }

    pub(crate) fn downgrade(&self) -> WeakNetwork {
        WeakNetwork {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn registry(&self) -> &Registry<Server, WebSocket> {
        &self.inner.registry
    }

    pub(crate) fn defer<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.scheduler.defer(task);
    }

    pub(crate) fn next_connection_id(&self) -> u64 {
        self.inner.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Network {}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("servers", &self.inner.registry.addresses().len())
            .field("pending", &self.inner.scheduler.pending())
            .finish()
    }
}
