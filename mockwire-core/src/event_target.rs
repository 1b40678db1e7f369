//! Listener registration and dispatch.
//!
//! [`EventTarget`] keeps an ordered list of listeners per event kind plus one
//! distinguished "slot" listener per kind, the equivalent of an `onopen`
//! style property. The slot listener is stored in the same ordered list as
//! every other listener; assigning the slot removes the previous slot
//! listener and appends the new one, leaving listeners added through
//! [`EventTarget::add_listener`] untouched.
//!
//! Dispatch snapshots the listener list and releases the lock before
//! invoking anything, so listeners may add or remove listeners, or trigger
//! further dispatches, without deadlocking.

use hashbrown::HashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::hash::Hash;
use std::sync::Arc;

/// A shared event callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// Handle returned by [`EventTarget::add_listener`], used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registrations<K, E> {
    next_id: u64,
    listeners: HashMap<K, Vec<(ListenerId, Listener<E>)>>,
    slots: HashMap<K, ListenerId>,
}

impl<K: Eq + Hash, E> Registrations<K, E> {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    fn remove(&mut self, kind: &K, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        before != list.len()
    }
}

/// Ordered multi-listener registry keyed by event kind.
pub struct EventTarget<K, E> {
    inner: Mutex<Registrations<K, E>>,
}

impl<K, E> EventTarget<K, E>
where
    K: Copy + Eq + Hash,
{
    /// Create a target with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Registrations {
                next_id: 0,
                listeners: HashMap::new(),
                slots: HashMap::new(),
            }),
        }
    }

    /// Register a listener for `kind`. Listeners fire in registration order.
    pub fn add_listener(&self, kind: K, listener: Listener<E>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        inner.listeners.entry(kind).or_default().push((id, listener));
        id
    }

    /// Remove one listener. Returns false if it was not registered.
    ///
    /// Removing the slot listener this way also clears the slot.
    pub fn remove_listener(&self, kind: K, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        if inner.slots.get(&kind) == Some(&id) {
            inner.slots.remove(&kind);
        }
        inner.remove(&kind, id)
    }

    /// Remove every listener for `kind`, the slot listener included.
    pub fn remove_all(&self, kind: K) -> usize {
        let mut inner = self.inner.lock();
        inner.slots.remove(&kind);
        inner.listeners.remove(&kind).map_or(0, |list| list.len())
    }

    /// Replace the slot listener for `kind`.
    ///
    /// `None` clears the slot. Other listeners are unaffected.
    pub fn set_slot(&self, kind: K, listener: Option<Listener<E>>) {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.slots.remove(&kind) {
            inner.remove(&kind, previous);
        }
        if let Some(listener) = listener {
            let id = inner.next_id();
            inner.listeners.entry(kind).or_default().push((id, listener));
            inner.slots.insert(kind, id);
        }
    }

    /// Current slot listener for `kind`.
    pub fn slot(&self, kind: K) -> Option<Listener<E>> {
        let inner = self.inner.lock();
        let id = inner.slots.get(&kind)?;
        inner
            .listeners
            .get(&kind)?
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, listener)| listener.clone())
    }

    /// Number of listeners registered for `kind`, the slot included.
    pub fn listener_count(&self, kind: K) -> usize {
        self.inner.lock().listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every listener for `kind` in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, kind: K, event: &E) -> usize {
        let snapshot: SmallVec<[Listener<E>; 4]> = {
            let inner = self.inner.lock();
            match inner.listeners.get(&kind) {
                Some(list) => list.iter().map(|(_, l)| l.clone()).collect(),
                None => SmallVec::new(),
            }
        };

        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }
}

impl<K, E> Default for EventTarget<K, E>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
