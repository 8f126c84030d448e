//! Typed, synchronous event channels.
//!
//! Listeners run inline during [`Signal::dispatch`], in registration order.
//! A listener cannot reach the emitter it is registered on; anything it
//! needs to record goes through state it captured itself.

use std::fmt;

/// Handle returned by [`Signal::add`], used to remove the listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener<T> {
    id: ListenerId,
    once: bool,
    callback: Box<dyn FnMut(&T)>,
}

/// A typed event channel with synchronous FIFO dispatch.
pub struct Signal<T> {
    listeners: Vec<Listener<T>>,
    next_id: u64,
}

impl<T> Signal<T> {
    /// Create a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    fn push(&mut self, once: bool, callback: Box<dyn FnMut(&T)>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, once, callback });
        id
    }

    /// Register a listener that runs on every dispatch.
    pub fn add(&mut self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        self.push(false, Box::new(callback))
    }

    /// Register a listener that runs on the next dispatch only.
    pub fn add_once(&mut self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        self.push(true, Box::new(callback))
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run every listener with `value`, then drop the one-shot ones.
    pub fn dispatch(&mut self, value: &T) {
        for listener in &mut self.listeners {
            (listener.callback)(value);
        }
        self.listeners.retain(|l| !l.once);
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("listeners", &self.listeners.len()).finish()
    }
}
