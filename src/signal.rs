//! Synchronous signal fan-out with scoped subscriptions
//!
//! A [`Signal`] delivers every emitted value to its handlers in the order
//! they were connected, synchronously, before `emit` returns. Connecting
//! hands out a [`Subscription`] which disconnects the handler when dropped,
//! so a component that stores its subscriptions cannot leak handlers or
//! receive callbacks after it let go of them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<E> = Rc<dyn Fn(&E)>;

struct Slot<E> {
    id: u64,
    handler: Handler<E>,
}

struct Slots<E> {
    next_id: u64,
    slots: Vec<Slot<E>>,
}

impl<E> Slots<E> {
    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }
}

trait Disconnect {
    fn disconnect(&self, id: u64);
}

impl<E> Disconnect for RefCell<Slots<E>> {
    fn disconnect(&self, id: u64) {
        self.borrow_mut().slots.retain(|s| s.id != id);
    }
}

/// Ordered, single-threaded event fan-out
pub struct Signal<E> {
    inner: Rc<RefCell<Slots<E>>>,
}

impl<E: 'static> Signal<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Slots {
                next_id: 1,
                slots: Vec::new(),
            })),
        }
    }

    /// Connect a handler; it stays connected while the subscription lives
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = {
            let mut slots = self.inner.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.slots.push(Slot {
                id,
                handler: Rc::new(handler),
            });
            id
        };

        let owner: Rc<dyn Disconnect> = self.inner.clone();
        Subscription {
            id,
            owner: Some(Rc::downgrade(&owner)),
        }
    }

    /// Deliver `event` to every connected handler in connection order
    ///
    /// Handlers may connect or disconnect while the emission runs. A handler
    /// disconnected by an earlier handler is skipped.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<(u64, Handler<E>)> = self
            .inner
            .borrow()
            .slots
            .iter()
            .map(|s| (s.id, s.handler.clone()))
            .collect();

        for (id, handler) in snapshot {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            handler(event);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }
}

impl<E: 'static> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.inner.borrow().slots.len())
            .finish()
    }
}

/// Connection to a [`Signal`]; disconnects on drop
pub struct Subscription {
    id: u64,
    owner: Option<Weak<dyn Disconnect>>,
}

impl Subscription {
    /// Disconnect now. Disconnecting twice is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(owner) = self.owner.take().and_then(|w| w.upgrade()) {
            owner.disconnect(self.id);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.owner.as_ref().is_some_and(|w| w.strong_count() > 0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
