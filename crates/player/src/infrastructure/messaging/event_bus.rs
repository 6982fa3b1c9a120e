//! Event Bus for local notifications.
//!
//! The EventBus provides a push-based subscription model. Subscribers register
//! callbacks that are invoked, in registration order, every time an event is
//! dispatched. Everything runs on the client's single event-loop thread, so
//! subscribers are plain boxed closures without `Send` bounds.
//!
//! A subscriber must not dispatch on the bus that is currently calling it;
//! the bus is mutably borrowed for the duration of a dispatch pass.

/// Event bus for one kind of event.
pub struct EventBus<E> {
    subscribers: Vec<Box<dyn FnMut(&E) + 'static>>,
}

impl<E> EventBus<E> {
    /// Create a new EventBus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Subscribe to all events.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    /// Dispatch an event to all subscribers.
    pub fn dispatch(&mut self, event: &E) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Clear all subscribers.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
