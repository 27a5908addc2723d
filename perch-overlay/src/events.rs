//! Typed event bus for overlay notifications.
//!
//! Subscribers are plain closures keyed by a [`SubscriptionId`]. They are
//! called in subscription order for every event and must not call back into
//! the manager; anything that needs to react should queue its own work.

use perch_core::OverlayEvent;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by [`EventBus::subscribe`].
    pub struct SubscriptionId;
}

type Listener = Box<dyn FnMut(&OverlayEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: SlotMap<SubscriptionId, Listener>,
    order: Vec<SubscriptionId>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&OverlayEvent) + 'static) -> SubscriptionId {
        let id = self.listeners.insert(Box::new(listener));
        self.order.push(id);
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.order.retain(|existing| *existing != id);
        self.listeners.remove(id).is_some()
    }

    pub fn emit(&mut self, event: &OverlayEvent) {
        tracing::trace!(?event, "dispatching overlay event");
        for id in &self.order {
            if let Some(listener) = self.listeners.get_mut(*id) {
                listener(event);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use perch_core::OverlayId;

    use super::*;

    fn closed(name: &str) -> OverlayEvent {
        OverlayEvent::Closed {
            id: OverlayId::from(name),
        }
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |event| log.borrow_mut().push(format!("{tag}:{}", event.id())));
        }
        bus.emit(&closed("menu"));
        assert_eq!(*log.borrow(), vec!["first:menu", "second:menu"]);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);

        bus.emit(&closed("a"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&closed("b"));

        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }
}
