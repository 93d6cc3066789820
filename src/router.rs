//! Action router: matches canonical events to registered actions and notifies subscribers.
use crate::action::{ActionRegistry, InputAction};
use crate::event::InputEvent;
use crate::sink::EventSink;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Subscriber callback, invoked with the event and the action it resolved to.
pub type ActionHandler = Arc<dyn Fn(&InputEvent, &InputAction) + Send + Sync>;

struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, ActionHandler)>,
}

/// Registry plus subscriber fan-out.
///
/// Cloning shares both the registry and the subscriber list.
#[derive(Clone)]
pub struct Router {
    registry: ActionRegistry,
    subscribers: Arc<Mutex<Subscribers>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_registry(ActionRegistry::new())
    }

    /// Builds a router over an existing registry.
    pub fn with_registry(registry: ActionRegistry) -> Self {
        Self {
            registry,
            subscribers: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn register_action(&self, action: InputAction) {
        self.registry.register(action);
    }

    pub fn get_action(&self, id: &str) -> Option<InputAction> {
        self.registry.get(id)
    }

    pub fn list_actions(&self) -> Vec<InputAction> {
        self.registry.list()
    }

    /// Adds a subscriber. It stays registered until [`Subscription::unsubscribe`].
    pub fn on_action(
        &self,
        handler: impl Fn(&InputEvent, &InputAction) + Send + Sync + 'static,
    ) -> Subscription {
        let mut subs = self.subscribers.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.entries.push((id, Arc::new(handler)));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().entries.len()
    }

    /// Dispatches `event` to every subscriber, in subscription order.
    ///
    /// Events naming an unregistered action are dropped. The subscriber list is captured
    /// before the first handler runs.
    pub fn emit(&self, event: &InputEvent) {
        let Some(action) = self.registry.get(&event.action_id) else {
            trace!(action = %event.action_id, "dropping event for unregistered action");
            return;
        };

        let handlers: Vec<ActionHandler> = self
            .subscribers
            .lock()
            .entries
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in handlers {
            handler(event, &action);
        }
    }

    /// This router as an event sink.
    pub fn sink(&self) -> EventSink {
        let router = self.clone();
        Arc::new(move |event: &InputEvent| router.emit(event))
    }
}

/// Handle for removing a subscriber. Dropping it leaves the subscriber in place.
#[must_use = "dropping a Subscription keeps the handler registered"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}
