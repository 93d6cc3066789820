use crate::action::InputAction;
use crate::adapters::InputAdapter;
use crate::event::InputEvent;
use crate::router::{Router, Subscription};
use crate::sink::EventSink;
use tracing::{debug, info};

/// Composition root: owns the adapters and the router they feed.
///
/// Adapters are keyed by [`InputAdapter::id`] and kept in insertion order.
pub struct InputManager {
    router: Router,
    adapters: Vec<Box<dyn InputAdapter>>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::with_router(Router::new())
    }

    pub fn with_router(router: Router) -> Self {
        Self {
            router,
            adapters: Vec::new(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Adds an adapter. One already registered under the same id is stopped and
    /// replaced in place.
    pub fn add_adapter<A: InputAdapter + 'static>(&mut self, adapter: A) {
        self.add_boxed(Box::new(adapter));
    }

    pub fn add_boxed(&mut self, adapter: Box<dyn InputAdapter>) {
        match self.position(adapter.id()) {
            Some(index) => {
                let mut previous = std::mem::replace(&mut self.adapters[index], adapter);
                previous.stop();
                debug!(adapter = %previous.id(), "adapter replaced");
            }
            None => {
                debug!(adapter = %adapter.id(), device = %adapter.device_type(), "adapter added");
                self.adapters.push(adapter);
            }
        }
    }

    /// Stops and returns the adapter registered under `id`.
    pub fn remove_adapter(&mut self, id: &str) -> Option<Box<dyn InputAdapter>> {
        let index = self.position(id)?;
        let mut adapter = self.adapters.remove(index);
        adapter.stop();
        debug!(adapter = %id, "adapter removed");
        Some(adapter)
    }

    pub fn adapter(&self, id: &str) -> Option<&dyn InputAdapter> {
        self.adapters
            .iter()
            .find(|a| a.id() == id)
            .map(|a| &**a)
    }

    pub fn adapter_mut(&mut self, id: &str) -> Option<&mut (dyn InputAdapter + 'static)> {
        self.adapters
            .iter_mut()
            .find(|a| a.id() == id)
            .map(|a| &mut **a)
    }

    pub fn adapter_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.adapters.iter().position(|a| a.id() == id)
    }

    /// Starts every available adapter. Unavailable ones are skipped.
    pub fn start(&mut self) {
        let mut started = 0;
        for adapter in self.adapters.iter_mut() {
            if adapter.is_available() {
                adapter.start();
                started += 1;
            } else {
                debug!(adapter = %adapter.id(), "adapter unavailable, not started");
            }
        }
        info!(started, total = self.adapters.len(), "input adapters started");
    }

    /// Forwards a display-frame tick to every adapter.
    pub fn frame(&self) {
        for adapter in &self.adapters {
            adapter.frame();
        }
    }

    pub fn stop(&mut self) {
        for adapter in self.adapters.iter_mut() {
            adapter.stop();
        }
        debug!("input adapters stopped");
    }

    pub fn register_action(&self, action: InputAction) {
        self.router.register_action(action);
    }

    pub fn action(&self, id: &str) -> Option<InputAction> {
        self.router.get_action(id)
    }

    pub fn actions(&self) -> Vec<InputAction> {
        self.router.list_actions()
    }

    pub fn on_action(
        &self,
        handler: impl Fn(&InputEvent, &InputAction) + Send + Sync + 'static,
    ) -> Subscription {
        self.router.on_action(handler)
    }

    pub fn emit(&self, event: &InputEvent) {
        self.router.emit(event);
    }

    /// Sink adapters can emit into; routes through this manager's router.
    pub fn event_sink(&self) -> EventSink {
        self.router.sink()
    }
}

impl Drop for InputManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DeviceType, Phase};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    struct FakeAdapter {
        id: &'static str,
        available: bool,
        active: bool,
        counters: Counters,
    }

    impl FakeAdapter {
        fn new(id: &'static str, available: bool) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let counters = Counters::default();
            let (starts, stops) = (Arc::clone(&counters.starts), Arc::clone(&counters.stops));
            let adapter = Self {
                id,
                available,
                active: false,
                counters,
            };
            (adapter, starts, stops)
        }
    }

    impl InputAdapter for FakeAdapter {
        fn id(&self) -> &str {
            self.id
        }

        fn device_type(&self) -> DeviceType {
            DeviceType::Keyboard
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn start(&mut self) {
            self.active = true;
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&mut self) {
            if self.active {
                self.active = false;
                self.counters.stops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn start_skips_unavailable_adapters() {
        let mut manager = InputManager::new();
        let (ready, ready_starts, _) = FakeAdapter::new("ready", true);
        let (absent, absent_starts, _) = FakeAdapter::new("absent", false);
        manager.add_adapter(ready);
        manager.add_adapter(absent);

        manager.start();
        assert_eq!(ready_starts.load(Ordering::SeqCst), 1);
        assert_eq!(absent_starts.load(Ordering::SeqCst), 0);
        assert!(manager.adapter("ready").is_some_and(|a| a.is_active()));
    }

    #[test]
    fn same_id_replaces_in_place_and_stops_previous() {
        let mut manager = InputManager::new();
        let (first, _, first_stops) = FakeAdapter::new("kb", true);
        let (other, _, _) = FakeAdapter::new("pad", true);
        manager.add_adapter(first);
        manager.add_adapter(other);
        manager.start();

        let (second, _, _) = FakeAdapter::new("kb", true);
        manager.add_adapter(second);

        assert_eq!(first_stops.load(Ordering::SeqCst), 1);
        assert_eq!(manager.adapter_ids(), vec!["kb", "pad"]);
        assert!(!manager.adapter("kb").is_some_and(|a| a.is_active()));
    }

    #[test]
    fn remove_stops_and_forgets() {
        let mut manager = InputManager::new();
        let (adapter, _, stops) = FakeAdapter::new("kb", true);
        manager.add_adapter(adapter);
        manager.start();

        assert!(manager.remove_adapter("kb").is_some());
        assert!(manager.remove_adapter("kb").is_none());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(manager.adapter_ids().is_empty());
    }

    #[test]
    fn event_sink_routes_to_subscribers() {
        let manager = InputManager::new();
        manager.register_action(InputAction::new("jump", "Jump"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = manager.on_action(move |_, action| {
            assert_eq!(action.label, "Jump");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let sink = manager.event_sink();
        sink(&InputEvent::new(DeviceType::Keyboard, "jump", Phase::Pressed));
        sink(&InputEvent::new(DeviceType::Keyboard, "unknown", Phase::Pressed));
        manager.emit(&InputEvent::new(DeviceType::Keyboard, "jump", Phase::Released));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(manager.actions().len(), 1);
        assert!(manager.action("jump").is_some());
    }
}
