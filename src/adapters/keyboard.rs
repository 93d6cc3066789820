//! Keyboard adapter.
//!
//! Resolves each key signal by physical code first, then by symbolic key. A first
//! key-down emits `Pressed`, auto-repeated downs emit `Repeat` (or nothing when
//! `allow_repeat` is off), key-up emits `Released`. The adapter keeps no held-key set;
//! use the [`SnapshotStore`](crate::SnapshotStore) for "currently held".
use super::{Bindable, InputAdapter};
use crate::binding::{BindingCell, KeyboardBindings};
use crate::event::{DeviceType, InputEvent, Phase, RawInput};
use crate::rebind::RebindTarget;
use crate::signal::{KeySignal, KeyState, NativeSignal};
use crate::sink::EventSink;
use crate::surface::{ListenerId, Surface};
use std::sync::Arc;
use tracing::{debug, trace};

/// Construction options for [`KeyboardAdapter`].
pub struct KeyboardOptions {
    pub bindings: KeyboardBindings,
    pub sink: EventSink,
    /// Surface to listen on; without one the adapter is unavailable.
    pub surface: Option<Arc<dyn Surface<KeySignal>>>,
    /// Prevent the host's default handling of bound keys.
    pub prevent_default: bool,
    /// Emit `Repeat` for auto-repeated key-downs. Off by default.
    pub allow_repeat: bool,
}

impl KeyboardOptions {
    pub fn new(bindings: KeyboardBindings, sink: EventSink) -> Self {
        Self {
            bindings,
            sink,
            surface: None,
            prevent_default: false,
            allow_repeat: false,
        }
    }

    pub fn surface(mut self, surface: Arc<dyn Surface<KeySignal>>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn prevent_default(mut self, on: bool) -> Self {
        self.prevent_default = on;
        self
    }

    pub fn allow_repeat(mut self, on: bool) -> Self {
        self.allow_repeat = on;
        self
    }
}

/// State reachable from the surface listener.
struct KeyboardShared {
    bindings: BindingCell<KeyboardBindings>,
    sink: EventSink,
    prevent_default: bool,
    allow_repeat: bool,
}

impl KeyboardShared {
    fn on_signal(&self, signal: &mut KeySignal) {
        let phase = match signal.state {
            KeyState::Down if signal.repeat => {
                if !self.allow_repeat {
                    return;
                }
                Phase::Repeat
            }
            KeyState::Down => Phase::Pressed,
            KeyState::Up => Phase::Released,
        };

        let bindings = self.bindings.load();
        let Some(action_id) = bindings.resolve(&signal.code, &signal.key) else {
            trace!(code = %signal.code, key = %signal.key, "unbound key");
            return;
        };

        if self.prevent_default {
            signal.prevent_default();
        }

        let event = InputEvent {
            device_type: DeviceType::Keyboard,
            action_id: action_id.to_owned(),
            phase,
            timestamp: signal.at,
            value: None,
            raw: Some(RawInput::Keyboard {
                code: signal.code.clone(),
                key: signal.key.clone(),
            }),
        };
        (self.sink)(&event);
    }
}

/// Keyboard → canonical events.
pub struct KeyboardAdapter {
    id: String,
    surface: Option<Arc<dyn Surface<KeySignal>>>,
    shared: Arc<KeyboardShared>,
    listener: Option<ListenerId>,
}

impl KeyboardAdapter {
    pub fn new(options: KeyboardOptions) -> Self {
        Self {
            id: DeviceType::Keyboard.as_str().to_owned(),
            surface: options.surface,
            shared: Arc::new(KeyboardShared {
                bindings: BindingCell::new(options.bindings),
                sink: options.sink,
                prevent_default: options.prevent_default,
                allow_repeat: options.allow_repeat,
            }),
            listener: None,
        }
    }

    /// Overrides the manager id (for hosts running several keyboards).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn rebind_target(&self) -> RebindTarget {
        RebindTarget::Keyboard(self.binding_cell())
    }
}

impl InputAdapter for KeyboardAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Keyboard
    }

    fn is_available(&self) -> bool {
        self.surface.is_some()
    }

    fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    fn start(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        if self.listener.is_some() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let id = surface.add_listener(Arc::new(move |signal: &mut KeySignal| {
            shared.on_signal(signal)
        }));
        self.listener = Some(id);
        debug!(adapter = %self.id, "keyboard adapter started");
    }

    fn stop(&mut self) {
        let (Some(surface), Some(id)) = (&self.surface, self.listener.take()) else {
            return;
        };
        surface.remove_listener(id);
        debug!(adapter = %self.id, "keyboard adapter stopped");
    }
}

impl Bindable for KeyboardAdapter {
    type Bindings = KeyboardBindings;

    fn bindings(&self) -> KeyboardBindings {
        self.shared.bindings.get()
    }

    fn update_bindings(&self, bindings: KeyboardBindings) {
        self.shared.bindings.replace(bindings);
    }

    fn binding_cell(&self) -> BindingCell<KeyboardBindings> {
        self.shared.bindings.clone()
    }
}

impl Drop for KeyboardAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SignalBus;
    use parking_lot::Mutex;

    type Recorded = Arc<Mutex<Vec<InputEvent>>>;

    fn recorder() -> (EventSink, Recorded) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&seen);
        let sink: EventSink = Arc::new(move |e: &InputEvent| out.lock().push(e.clone()));
        (sink, seen)
    }

    fn setup(allow_repeat: bool) -> (Arc<SignalBus<KeySignal>>, KeyboardAdapter, Recorded) {
        let bus = SignalBus::<KeySignal>::shared();
        let (sink, seen) = recorder();
        let bindings = KeyboardBindings::new().with("KeyW", "moveForward");
        let adapter = KeyboardAdapter::new(
            KeyboardOptions::new(bindings, sink)
                .surface(bus.clone())
                .allow_repeat(allow_repeat),
        );
        (bus, adapter, seen)
    }

    #[test]
    fn repeat_suppressed_yields_press_then_release() {
        let (bus, mut adapter, seen) = setup(false);
        adapter.start();

        bus.dispatch(KeySignal::down("KeyW", "w"));
        bus.dispatch(KeySignal::down("KeyW", "w").repeated());
        bus.dispatch(KeySignal::up("KeyW", "w"));

        let phases: Vec<_> = seen.lock().iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![Phase::Pressed, Phase::Released]);
        assert!(seen
            .lock()
            .iter()
            .all(|e| e.action_id == "moveForward" && e.device_type == DeviceType::Keyboard));
    }

    #[test]
    fn repeat_allowed_emits_repeat_phase() {
        let (bus, mut adapter, seen) = setup(true);
        adapter.start();

        bus.dispatch(KeySignal::down("KeyW", "w"));
        bus.dispatch(KeySignal::down("KeyW", "w").repeated());

        let phases: Vec<_> = seen.lock().iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![Phase::Pressed, Phase::Repeat]);
    }

    #[test]
    fn falls_back_to_symbolic_key_and_ignores_unbound() {
        let (bus, mut adapter, seen) = setup(false);
        adapter.update_bindings(KeyboardBindings::new().with("Enter", "confirm"));
        adapter.start();

        bus.dispatch(KeySignal::down("NumpadEnter", "Enter"));
        bus.dispatch(KeySignal::down("KeyQ", "q"));

        let events = seen.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action_id, "confirm");
        assert_eq!(
            events[0].raw,
            Some(RawInput::Keyboard {
                code: "NumpadEnter".into(),
                key: "Enter".into()
            })
        );
    }

    #[test]
    fn lifecycle_is_idempotent() {
        let (bus, mut adapter, seen) = setup(false);
        adapter.start();
        adapter.start();
        assert_eq!(bus.listener_count(), 1);

        adapter.stop();
        adapter.stop();
        assert_eq!(bus.listener_count(), 0);
        assert!(!adapter.is_active());

        bus.dispatch(KeySignal::down("KeyW", "w"));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn unavailable_without_surface() {
        let (sink, _) = recorder();
        let mut adapter = KeyboardAdapter::new(KeyboardOptions::new(KeyboardBindings::new(), sink));
        assert!(!adapter.is_available());
        adapter.start();
        assert!(!adapter.is_active());
    }

    #[test]
    fn prevent_default_only_for_bound_keys() {
        let bus = SignalBus::<KeySignal>::shared();
        let (sink, _) = recorder();
        let mut adapter = KeyboardAdapter::new(
            KeyboardOptions::new(KeyboardBindings::new().with("Space", "jump"), sink)
                .surface(bus.clone())
                .prevent_default(true),
        );
        adapter.start();

        assert!(bus.dispatch(KeySignal::down("Space", " ")).default_prevented());
        assert!(!bus.dispatch(KeySignal::down("Tab", "Tab")).default_prevented());
    }

    #[test]
    fn bindings_are_copied_both_ways() {
        let (_bus, adapter, _) = setup(false);
        let before = adapter.bindings();
        adapter.update_bindings(KeyboardBindings::new().with("KeyS", "moveBack"));
        assert_eq!(before.get("KeyW"), Some("moveForward"));
        assert_eq!(adapter.bindings().get("KeyW"), None);
        assert_eq!(adapter.bindings().get("KeyS"), Some("moveBack"));
    }
}
