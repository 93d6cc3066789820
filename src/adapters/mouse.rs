//! Mouse adapter.
//!
//! Buttons map through the button table to `Pressed`/`Released`. The wheel slot gets one
//! `Axis` event per wheel signal carrying the signed vertical delta. The movement slot gets
//! an `Axis` event carrying the magnitude of the frame-to-frame displacement, so the
//! action measures how much the pointer moved, not where it is.
use super::{Bindable, InputAdapter};
use crate::binding::{BindingCell, MouseBindings};
use crate::event::{DeviceType, InputEvent, MouseRaw, Phase, RawInput};
use crate::rebind::RebindTarget;
use crate::signal::{MouseSignal, MouseSignalKind, NativeSignal};
use crate::sink::EventSink;
use crate::surface::{ListenerId, Surface};
use std::sync::Arc;
use tracing::{debug, trace};

/// Construction options for [`MouseAdapter`].
pub struct MouseOptions {
    pub bindings: MouseBindings,
    pub sink: EventSink,
    pub surface: Option<Arc<dyn Surface<MouseSignal>>>,
    /// Prevent the host's default handling of bound, cancelable signals.
    pub prevent_default: bool,
}

impl MouseOptions {
    pub fn new(bindings: MouseBindings, sink: EventSink) -> Self {
        Self {
            bindings,
            sink,
            surface: None,
            prevent_default: false,
        }
    }

    pub fn surface(mut self, surface: Arc<dyn Surface<MouseSignal>>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn prevent_default(mut self, on: bool) -> Self {
        self.prevent_default = on;
        self
    }
}

struct MouseShared {
    bindings: BindingCell<MouseBindings>,
    sink: EventSink,
    prevent_default: bool,
}

impl MouseShared {
    fn on_signal(&self, signal: &mut MouseSignal) {
        let bindings = self.bindings.load();
        let (action_id, phase, value, raw) = match signal.kind {
            MouseSignalKind::ButtonDown { button } => (
                bindings.button(button),
                Phase::Pressed,
                None,
                MouseRaw::Button { button },
            ),
            MouseSignalKind::ButtonUp { button } => (
                bindings.button(button),
                Phase::Released,
                None,
                MouseRaw::Button { button },
            ),
            MouseSignalKind::Wheel { delta_x, delta_y } => (
                bindings.wheel(),
                Phase::Axis,
                Some(delta_y),
                MouseRaw::Wheel { delta_x, delta_y },
            ),
            MouseSignalKind::Move {
                movement_x,
                movement_y,
            } => (
                bindings.movement(),
                Phase::Axis,
                Some(movement_x.hypot(movement_y)),
                MouseRaw::Move {
                    movement_x,
                    movement_y,
                },
            ),
        };

        let Some(action_id) = action_id else {
            trace!(kind = ?signal.kind, "unbound mouse signal");
            return;
        };

        if self.prevent_default {
            signal.prevent_default();
        }

        let event = InputEvent {
            device_type: DeviceType::Mouse,
            action_id: action_id.to_owned(),
            phase,
            timestamp: signal.at,
            value,
            raw: Some(RawInput::Mouse(raw)),
        };
        (self.sink)(&event);
    }
}

/// Mouse → canonical events.
pub struct MouseAdapter {
    id: String,
    surface: Option<Arc<dyn Surface<MouseSignal>>>,
    shared: Arc<MouseShared>,
    listener: Option<ListenerId>,
}

impl MouseAdapter {
    pub fn new(options: MouseOptions) -> Self {
        Self {
            id: DeviceType::Mouse.as_str().to_owned(),
            surface: options.surface,
            shared: Arc::new(MouseShared {
                bindings: BindingCell::new(options.bindings),
                sink: options.sink,
                prevent_default: options.prevent_default,
            }),
            listener: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn rebind_target(&self) -> RebindTarget {
        RebindTarget::Mouse(self.binding_cell())
    }
}

impl InputAdapter for MouseAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Mouse
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
        let id = surface.add_listener(Arc::new(move |signal: &mut MouseSignal| {
            shared.on_signal(signal)
        }));
        self.listener = Some(id);
        debug!(adapter = %self.id, "mouse adapter started");
    }

    fn stop(&mut self) {
        let (Some(surface), Some(id)) = (&self.surface, self.listener.take()) else {
            return;
        };
        surface.remove_listener(id);
        debug!(adapter = %self.id, "mouse adapter stopped");
    }
}

impl Bindable for MouseAdapter {
    type Bindings = MouseBindings;

    fn bindings(&self) -> MouseBindings {
        self.shared.bindings.get()
    }

    fn update_bindings(&self, bindings: MouseBindings) {
        self.shared.bindings.replace(bindings);
    }

    fn binding_cell(&self) -> BindingCell<MouseBindings> {
        self.shared.bindings.clone()
    }
}

impl Drop for MouseAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}
