//! Gamepad adapter.
//!
//! Gamepads are sampled, not pushed. On every poll the adapter compares each connected
//! pad against its previous sample (kept per slot index):
//!
//! - bound buttons that changed emit `Pressed` (value `1.0`) or `Released` (value `0.0`);
//! - bound axes pass a deadzone filter and emit `Axis` with the filtered value on every
//!   poll where it is non-zero.
//!
//! Polling runs at one of two cadences:
//! - `poll_interval == 0` (default): display-refresh driven. The host calls
//!   [`InputAdapter::frame`](super::InputAdapter::frame) once per frame.
//! - `poll_interval > 0`: the adapter spawns a tokio interval task when started and aborts
//!   it when stopped. Without a runtime it falls back to frame-driven polling.
use super::{Bindable, InputAdapter};
use crate::backends::{GamepadSource, PadSample};
use crate::binding::{BindingCell, GamepadBindings};
use crate::event::{DeviceType, InputEvent, PadControl, Phase, RawInput};
use crate::rebind::RebindTarget;
use crate::sink::EventSink;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Axis magnitude below which input is treated as zero.
pub const DEFAULT_DEADZONE: f32 = 0.15;

/// Zeroes `value` when its magnitude is below `deadzone`.
#[inline]
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Construction options for [`GamepadAdapter`].
pub struct GamepadOptions {
    pub bindings: GamepadBindings,
    pub sink: EventSink,
    /// Where pads are sampled from; without one the adapter is unavailable.
    pub source: Option<Arc<dyn GamepadSource>>,
    pub deadzone: f32,
    /// Zero means refresh-cadence driven (see module docs).
    pub poll_interval: Duration,
}

impl GamepadOptions {
    pub fn new(bindings: GamepadBindings, sink: EventSink) -> Self {
        Self {
            bindings,
            sink,
            source: None,
            deadzone: DEFAULT_DEADZONE,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn source(mut self, source: Arc<dyn GamepadSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn deadzone(mut self, deadzone: f32) -> Self {
        self.deadzone = deadzone;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Previous sample of one pad slot.
#[derive(Default)]
struct PadState {
    buttons: Vec<bool>,
}

struct GamepadShared {
    bindings: BindingCell<GamepadBindings>,
    sink: EventSink,
    source: Option<Arc<dyn GamepadSource>>,
    deadzone: f32,
    previous: Mutex<HashMap<usize, PadState>>,
}

impl GamepadShared {
    fn is_available(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_available())
    }

    fn poll(&self) {
        let Some(source) = &self.source else {
            return;
        };
        if !source.is_available() {
            return;
        }

        let bindings = self.bindings.load();
        let now = Instant::now();
        let mut events = Vec::new();
        {
            let mut previous = self.previous.lock();
            for sample in source.samples() {
                let prev = previous.get(&sample.index);
                self.diff(&bindings, &sample, prev, now, &mut events);
                previous.insert(
                    sample.index,
                    PadState {
                        buttons: sample.buttons,
                    },
                );
            }
        }

        for event in &events {
            (self.sink)(event);
        }
    }

    fn diff(
        &self,
        bindings: &GamepadBindings,
        sample: &PadSample,
        prev: Option<&PadState>,
        now: Instant,
        out: &mut Vec<InputEvent>,
    ) {
        for (&index, action_id) in &bindings.buttons {
            if action_id.is_empty() {
                continue;
            }
            let pressed = sample.button(index);
            let was_pressed = prev
                .and_then(|p| p.buttons.get(index).copied())
                .unwrap_or(false);
            if pressed == was_pressed {
                continue;
            }
            out.push(InputEvent {
                device_type: DeviceType::Gamepad,
                action_id: action_id.clone(),
                phase: if pressed { Phase::Pressed } else { Phase::Released },
                timestamp: now,
                value: Some(if pressed { 1.0 } else { 0.0 }),
                raw: Some(RawInput::Gamepad {
                    slot: sample.index,
                    kind: PadControl::Button,
                    index,
                }),
            });
        }

        for (&index, action_id) in &bindings.axes {
            if action_id.is_empty() {
                continue;
            }
            let value = apply_deadzone(sample.axis(index), self.deadzone);
            if value == 0.0 {
                continue;
            }
            out.push(InputEvent {
                device_type: DeviceType::Gamepad,
                action_id: action_id.clone(),
                phase: Phase::Axis,
                timestamp: now,
                value: Some(value),
                raw: Some(RawInput::Gamepad {
                    slot: sample.index,
                    kind: PadControl::Axis,
                    index,
                }),
            });
        }
    }
}

/// Gamepad → canonical events.
pub struct GamepadAdapter {
    id: String,
    shared: Arc<GamepadShared>,
    poll_interval: Duration,
    active: bool,
    task: Option<JoinHandle<()>>,
}

impl GamepadAdapter {
    pub fn new(options: GamepadOptions) -> Self {
        Self {
            id: DeviceType::Gamepad.as_str().to_owned(),
            shared: Arc::new(GamepadShared {
                bindings: BindingCell::new(options.bindings),
                sink: options.sink,
                source: options.source,
                deadzone: options.deadzone,
                previous: Mutex::new(HashMap::new()),
            }),
            poll_interval: options.poll_interval,
            active: false,
            task: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn deadzone(&self) -> f32 {
        self.shared.deadzone
    }

    /// One sampling pass, regardless of lifecycle state.
    pub fn poll(&self) {
        self.shared.poll();
    }

    pub fn rebind_target(&self) -> RebindTarget {
        RebindTarget::Gamepad(self.binding_cell())
    }

    fn spawn_poll_task(&self) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    adapter = %self.id,
                    "no tokio runtime; gamepad polling falls back to frame()"
                );
                return None;
            }
        };

        let shared = Arc::clone(&self.shared);
        let period = self.poll_interval;
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                shared.poll();
            }
        }))
    }
}

impl InputAdapter for GamepadAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Gamepad
    }

    fn is_available(&self) -> bool {
        self.shared.is_available()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn start(&mut self) {
        if self.active || !self.is_available() {
            return;
        }
        self.active = true;
        if !self.poll_interval.is_zero() {
            self.task = self.spawn_poll_task();
        }
        debug!(
            adapter = %self.id,
            interval_ms = self.poll_interval.as_millis() as u64,
            "gamepad adapter started"
        );
    }

    /// Polls once when active and no interval task is running.
    fn frame(&self) {
        if self.active && self.task.is_none() {
            self.shared.poll();
        }
    }

    fn stop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.active = false;
        debug!(adapter = %self.id, "gamepad adapter stopped");
    }
}

impl Bindable for GamepadAdapter {
    type Bindings = GamepadBindings;

    fn bindings(&self) -> GamepadBindings {
        self.shared.bindings.get()
    }

    fn update_bindings(&self, bindings: GamepadBindings) {
        self.shared.bindings.replace(bindings);
    }

    fn binding_cell(&self) -> BindingCell<GamepadBindings> {
        self.shared.bindings.clone()
    }
}

impl Drop for GamepadAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(all(test, feature = "virtual"))]
mod tests {
    use super::*;
    use crate::backends::VirtualGamepads;

    fn recorder() -> (EventSink, Arc<Mutex<Vec<InputEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&seen);
        let sink: EventSink = Arc::new(move |e: &InputEvent| out.lock().push(e.clone()));
        (sink, seen)
    }

    fn adapter(pads: &VirtualGamepads, interval: Duration) -> (GamepadAdapter, Arc<Mutex<Vec<InputEvent>>>) {
        let (sink, seen) = recorder();
        let mut bindings = GamepadBindings::default();
        bindings.buttons.insert(0, "jump".into());
        bindings.axes.insert(1, "moveY".into());
        let adapter = GamepadAdapter::new(
            GamepadOptions::new(bindings, sink)
                .source(Arc::new(pads.clone()))
                .poll_interval(interval),
        );
        (adapter, seen)
    }

    #[test]
    fn deadzone_filters_small_axis_values() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 4, 2);
        let (mut adapter, seen) = adapter(&pads, Duration::ZERO);
        adapter.start();

        pads.set_axis(0, 1, 0.1);
        adapter.frame();
        assert!(seen.lock().is_empty());

        pads.set_axis(0, 1, 0.2);
        adapter.frame();
        let events = seen.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, Phase::Axis);
        assert_eq!(events[0].value, Some(0.2));
        assert_eq!(
            events[0].raw,
            Some(RawInput::Gamepad {
                slot: 0,
                kind: PadControl::Axis,
                index: 1
            })
        );
    }

    #[test]
    fn held_axis_emits_every_poll() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 1, 2);
        pads.set_axis(0, 1, -0.8);
        let (mut adapter, seen) = adapter(&pads, Duration::ZERO);
        adapter.start();
        adapter.frame();
        adapter.frame();
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn button_transitions_emit_edges_per_slot() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 2, 0);
        pads.connect(3, 2, 0);
        let (mut adapter, seen) = adapter(&pads, Duration::ZERO);
        adapter.start();

        pads.press_button(3, 0);
        adapter.frame();
        adapter.frame();
        pads.release_button(3, 0);
        pads.press_button(3, 1);
        adapter.frame();

        let events = seen.lock();
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].phase, events[0].value), (Phase::Pressed, Some(1.0)));
        assert_eq!((events[1].phase, events[1].value), (Phase::Released, Some(0.0)));
        assert!(events.iter().all(|e| matches!(
            e.raw,
            Some(RawInput::Gamepad { slot: 3, kind: PadControl::Button, index: 0 })
        )));
    }

    #[test]
    fn frame_is_ignored_while_stopped() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 1, 0);
        pads.press_button(0, 0);
        let (mut adapter, seen) = adapter(&pads, Duration::ZERO);

        adapter.frame();
        assert!(seen.lock().is_empty());

        adapter.start();
        adapter.start();
        adapter.frame();
        adapter.stop();
        adapter.stop();
        pads.release_button(0, 0);
        adapter.frame();

        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn unavailable_without_source() {
        let (sink, _) = recorder();
        let mut adapter = GamepadAdapter::new(GamepadOptions::new(GamepadBindings::default(), sink));
        assert!(!adapter.is_available());
        adapter.start();
        assert!(!adapter.is_active());
    }

    #[test]
    fn apply_deadzone_boundaries() {
        assert_eq!(apply_deadzone(0.149, DEFAULT_DEADZONE), 0.0);
        assert_eq!(apply_deadzone(-0.149, DEFAULT_DEADZONE), 0.0);
        assert_eq!(apply_deadzone(-0.5, DEFAULT_DEADZONE), -0.5);
    }

    #[tokio::test]
    async fn interval_task_polls_until_stopped() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 1, 0);
        let (mut adapter, seen) = adapter(&pads, Duration::from_millis(5));
        adapter.start();

        pads.press_button(0, 0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(seen.lock().len(), 1);

        adapter.stop();
        pads.release_button(0, 0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(seen.lock().len(), 1);
    }
}
