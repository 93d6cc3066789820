//! Touch adapter: gesture recognition over start/move/end signals.
//!
//! Five gestures, each with its own binding slot:
//!
//! | gesture     | when                                                        | phase     | value            |
//! |-------------|-------------------------------------------------------------|-----------|------------------|
//! | `move`      | every move signal with a primary contact                    | `Axis`    | step distance    |
//! | `pinch`     | every move with ≥ 2 contacts and a non-zero start distance  | `Axis`    | scale vs. start  |
//! | `swipe`     | end, primary displacement ≥ `swipe_min_distance`            | `Axis`    | displacement     |
//! | `longPress` | end, held ≥ `long_press` and displacement ≤ `tap_max_distance` | `Pressed` | none          |
//! | `tap`       | end, shorter hold and displacement ≤ `tap_max_distance`     | `Pressed` | none             |
//!
//! End gestures are decided once per contact sequence, when the last contact lifts. The
//! swipe check runs first; a swipe excludes every other gesture for that sequence, however
//! long it took. A tap is a single `Pressed` with no matching `Released`. Only a lone
//! primary contact drives tap, swipe and long-press: a sequence that ever had two contacts
//! down is multi-touch and ends silently. The first two contacts drive pinch. A cancel
//! signal ends the sequence like a final lift.
use super::{Bindable, InputAdapter};
use crate::binding::{BindingCell, TouchBindings};
use crate::event::{DeviceType, Gesture, InputEvent, Phase, RawInput, TouchPoint, TouchRaw};
use crate::rebind::RebindTarget;
use crate::signal::{NativeSignal, TouchPhase, TouchSignal};
use crate::sink::EventSink;
use crate::surface::{ListenerId, Surface};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(500);
pub const DEFAULT_TAP_MAX_DISTANCE: f32 = 10.0;
pub const DEFAULT_SWIPE_MIN_DISTANCE: f32 = 30.0;

/// Construction options for [`TouchAdapter`].
pub struct TouchOptions {
    pub bindings: TouchBindings,
    pub sink: EventSink,
    pub surface: Option<Arc<dyn Surface<TouchSignal>>>,
    pub prevent_default: bool,
    pub long_press: Duration,
    pub tap_max_distance: f32,
    pub swipe_min_distance: f32,
}

impl TouchOptions {
    pub fn new(bindings: TouchBindings, sink: EventSink) -> Self {
        Self {
            bindings,
            sink,
            surface: None,
            prevent_default: false,
            long_press: DEFAULT_LONG_PRESS,
            tap_max_distance: DEFAULT_TAP_MAX_DISTANCE,
            swipe_min_distance: DEFAULT_SWIPE_MIN_DISTANCE,
        }
    }

    pub fn surface(mut self, surface: Arc<dyn Surface<TouchSignal>>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn prevent_default(mut self, on: bool) -> Self {
        self.prevent_default = on;
        self
    }

    pub fn long_press(mut self, threshold: Duration) -> Self {
        self.long_press = threshold;
        self
    }

    pub fn tap_max_distance(mut self, distance: f32) -> Self {
        self.tap_max_distance = distance;
        self
    }

    pub fn swipe_min_distance(mut self, distance: f32) -> Self {
        self.swipe_min_distance = distance;
        self
    }
}

/// Contact sequence being tracked.
#[derive(Default)]
struct Gesturing {
    started_at: Option<Instant>,
    start_points: Vec<TouchPoint>,
    last_points: Vec<TouchPoint>,
    /// Two-contact distance at touch start, when two contacts were down.
    pinch_origin: Option<f32>,
    /// Set once a second contact has been seen in this sequence.
    multi_contact: bool,
}

/// A recognized gesture before its binding is resolved.
struct Recognized {
    gesture: Gesture,
    phase: Phase,
    value: Option<f32>,
    raw: TouchRaw,
}

struct TouchShared {
    bindings: BindingCell<TouchBindings>,
    sink: EventSink,
    prevent_default: bool,
    long_press: Duration,
    tap_max_distance: f32,
    swipe_min_distance: f32,
    state: Mutex<Gesturing>,
}

impl TouchShared {
    fn on_signal(&self, signal: &mut TouchSignal) {
        let recognized = {
            let mut state = self.state.lock();
            match signal.phase {
                TouchPhase::Start => {
                    Self::begin(&mut state, signal);
                    Vec::new()
                }
                TouchPhase::Move => self.track(&mut state, signal),
                TouchPhase::End | TouchPhase::Cancel => self.finish(&mut state, signal),
            }
        };

        if recognized.is_empty() {
            return;
        }

        let bindings = self.bindings.load();
        for gesture in recognized {
            let Some(action_id) = bindings.slot(gesture.gesture) else {
                trace!(gesture = ?gesture.gesture, "unbound touch gesture");
                continue;
            };
            if self.prevent_default {
                signal.prevent_default();
            }
            let event = InputEvent {
                device_type: DeviceType::Touch,
                action_id: action_id.to_owned(),
                phase: gesture.phase,
                timestamp: signal.at,
                value: gesture.value,
                raw: Some(RawInput::Touch(gesture.raw)),
            };
            (self.sink)(&event);
        }
    }

    fn begin(state: &mut Gesturing, signal: &TouchSignal) {
        if state.started_at.is_none() {
            state.started_at = Some(signal.at);
            state.start_points = signal.touches.clone();
        }
        state.last_points = signal.touches.clone();
        if state.pinch_origin.is_none() {
            state.pinch_origin = match signal.touches.as_slice() {
                [a, b, ..] => Some(a.distance(b)),
                _ => None,
            };
        }
        state.multi_contact |= signal.touches.len() >= 2;
    }

    fn track(&self, state: &mut Gesturing, signal: &TouchSignal) -> Vec<Recognized> {
        let points = &signal.touches;
        let mut out = Vec::new();

        if let (Some(current), Some(last)) = (points.first(), state.last_points.first()) {
            let delta_x = current.x - last.x;
            let delta_y = current.y - last.y;
            out.push(Recognized {
                gesture: Gesture::Move,
                phase: Phase::Axis,
                value: Some(delta_x.hypot(delta_y)),
                raw: TouchRaw::Move {
                    delta_x,
                    delta_y,
                    points: points.clone(),
                },
            });
        }

        if let ([a, b, ..], Some(origin)) = (points.as_slice(), state.pinch_origin) {
            let current = a.distance(b);
            if origin > 0.0 && current != 0.0 {
                let scale = current / origin;
                out.push(Recognized {
                    gesture: Gesture::Pinch,
                    phase: Phase::Axis,
                    value: Some(scale),
                    raw: TouchRaw::Pinch {
                        scale,
                        points: points.clone(),
                    },
                });
            }
        }

        state.last_points = points.clone();
        out
    }

    fn finish(&self, state: &mut Gesturing, signal: &TouchSignal) -> Vec<Recognized> {
        if signal.phase == TouchPhase::End && !signal.touches.is_empty() {
            state.last_points = signal.touches.clone();
            return Vec::new();
        }

        let sequence = std::mem::take(state);
        if sequence.multi_contact {
            trace!("multi-contact sequence ended");
            return Vec::new();
        }
        let (Some(&start), Some(&end), Some(started_at)) = (
            sequence.start_points.first(),
            signal.changed.first(),
            sequence.started_at,
        ) else {
            return Vec::new();
        };

        let distance = start.distance(&end);
        let elapsed = signal.at.saturating_duration_since(started_at);

        let recognized = if distance >= self.swipe_min_distance {
            Recognized {
                gesture: Gesture::Swipe,
                phase: Phase::Axis,
                value: Some(distance),
                raw: TouchRaw::Swipe {
                    distance,
                    start,
                    end,
                },
            }
        } else if distance > self.tap_max_distance {
            return Vec::new();
        } else if elapsed >= self.long_press {
            Recognized {
                gesture: Gesture::LongPress,
                phase: Phase::Pressed,
                value: None,
                raw: TouchRaw::LongPress {
                    duration: elapsed,
                    start,
                    end,
                },
            }
        } else {
            Recognized {
                gesture: Gesture::Tap,
                phase: Phase::Pressed,
                value: None,
                raw: TouchRaw::Tap { start, end },
            }
        };
        vec![recognized]
    }
}

/// Touch → canonical events.
pub struct TouchAdapter {
    id: String,
    surface: Option<Arc<dyn Surface<TouchSignal>>>,
    shared: Arc<TouchShared>,
    listener: Option<ListenerId>,
}

impl TouchAdapter {
    pub fn new(options: TouchOptions) -> Self {
        Self {
            id: DeviceType::Touch.as_str().to_owned(),
            surface: options.surface,
            shared: Arc::new(TouchShared {
                bindings: BindingCell::new(options.bindings),
                sink: options.sink,
                prevent_default: options.prevent_default,
                long_press: options.long_press,
                tap_max_distance: options.tap_max_distance,
                swipe_min_distance: options.swipe_min_distance,
                state: Mutex::new(Gesturing::default()),
            }),
            listener: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn rebind_target(&self) -> RebindTarget {
        RebindTarget::Touch(self.binding_cell())
    }
}

impl InputAdapter for TouchAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Touch
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
        let id = surface.add_listener(Arc::new(move |signal: &mut TouchSignal| {
            shared.on_signal(signal)
        }));
        self.listener = Some(id);
        debug!(adapter = %self.id, "touch adapter started");
    }

    fn stop(&mut self) {
        let (Some(surface), Some(id)) = (&self.surface, self.listener.take()) else {
            return;
        };
        surface.remove_listener(id);
        debug!(adapter = %self.id, "touch adapter stopped");
    }
}

impl Bindable for TouchAdapter {
    type Bindings = TouchBindings;

    fn bindings(&self) -> TouchBindings {
        self.shared.bindings.get()
    }

    fn update_bindings(&self, bindings: TouchBindings) {
        self.shared.bindings.replace(bindings);
    }

    fn binding_cell(&self) -> BindingCell<TouchBindings> {
        self.shared.bindings.clone()
    }
}

impl Drop for TouchAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}
