//! Canonical events.
//!
//! Every adapter speaks the same vocabulary: a device-agnostic [`InputEvent`] naming the
//! action it resolved to, the [`Phase`] of the change, and a monotonic timestamp.
//!
//! ## Value conventions
//! - **Buttons / keys:** `Pressed` / `Released` edges. Gamepad buttons carry `1.0` / `0.0`,
//!   keyboard and mouse buttons carry no value (consumers treat a missing press value as `1.0`).
//! - **Gamepad axes:** `[-1.0, 1.0]` after the deadzone filter.
//! - **Mouse wheel:** signed vertical delta in the units the host reports.
//! - **Mouse / touch movement:** Euclidean magnitude of the frame-to-frame displacement.
//! - **Pinch:** scale relative to the distance at touch start (`1.0` = unchanged).
//!
//! ### Raw payloads
//! [`InputEvent::raw`] carries a [`RawInput`] describing *which* physical control fired.
//! The router and snapshot store never look at it; the rebinder uses it to decide which
//! binding slot to rewrite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Device family an adapter normalizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Keyboard,
    Mouse,
    Gamepad,
    Touch,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [
        DeviceType::Keyboard,
        DeviceType::Mouse,
        DeviceType::Gamepad,
        DeviceType::Touch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Keyboard => "keyboard",
            DeviceType::Mouse => "mouse",
            DeviceType::Gamepad => "gamepad",
            DeviceType::Touch => "touch",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change an event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pressed,
    Released,
    Repeat,
    Axis,
}

/// Gamepad control family (button or axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PadControl {
    Button,
    Axis,
}

/// A single touch contact position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &TouchPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Mouse control that produced an event.
#[derive(Clone, Debug, PartialEq)]
pub enum MouseRaw {
    Button { button: u16 },
    Wheel { delta_x: f32, delta_y: f32 },
    Move { movement_x: f32, movement_y: f32 },
}

/// Touch gesture that produced an event.
#[derive(Clone, Debug, PartialEq)]
pub enum TouchRaw {
    Tap {
        start: TouchPoint,
        end: TouchPoint,
    },
    LongPress {
        duration: std::time::Duration,
        start: TouchPoint,
        end: TouchPoint,
    },
    Swipe {
        distance: f32,
        start: TouchPoint,
        end: TouchPoint,
    },
    Pinch {
        scale: f32,
        points: Vec<TouchPoint>,
    },
    Move {
        delta_x: f32,
        delta_y: f32,
        points: Vec<TouchPoint>,
    },
}

impl TouchRaw {
    /// Binding slot this gesture is read from.
    pub fn gesture(&self) -> Gesture {
        match self {
            TouchRaw::Tap { .. } => Gesture::Tap,
            TouchRaw::LongPress { .. } => Gesture::LongPress,
            TouchRaw::Swipe { .. } => Gesture::Swipe,
            TouchRaw::Pinch { .. } => Gesture::Pinch,
            TouchRaw::Move { .. } => Gesture::Move,
        }
    }
}

/// Touch gesture slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    Tap,
    LongPress,
    Swipe,
    Pinch,
    Move,
}

/// Device-specific description of the physical control behind an event.
#[derive(Clone, Debug, PartialEq)]
pub enum RawInput {
    /// `code` is the layout-independent physical key, `key` the symbolic name.
    /// Either may be empty when the host does not report it.
    Keyboard { code: String, key: String },
    Mouse(MouseRaw),
    Gamepad {
        slot: usize,
        kind: PadControl,
        index: usize,
    },
    Touch(TouchRaw),
}

impl RawInput {
    /// Device family this payload belongs to.
    pub fn device_type(&self) -> DeviceType {
        match self {
            RawInput::Keyboard { .. } => DeviceType::Keyboard,
            RawInput::Mouse(_) => DeviceType::Mouse,
            RawInput::Gamepad { .. } => DeviceType::Gamepad,
            RawInput::Touch(_) => DeviceType::Touch,
        }
    }
}

/// Canonical input event emitted by every adapter.
///
/// An event always names a bound action; adapters never build one for a signal
/// that has no binding.
#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    pub device_type: DeviceType,
    pub action_id: String,
    pub phase: Phase,
    /// Capture time (monotonic). Non-decreasing per adapter.
    pub timestamp: Instant,
    pub value: Option<f32>,
    pub raw: Option<RawInput>,
}

impl InputEvent {
    pub fn new(device_type: DeviceType, action_id: impl Into<String>, phase: Phase) -> Self {
        Self {
            device_type,
            action_id: action_id.into(),
            phase,
            timestamp: Instant::now(),
            value: None,
            raw: None,
        }
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_raw(mut self, raw: RawInput) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }
}
