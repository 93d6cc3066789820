//! Native signals fed to the keyboard, mouse and touch adapters.
//!
//! These are the host-side shapes an adapter understands before normalization. A host
//! (window loop, terminal backend, test harness) builds them from whatever its platform
//! reports and dispatches them on a [`SignalBus`](crate::surface::SignalBus).
//!
//! Each signal carries the monotonic instant it was captured. Constructors stamp
//! `Instant::now()`; hosts with their own event clock override it with `at(..)`.
use crate::event::TouchPoint;
use std::time::Instant;

/// Default-action suppression shared by every native signal.
pub trait NativeSignal {
    /// Asks the host to skip its default handling of this signal.
    fn prevent_default(&mut self);
    fn default_prevented(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

/// A key transition.
#[derive(Clone, Debug)]
pub struct KeySignal {
    pub state: KeyState,
    /// Layout-independent physical key (e.g. `"KeyW"`). May be empty.
    pub code: String,
    /// Symbolic key name (e.g. `"w"`, `"Enter"`). May be empty.
    pub key: String,
    /// Set by the host on auto-repeated key-downs.
    pub repeat: bool,
    pub at: Instant,
    default_prevented: bool,
}

impl KeySignal {
    fn new(state: KeyState, code: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            state,
            code: code.into(),
            key: key.into(),
            repeat: false,
            at: Instant::now(),
            default_prevented: false,
        }
    }

    pub fn down(code: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(KeyState::Down, code, key)
    }

    pub fn up(code: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(KeyState::Up, code, key)
    }

    /// Marks this key-down as an auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn at(mut self, at: Instant) -> Self {
        self.at = at;
        self
    }
}

impl NativeSignal for KeySignal {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MouseSignalKind {
    ButtonDown { button: u16 },
    ButtonUp { button: u16 },
    /// Wheel deltas in host units; positive `delta_y` scrolls down.
    Wheel { delta_x: f32, delta_y: f32 },
    /// Relative movement since the previous move signal.
    Move { movement_x: f32, movement_y: f32 },
}

/// A pointer button, wheel, or movement signal.
#[derive(Clone, Debug)]
pub struct MouseSignal {
    pub kind: MouseSignalKind,
    pub at: Instant,
    /// Non-cancelable signals ignore `prevent_default`.
    pub cancelable: bool,
    default_prevented: bool,
}

impl MouseSignal {
    pub fn new(kind: MouseSignalKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
            cancelable: true,
            default_prevented: false,
        }
    }

    pub fn button_down(button: u16) -> Self {
        Self::new(MouseSignalKind::ButtonDown { button })
    }

    pub fn button_up(button: u16) -> Self {
        Self::new(MouseSignalKind::ButtonUp { button })
    }

    pub fn wheel(delta_y: f32) -> Self {
        Self::new(MouseSignalKind::Wheel {
            delta_x: 0.0,
            delta_y,
        })
    }

    pub fn movement(movement_x: f32, movement_y: f32) -> Self {
        Self::new(MouseSignalKind::Move {
            movement_x,
            movement_y,
        })
    }

    pub fn at(mut self, at: Instant) -> Self {
        self.at = at;
        self
    }

    pub fn non_cancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }
}

impl NativeSignal for MouseSignal {
    fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// A touch-surface signal.
///
/// `touches` lists every contact still on the surface (first = primary);
/// `changed` lists the contacts this signal is about (the lifted ones on end/cancel).
#[derive(Clone, Debug)]
pub struct TouchSignal {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
    pub changed: Vec<TouchPoint>,
    pub at: Instant,
    pub cancelable: bool,
    default_prevented: bool,
}

impl TouchSignal {
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, changed: Vec<TouchPoint>) -> Self {
        Self {
            phase,
            touches,
            changed,
            at: Instant::now(),
            cancelable: true,
            default_prevented: false,
        }
    }

    pub fn start(touches: Vec<TouchPoint>) -> Self {
        let changed = touches.clone();
        Self::new(TouchPhase::Start, touches, changed)
    }

    pub fn moved(touches: Vec<TouchPoint>) -> Self {
        let changed = touches.clone();
        Self::new(TouchPhase::Move, touches, changed)
    }

    /// Lifts `lifted`; `remaining` are the contacts still down.
    pub fn end(lifted: Vec<TouchPoint>, remaining: Vec<TouchPoint>) -> Self {
        Self::new(TouchPhase::End, remaining, lifted)
    }

    pub fn cancel(lifted: Vec<TouchPoint>) -> Self {
        Self::new(TouchPhase::Cancel, Vec::new(), lifted)
    }

    pub fn at(mut self, at: Instant) -> Self {
        self.at = at;
        self
    }
}

impl NativeSignal for TouchSignal {
    fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
