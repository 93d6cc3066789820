//! Gamepad sample sources.
//!
//! The gamepad adapter does not receive push events; it samples every connected pad on
//! a loop. A [`GamepadSource`] is whatever can answer "what do the pads look like right
//! now": a platform API wrapper, a network bridge, or the in-process
//! [`VirtualGamepads`] bank.
//!
//! # Feature flags
//! - **`virtual`** (default): enables [`VirtualGamepads`].

#[cfg(feature = "virtual")]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_pad;

#[cfg(feature = "virtual")]
pub use virtual_pad::VirtualGamepads;

/// One pad's state at sampling time.
///
/// `index` is the slot the pad occupies; it is the key the adapter keeps previous
/// state under, so it must stay stable while the pad is connected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PadSample {
    pub index: usize,
    pub buttons: Vec<bool>,
    /// Raw axis values, conventionally in `[-1.0, 1.0]`.
    pub axes: Vec<f32>,
}

impl PadSample {
    pub fn new(index: usize, buttons: usize, axes: usize) -> Self {
        Self {
            index,
            buttons: vec![false; buttons],
            axes: vec![0.0; axes],
        }
    }

    #[inline]
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }
}

/// Something that can report the current state of every connected pad.
pub trait GamepadSource: Send + Sync {
    /// Whether pads can be read at all on this host.
    fn is_available(&self) -> bool {
        true
    }

    /// Current state of every connected pad. Disconnected pads are simply absent.
    fn samples(&self) -> Vec<PadSample>;
}
