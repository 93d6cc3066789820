//! Device adapters.
//!
//! Each adapter normalizes one device family into canonical [`InputEvent`](crate::InputEvent)s
//! under its own binding table. The four adapters share no state and no base type; they
//! only implement the same two traits:
//!
//! - [`InputAdapter`]: identity and lifecycle (`start`/`stop` are idempotent, and `start`
//!   does nothing when the adapter is unavailable).
//! - [`Bindable`]: copy-in/copy-out access to the binding table.
//!
//! Keyboard, mouse and touch adapters listen on a [`Surface`](crate::surface::Surface);
//! the gamepad adapter samples a [`GamepadSource`](crate::backends::GamepadSource).

pub mod gamepad;
pub mod keyboard;
pub mod mouse;
pub mod touch;

pub use gamepad::{GamepadAdapter, GamepadOptions, DEFAULT_DEADZONE};
pub use keyboard::{KeyboardAdapter, KeyboardOptions};
pub use mouse::{MouseAdapter, MouseOptions};
pub use touch::{TouchAdapter, TouchOptions};

use crate::binding::BindingCell;
use crate::event::DeviceType;

/// Lifecycle shared by every adapter.
pub trait InputAdapter: Send {
    /// Stable id used by the manager (defaults to the device family name).
    fn id(&self) -> &str;

    fn device_type(&self) -> DeviceType;

    fn is_available(&self) -> bool;

    fn is_active(&self) -> bool;

    /// Begins listening. No-op when already active or unavailable.
    fn start(&mut self);

    /// Releases every listener, timer or poll task. No-op when inactive.
    fn stop(&mut self);

    /// Display-frame hook for adapters that sample instead of listening.
    fn frame(&self) {}
}

/// Binding table access.
///
/// Both directions copy: the table returned by [`bindings`](Bindable::bindings) is the
/// caller's own, and the table passed to [`update_bindings`](Bindable::update_bindings)
/// is stored as a fresh value.
pub trait Bindable {
    type Bindings: Clone;

    fn bindings(&self) -> Self::Bindings;

    fn update_bindings(&self, bindings: Self::Bindings);

    /// Shared handle to the live table, for components (like the rebinder) that
    /// rewrite bindings on the adapter's behalf.
    fn binding_cell(&self) -> BindingCell<Self::Bindings>;
}
