//! Device-agnostic input actions.
//!
//! Keyboard, mouse, gamepad and touch signals are normalized into one stream of
//! [`InputEvent`]s, each naming a logical action id resolved through the adapter's
//! binding table. From there:
//!
//! - the [`Router`] matches events to registered [`InputAction`]s and notifies subscribers,
//! - the [`SnapshotStore`] keeps per-action "is it pressed / what is its value" state,
//! - the [`Rebinder`] waits for the next physical input and remaps it to an action.
//!
//! ```text
//! native signal ─▶ adapter ─▶ InputEvent ─▶ Rebinder ─▶ fan_out ─┬▶ Router ─▶ subscribers
//!                    ▲                        │                  └▶ SnapshotStore
//!                    └──── binding table ◀────┘
//! ```
//!
//! Components hand events to each other through [`EventSink`]s, so the pipeline is
//! assembled by the host and any stage can be left out.
//!
//! # Feature flags
//! - **`virtual`** (default): in-process gamepads ([`backends::VirtualGamepads`]).

pub mod action;
pub mod adapters;
pub mod backends;
pub mod binding;
pub mod config;
pub mod error;
pub mod event;
pub mod logger;
pub mod manager;
pub mod rebind;
pub mod router;
pub mod signal;
pub mod sink;
pub mod snapshot;
pub mod surface;

pub use action::{ActionRegistry, InputAction};
pub use adapters::{
    Bindable, GamepadAdapter, GamepadOptions, InputAdapter, KeyboardAdapter, KeyboardOptions,
    MouseAdapter, MouseOptions, TouchAdapter, TouchOptions,
};
pub use binding::{
    BindingCell, BindingProfile, GamepadBindings, KeyboardBindings, MouseBindings, TouchBindings,
};
pub use config::InputConfig;
pub use error::{ConfigError, RebindError};
pub use event::*;
pub use logger::EventLogger;
pub use manager::InputManager;
pub use rebind::{Capture, RebindTarget, Rebinder};
pub use router::{Router, Subscription};
pub use sink::{EventFilter, EventSink};
pub use snapshot::{SnapshotEntry, SnapshotStore};
pub use surface::{SignalBus, Surface};
