//! TOML configuration for actions and adapters.
//!
//! ```toml
//! [[actions]]
//! id = "jump"
//! label = "Jump"
//! device_types = ["keyboard", "gamepad"]
//!
//! [keyboard]
//! prevent_default = true
//! bindings = { Space = "jump" }
//!
//! [gamepad]
//! deadzone = 0.2
//! buttons = { "0" = "jump" }
//! ```
//!
//! Every section and field is optional. Mouse button and gamepad control keys are TOML
//! strings holding an index; they are parsed when converted to binding tables.
use crate::action::InputAction;
use crate::adapters::gamepad::DEFAULT_DEADZONE;
use crate::adapters::touch::{
    DEFAULT_LONG_PRESS, DEFAULT_SWIPE_MIN_DISTANCE, DEFAULT_TAP_MAX_DISTANCE,
};
use crate::adapters::{GamepadOptions, KeyboardOptions, MouseOptions, TouchOptions};
use crate::binding::{
    BindingProfile, GamepadBindings, KeyboardBindings, MouseBindings, TouchBindings,
};
use crate::error::{ConfigError, Result};
use crate::router::Router;
use crate::sink::EventSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub actions: Vec<InputAction>,
    pub keyboard: KeyboardConfig,
    pub mouse: MouseConfig,
    pub gamepad: GamepadConfig,
    pub touch: TouchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub allow_repeat: bool,
    pub prevent_default: bool,
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    pub prevent_default: bool,
    pub buttons: BTreeMap<String, String>,
    pub wheel: Option<String>,
    #[serde(rename = "move")]
    pub movement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadConfig {
    pub deadzone: f32,
    /// `0` polls once per host frame instead of on a timer.
    pub poll_interval_ms: u64,
    pub buttons: BTreeMap<String, String>,
    pub axes: BTreeMap<String, String>,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            poll_interval_ms: 0,
            buttons: BTreeMap::new(),
            axes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    pub prevent_default: bool,
    pub long_press_ms: u64,
    pub tap_max_distance: f32,
    pub swipe_min_distance: f32,
    pub tap: Option<String>,
    pub long_press: Option<String>,
    pub swipe: Option<String>,
    pub pinch: Option<String>,
    #[serde(rename = "move")]
    pub movement: Option<String>,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            prevent_default: false,
            long_press_ms: DEFAULT_LONG_PRESS.as_millis() as u64,
            tap_max_distance: DEFAULT_TAP_MAX_DISTANCE,
            swipe_min_distance: DEFAULT_SWIPE_MIN_DISTANCE,
            tap: None,
            long_press: None,
            swipe: None,
            pinch: None,
            movement: None,
        }
    }
}

fn parse_indexed<K: FromStr + Ord>(
    device: &'static str,
    table: &BTreeMap<String, String>,
) -> Result<BTreeMap<K, String>> {
    table
        .iter()
        .map(|(key, action)| {
            key.trim()
                .parse::<K>()
                .map(|index| (index, action.clone()))
                .map_err(|_| ConfigError::InvalidKey {
                    device,
                    key: key.clone(),
                })
        })
        .collect()
}

impl InputConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), actions = config.actions.len(), "input config loaded");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Registers every configured action on `router`.
    pub fn register_actions(&self, router: &Router) {
        for action in &self.actions {
            router.register_action(action.clone());
        }
    }

    pub fn keyboard_bindings(&self) -> KeyboardBindings {
        self.keyboard.bindings.clone().into_iter().collect()
    }

    pub fn mouse_bindings(&self) -> Result<MouseBindings> {
        Ok(MouseBindings {
            buttons: parse_indexed::<u16>("mouse", &self.mouse.buttons)?
                .into_iter()
                .collect(),
            wheel: self.mouse.wheel.clone(),
            movement: self.mouse.movement.clone(),
        })
    }

    pub fn gamepad_bindings(&self) -> Result<GamepadBindings> {
        Ok(GamepadBindings {
            buttons: parse_indexed("gamepad", &self.gamepad.buttons)?,
            axes: parse_indexed("gamepad", &self.gamepad.axes)?,
        })
    }

    pub fn touch_bindings(&self) -> TouchBindings {
        let touch = &self.touch;
        TouchBindings {
            tap: touch.tap.clone(),
            long_press: touch.long_press.clone(),
            swipe: touch.swipe.clone(),
            pinch: touch.pinch.clone(),
            movement: touch.movement.clone(),
        }
    }

    /// All four binding tables bundled under `name`.
    pub fn profile(&self, name: impl Into<String>) -> Result<BindingProfile> {
        Ok(BindingProfile {
            keyboard: self.keyboard_bindings(),
            mouse: self.mouse_bindings()?,
            gamepad: self.gamepad_bindings()?,
            touch: self.touch_bindings(),
            ..BindingProfile::new(name)
        })
    }

    /// Keyboard options with configured bindings and flags; the surface is left unset.
    pub fn keyboard_options(&self, sink: EventSink) -> KeyboardOptions {
        KeyboardOptions::new(self.keyboard_bindings(), sink)
            .allow_repeat(self.keyboard.allow_repeat)
            .prevent_default(self.keyboard.prevent_default)
    }

    pub fn mouse_options(&self, sink: EventSink) -> Result<MouseOptions> {
        Ok(MouseOptions::new(self.mouse_bindings()?, sink)
            .prevent_default(self.mouse.prevent_default))
    }

    /// Gamepad options with configured bindings and tunables; the source is left unset.
    pub fn gamepad_options(&self, sink: EventSink) -> Result<GamepadOptions> {
        Ok(GamepadOptions::new(self.gamepad_bindings()?, sink)
            .deadzone(self.gamepad.deadzone)
            .poll_interval(Duration::from_millis(self.gamepad.poll_interval_ms)))
    }

    pub fn touch_options(&self, sink: EventSink) -> TouchOptions {
        TouchOptions::new(self.touch_bindings(), sink)
            .prevent_default(self.touch.prevent_default)
            .long_press(Duration::from_millis(self.touch.long_press_ms))
            .tap_max_distance(self.touch.tap_max_distance)
            .swipe_min_distance(self.touch.swipe_min_distance)
    }
}
