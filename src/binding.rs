//! Binding tables (physical control → action id).
//!
//! Each adapter owns one table type. Tables are plain values: an adapter keeps its
//! current table in a [`BindingCell`] and replaces it wholesale on every update, so a
//! table obtained earlier never changes under its holder.
use crate::error::Result;
use crate::event::Gesture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Returns the action id when the slot holds a non-empty one.
#[inline]
fn bound(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().filter(|id| !id.is_empty())
}

/// Keyboard table: physical key code or symbolic key name → action id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyboardBindings(pub HashMap<String, String>);

impl KeyboardBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, action_id: impl Into<String>) -> Self {
        self.bind(key, action_id);
        self
    }

    pub fn bind(&mut self, key: impl Into<String>, action_id: impl Into<String>) {
        self.0.insert(key.into(), action_id.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Looks up the physical `code` first, then falls back to the symbolic `key`.
    pub fn resolve(&self, code: &str, key: &str) -> Option<&str> {
        self.get(code).or_else(|| self.get(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyboardBindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Mouse table: button index → action id, plus the wheel and movement slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseBindings {
    #[serde(default)]
    pub buttons: HashMap<u16, String>,
    #[serde(default)]
    pub wheel: Option<String>,
    #[serde(default, rename = "move")]
    pub movement: Option<String>,
}

impl MouseBindings {
    pub fn button(&self, button: u16) -> Option<&str> {
        self.buttons
            .get(&button)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn wheel(&self) -> Option<&str> {
        bound(&self.wheel)
    }

    pub fn movement(&self) -> Option<&str> {
        bound(&self.movement)
    }
}

/// Gamepad table: button index → action id and axis index → action id.
///
/// Ordered maps so a poll emits bound controls in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadBindings {
    #[serde(default)]
    pub buttons: BTreeMap<usize, String>,
    #[serde(default)]
    pub axes: BTreeMap<usize, String>,
}

impl GamepadBindings {
    pub fn button(&self, index: usize) -> Option<&str> {
        self.buttons
            .get(&index)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn axis(&self, index: usize) -> Option<&str> {
        self.axes
            .get(&index)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Touch table: one action slot per recognized gesture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchBindings {
    #[serde(default)]
    pub tap: Option<String>,
    #[serde(default)]
    pub long_press: Option<String>,
    #[serde(default)]
    pub swipe: Option<String>,
    #[serde(default)]
    pub pinch: Option<String>,
    #[serde(default, rename = "move")]
    pub movement: Option<String>,
}

impl TouchBindings {
    pub fn slot(&self, gesture: Gesture) -> Option<&str> {
        match gesture {
            Gesture::Tap => bound(&self.tap),
            Gesture::LongPress => bound(&self.long_press),
            Gesture::Swipe => bound(&self.swipe),
            Gesture::Pinch => bound(&self.pinch),
            Gesture::Move => bound(&self.movement),
        }
    }

    pub fn set(&mut self, gesture: Gesture, action_id: impl Into<String>) {
        let slot = match gesture {
            Gesture::Tap => &mut self.tap,
            Gesture::LongPress => &mut self.long_press,
            Gesture::Swipe => &mut self.swipe,
            Gesture::Pinch => &mut self.pinch,
            Gesture::Move => &mut self.movement,
        };
        *slot = Some(action_id.into());
    }
}

/// Shared, copy-on-write holder for an adapter's current table.
///
/// Readers get either a cheap `Arc` of the current table ([`load`](Self::load)) or an
/// owned copy ([`get`](Self::get)). Writers swap in a whole new table; nobody ever
/// observes a half-applied update.
#[derive(Debug)]
pub struct BindingCell<T> {
    current: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for BindingCell<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: Clone> BindingCell<T> {
    pub fn new(table: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Current table, shared.
    #[inline]
    pub fn load(&self) -> Arc<T> {
        self.current.read().clone()
    }

    /// Owned copy of the current table.
    pub fn get(&self) -> T {
        (*self.load()).clone()
    }

    /// Replaces the whole table.
    pub fn replace(&self, table: T) {
        *self.current.write() = Arc::new(table);
    }

    /// Builds the next table from the current one and swaps it in atomically.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let mut guard = self.current.write();
        let next = f(&guard);
        *guard = Arc::new(next);
    }
}

/// Named bundle of all four tables.
///
/// The crate never stores a profile itself; this is the hand-off format for hosts
/// that keep user bindings somewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keyboard: KeyboardBindings,
    #[serde(default)]
    pub mouse: MouseBindings,
    #[serde(default)]
    pub gamepad: GamepadBindings,
    #[serde(default)]
    pub touch: TouchBindings,
}

impl BindingProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
