//! Current per-action state derived from the event stream.
//!
//! [`SnapshotStore`] answers "is this action held right now, and at what value?". It is
//! driven by the same events as the [`Router`](crate::router::Router) but independently:
//! feed it with [`SnapshotStore::update`] or wire its [`sink`](SnapshotStore::sink).
//!
//! # Semantics
//! - `Pressed` / `Repeat`: pressed, value = event value or `1.0`.
//! - `Released`: not pressed, value `0.0`.
//! - `Axis`: value = event value or `0.0`; pressed while the value is non-zero.
//! - Every accepted update stamps `last_updated` with the event timestamp.
//! - State is a function of the latest event only; nothing accumulates.
//!
//! # Example
//! ```
//! use stickup_actions::{DeviceType, InputEvent, Phase, SnapshotStore};
//!
//! let snap = SnapshotStore::new();
//! snap.update(&InputEvent::new(DeviceType::Gamepad, "moveX", Phase::Axis).with_value(0.4));
//! assert!(snap.is_pressed("moveX"));
//! assert_eq!(snap.value("moveX"), 0.4);
//! ```

use crate::event::{InputEvent, Phase};
use crate::sink::EventSink;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// State of one action.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotEntry {
    pub action_id: String,
    pub pressed: bool,
    pub value: f32,
    pub last_updated: Instant,
}

#[derive(Default)]
struct SnapshotInner {
    order: Vec<String>,
    entries: HashMap<String, SnapshotEntry>,
}

/// Shared `action_id → SnapshotEntry` store. Cloning shares the state.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<SnapshotInner>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the state of its action.
    pub fn update(&self, event: &InputEvent) {
        let mut inner = self.inner.write();
        let SnapshotInner { order, entries } = &mut *inner;
        let entry = entries.entry(event.action_id.clone()).or_insert_with(|| {
            order.push(event.action_id.clone());
            SnapshotEntry {
                action_id: event.action_id.clone(),
                pressed: false,
                value: 0.0,
                last_updated: event.timestamp,
            }
        });

        entry.last_updated = event.timestamp;
        match event.phase {
            Phase::Pressed | Phase::Repeat => {
                entry.pressed = true;
                entry.value = event.value.unwrap_or(1.0);
            }
            Phase::Released => {
                entry.pressed = false;
                entry.value = 0.0;
            }
            Phase::Axis => {
                entry.value = event.value.unwrap_or(0.0);
                entry.pressed = entry.value != 0.0;
            }
        }
    }

    #[inline]
    pub fn is_pressed(&self, action_id: &str) -> bool {
        self.inner
            .read()
            .entries
            .get(action_id)
            .is_some_and(|e| e.pressed)
    }

    #[inline]
    pub fn value(&self, action_id: &str) -> f32 {
        self.inner
            .read()
            .entries
            .get(action_id)
            .map_or(0.0, |e| e.value)
    }

    pub fn get(&self, action_id: &str) -> Option<SnapshotEntry> {
        self.inner.read().entries.get(action_id).cloned()
    }

    /// Entries in first-seen order.
    pub fn list(&self) -> Vec<SnapshotEntry> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.order.clear();
        inner.entries.clear();
    }

    /// This store as an event sink.
    pub fn sink(&self) -> EventSink {
        let store = self.clone();
        Arc::new(move |event: &InputEvent| store.update(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DeviceType;
    use std::time::Duration;

    fn event(action: &str, phase: Phase) -> InputEvent {
        InputEvent::new(DeviceType::Keyboard, action, phase)
    }

    #[test]
    fn press_release_cycle() {
        let snap = SnapshotStore::new();
        assert!(!snap.is_pressed("jump"));
        assert_eq!(snap.value("jump"), 0.0);

        snap.update(&event("jump", Phase::Pressed));
        assert!(snap.is_pressed("jump"));
        assert_eq!(snap.value("jump"), 1.0);

        snap.update(&event("jump", Phase::Repeat).with_value(0.5));
        assert_eq!(snap.value("jump"), 0.5);

        snap.update(&event("jump", Phase::Released).with_value(0.9));
        assert!(!snap.is_pressed("jump"));
        assert_eq!(snap.value("jump"), 0.0);
    }

    #[test]
    fn repeated_axis_updates_do_not_accumulate() {
        let snap = SnapshotStore::new();
        let e = event("zoom", Phase::Axis).with_value(0.3);
        snap.update(&e);
        snap.update(&e);
        snap.update(&e);
        assert_eq!(snap.value("zoom"), 0.3);
        assert!(snap.is_pressed("zoom"));

        snap.update(&event("zoom", Phase::Axis));
        assert_eq!(snap.value("zoom"), 0.0);
        assert!(!snap.is_pressed("zoom"));
    }

    #[test]
    fn last_updated_follows_event_timestamp() {
        let snap = SnapshotStore::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(16);
        snap.update(&event("fire", Phase::Pressed).at(t0));
        snap.update(&event("fire", Phase::Released).at(t1));
        assert_eq!(snap.get("fire").unwrap().last_updated, t1);
    }

    #[test]
    fn list_and_clear() {
        let snap = SnapshotStore::new();
        snap.update(&event("b", Phase::Pressed));
        snap.update(&event("a", Phase::Pressed));
        let ids: Vec<_> = snap.list().into_iter().map(|e| e.action_id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        snap.clear();
        assert!(snap.list().is_empty());
        assert!(snap.get("a").is_none());
    }
}
