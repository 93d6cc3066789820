//! Logical actions and the registry that names them.
use crate::event::DeviceType;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A device-independent action: opaque id, human label, applicable device types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAction {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub device_types: BTreeSet<DeviceType>,
}

impl InputAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            device_types: BTreeSet::new(),
        }
    }

    pub fn with_devices(mut self, devices: impl IntoIterator<Item = DeviceType>) -> Self {
        self.device_types.extend(devices);
        self
    }

    pub fn supports(&self, device: DeviceType) -> bool {
        self.device_types.contains(&device)
    }
}

#[derive(Default)]
struct RegistryInner {
    order: Vec<String>,
    actions: HashMap<String, InputAction>,
}

/// Action id → descriptor store.
///
/// Cloning shares the underlying store. `list` returns actions in first-registration
/// order; re-registering an id replaces the descriptor in place.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, action: InputAction) {
        let mut inner = self.inner.write();
        if !inner.actions.contains_key(&action.id) {
            inner.order.push(action.id.clone());
        }
        inner.actions.insert(action.id.clone(), action);
    }

    pub fn get(&self, id: &str) -> Option<InputAction> {
        self.inner.read().actions.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().actions.contains_key(id)
    }

    pub fn list(&self) -> Vec<InputAction> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.actions.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.list()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_upserts_in_place() {
        let registry = ActionRegistry::new();
        registry.register(InputAction::new("jump", "Jump"));
        registry.register(InputAction::new("fire", "Fire"));
        registry.register(
            InputAction::new("jump", "Leap").with_devices([DeviceType::Gamepad]),
        );

        let ids: Vec<_> = registry.list().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["jump", "fire"]);

        let jump = registry.get("jump").unwrap();
        assert_eq!(jump.label, "Leap");
        assert!(jump.supports(DeviceType::Gamepad));
        assert!(!jump.supports(DeviceType::Keyboard));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_action_is_none() {
        let registry = ActionRegistry::new();
        assert!(registry.get("nope").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn clones_share_the_store() {
        let a = ActionRegistry::new();
        let b = a.clone();
        a.register(InputAction::new("menu", "Menu"));
        assert!(b.contains("menu"));
    }
}
