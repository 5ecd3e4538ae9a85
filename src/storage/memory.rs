use std::collections::HashMap;

use parking_lot::RwLock;

use crate::storage::SlotStorage;

/// Slots that live as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage, handy for restoring a known session.
    pub fn with_slots<I, K, V>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            slots: RwLock::new(
                slots
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl SlotStorage for MemoryStorage {
    fn load(&self, slot: &str) -> Option<String> {
        self.slots.read().get(slot).cloned()
    }

    fn save(&self, slot: &str, value: &str) {
        self.slots.write().insert(slot.to_string(), value.to_string());
    }

    fn remove(&self, slot: &str) {
        self.slots.write().remove(slot);
    }
}
