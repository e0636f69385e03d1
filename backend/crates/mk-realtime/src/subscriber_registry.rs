use std::sync::Arc;

use indexmap::IndexMap;
use mk_core::RealtimeEvent;

/// Listener invoked with every delivered event
pub type EventCallback = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

/// Subscription id → callback, iterated in registration order.
#[derive(Default, Clone)]
pub struct SubscriberRegistry {
    subscribers: IndexMap<String, EventCallback>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `id`.
    /// An existing id keeps its position and gets the new callback.
    /// Returns true when the id was new.
    pub fn insert(&mut self, id: String, callback: EventCallback) -> bool {
        self.subscribers.insert(id, callback).is_none()
    }

    /// Remove `id`, preserving the order of the remaining entries
    pub fn remove(&mut self, id: &str) -> bool {
        self.subscribers.shift_remove(id).is_some()
    }

    /// Copy of the current registrations in fan-out order
    pub fn snapshot(&self) -> Vec<(String, EventCallback)> {
        self.subscribers
            .iter()
            .map(|(id, callback)| (id.clone(), Arc::clone(callback)))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.subscribers.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("ids", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}
