//! Per-request item bag shared by filters.

use parking_lot::RwLock;
use std::collections::HashMap;

/// A thread-safe bag of values scoped to one request.
///
/// Filters use it to hand data from one stage to a later one, for example
/// an authorization filter recording the caller for an action filter.
#[derive(Debug, Default)]
pub struct RequestItems {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl RequestItems {
    /// Creates a new empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value from the bag.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.read().get(key).cloned()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Stores a value, returning the one it replaced.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.data.write().insert(key.into(), value)
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.data.write().remove(key)
    }

    /// Returns a copy of all items.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        self.data.read().clone()
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Clone for RequestItems {
    fn clone(&self) -> Self {
        Self {
            data: RwLock::new(self.data.read().clone()),
        }
    }
}
