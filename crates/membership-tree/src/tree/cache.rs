//! Dedup cache mapping entry keys to their canonical expanded occurrence

use std::collections::HashMap;

use crate::tree::NodeId;

/// Key → first-seen occurrence of an expandable entry
///
/// A key is inserted at most once per traversal, at its first expansion.
/// There is no removal; the whole cache is cleared between root operations.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: HashMap<String, NodeId>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` under `key` unless the key is already known.
    ///
    /// Returns `false` if the key was already cached.
    pub fn try_add(&mut self, key: &str, id: NodeId) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }

        self.entries.insert(key.to_string(), id);
        true
    }

    /// Get the canonical occurrence for a key
    pub fn try_get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
