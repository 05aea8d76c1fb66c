use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Set of composite keys already produced or already scheduled for fetch.
///
/// Observation is serialized behind a mutex so a shared index can be handed
/// to fetch workers; the lock is only held for the insert itself.
#[derive(Debug)]
pub struct KeyIndex<K> {
    seen: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash> Default for KeyIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> KeyIndex<K> {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// True the first time `key` is seen, false on every later call.
    pub fn observe(&self, key: K) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps the first occurrence of every key, preserving input order.
pub fn dedup_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let index = KeyIndex::new();
    items
        .into_iter()
        .filter(|item| key(item).is_some_and(|k| index.observe(k)))
        .collect()
}
