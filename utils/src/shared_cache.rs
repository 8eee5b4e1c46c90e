use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fxhash::FxBuildHasher;

/// Keyed cache guaranteeing at most one live value per key.
///
/// `get` hands out another `Arc` to the stored value, so repeat lookups for
/// the same key always alias the same underlying object. `add` reuses a live
/// entry instead of replacing it, which keeps handles returned from earlier
/// calls valid.
///
/// All operations serialize internally, so the cache may be shared with
/// worker threads.
pub struct SharedCache<K: Hash + Eq, V> {
    entries: DashMap<K, Arc<V>, FxBuildHasher>,
}

impl<K: Hash + Eq, V> Default for SharedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> SharedCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Returns a new handle to the cached value, if present.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts `value` unless the key is already live, and returns a handle
    /// to whichever value ends up cached.
    pub fn add(&self, key: K, value: V) -> Arc<V> {
        self.add_arc(key, Arc::new(value))
    }

    /// Like `add`, but for values that are already shared.
    pub fn add_arc(&self, key: K, value: Arc<V>) -> Arc<V> {
        match self.entries.entry(key) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                value
            }
        }
    }

    /// Drops the cache's own handle for `key`. Outstanding handles keep the
    /// value alive.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
