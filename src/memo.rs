// =============================================================================
// Memo: explicit memoization cache
// =============================================================================
//
// Keyed by the loader's arguments and owned by whoever owns the session, so
// cache lifetime is the owner's lifetime. No eviction, no TTL.
//
// Loads happen outside the lock. Two concurrent misses on the same key may
// both call the loader; the second insert wins with identical content.
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use parking_lot::RwLock;

pub struct Memo<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    /// Return the cached value for `key`, or run `load` and cache its output
    /// when `should_cache` accepts it.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F, should_cache: fn(&V) -> bool) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = load().await;
        if should_cache(&value) {
            self.insert(key, value.clone());
        }
        value
    }
}
