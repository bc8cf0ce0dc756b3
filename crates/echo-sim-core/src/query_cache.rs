//! Per-tick memoization for expensive read-only queries (spatial lookups,
//! pathing, line-of-sight) shared across phases within a single tick.

use std::any::Any;
use std::hash::Hash;
use std::sync::Mutex;

use rustc_hash::FxHashMap;

/// Caches query results keyed by an application-defined key, automatically
/// discarding everything the moment the tick counter advances.
///
/// Values are stored type-erased (`Box<dyn Any>`) so one cache instance can
/// serve queries of different result types; [`Self::get_or_compute`]
/// downcasts on read and treats a type mismatch for an existing key as a
/// cache miss rather than a panic, which should only happen if two
/// unrelated query kinds collide on the same key value.
pub struct QueryCache<Key> {
    inner: Mutex<CacheState<Key>>,
}

struct CacheState<Key> {
    tick: u64,
    entries: FxHashMap<Key, Box<dyn Any + Send>>,
}

impl<Key: Eq + Hash + Clone> QueryCache<Key> {
    /// Creates an empty cache initialized at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheState {
                tick: 0,
                entries: FxHashMap::default(),
            }),
        }
    }

    /// Advances the cache to `tick`, clearing every entry if `tick` differs
    /// from the cache's current tick. Calling this with the same tick twice
    /// is a no-op.
    pub fn begin_tick(&self, tick: u64) {
        let mut state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if state.tick != tick {
            state.tick = tick;
            state.entries.clear();
        }
    }

    /// Returns the cached value for `key`, computing and storing it via
    /// `compute` on a miss (including a miss caused by a stored value of a
    /// different type than `V`).
    pub fn get_or_compute<V: Clone + Send + 'static>(&self, key: Key, compute: impl FnOnce() -> V) -> V {
        let mut state = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = state.entries.get(&key) {
            if let Some(value) = existing.downcast_ref::<V>() {
                return value.clone();
            }
        }
        let value = compute();
        state.entries.insert(key, Box::new(value.clone()));
        value
    }

    /// Number of entries currently cached for the active tick.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).entries.len()
    }

    /// Whether the cache currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Key: Eq + Hash + Clone> Default for QueryCache<Key> {
    fn default() -> Self {
        Self::new()
    }
}
