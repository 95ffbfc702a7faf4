//! Computed table for BDD operation memoization.
//!
//! A thin wrapper around `std::collections::HashMap` that also tracks hits and
//! misses. It has no collisions, so a cached result is never lost until the
//! table is cleared, which the manager does on every garbage collection.

use std::collections::HashMap;
use std::hash::Hash;

use crate::reference::Ref;

/// Key of a memoized operation. Operands are handles, so equal keys mean equal subproblems.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
    /// Existential quantification of `f` over the variables in the positive cube.
    Exists(Ref, Ref),
    /// `∃cube. f ∧ g`.
    AndExists(Ref, Ref, Ref),
}

/// A cache backed by [HashMap].
pub struct Cache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new(14)
    }
}

impl<K, V> Cache<K, V> {
    /// Creates a new cache with room for `2^bits` entries before it grows.
    pub fn new(bits: usize) -> Self {
        Self {
            map: HashMap::with_capacity(1 << bits),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Clears all entries from the cache. Statistics are kept.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq,
    V: Copy,
{
    /// Looks up a key in the cache.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(&v) => {
                self.hits += 1;
                Some(v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let mut cache = Cache::<(u64, u64), i32>::new(4);

        cache.insert((1, 2), 42);
        cache.insert((3, 4), 99);

        assert_eq!(cache.get(&(1, 2)), Some(42));
        assert_eq!(cache.get(&(3, 4)), Some(99));
        assert_eq!(cache.get(&(5, 6)), None);

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = Cache::<OpKey, Ref>::new(4);

        let key = OpKey::Ite(Ref::positive(2), Ref::ONE, Ref::ZERO);
        cache.insert(key, Ref::positive(2));
        assert_eq!(cache.get(&key), Some(Ref::positive(2)));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }
}
