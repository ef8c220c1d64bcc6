//! UnorderedMultiMap: key→value pairs over HashCore, copy-on-write.
//!
//! `insert` has unique-key semantics (overwrite in place, return the old
//! value); `insert_multi` appends true duplicates; `insert_multi_unique`
//! appends unless the identical pair already sits in the bucket. Lookup
//! misses return `None`/empty; the one deliberate exception is
//! `get_mut_or_default`, which *creates* a missing key with `V::default()`,
//! so callers wanting read-only semantics must check existence first.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::hash_core::HashCore;
use crate::shared::Shared;

pub struct UnorderedMultiMap<K, V, S = RandomState> {
    core: Shared<HashCore<K, V, S>>,
}

impl<K, V> UnorderedMultiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for UnorderedMultiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Clone for UnorderedMultiMap<K, V, S> {
    /// O(1): shares the block and bumps its count.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K, V, S> UnorderedMultiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            core: Shared::new(HashCore::with_hasher(hasher)),
        }
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.contains(key)
    }

    /// First value stored under `key`; `None` when absent.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.core.find_slot(key)?;
        self.core.value_at(slot as usize)
    }

    /// All values stored under `key`, in dense order; empty when absent.
    pub fn get_all<Q>(&self, key: &Q) -> Vec<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core
            .find_slots(key)
            .into_iter()
            .filter_map(|s| self.core.value_at(s as usize))
            .collect()
    }

    /// Number of entries stored under `key`.
    pub fn count_key<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.find_slots(key).len()
    }

    /// Exclusive access to the first value under `key`; detaches a shared
    /// block. `None` when absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.core.find_slot(key)?;
        self.core.make_mut().value_of_slot_mut(slot)
    }

    /// Write access that creates a missing key with `V::default()`.
    pub fn get_mut_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let slot = match self.core.find_slot(&key) {
            Some(slot) => slot,
            None => self.core.make_mut().insert_append(key, V::default()),
        };
        self.core
            .make_mut()
            .value_of_slot_mut(slot)
            .expect("slot valid immediately after lookup or insert")
    }

    /// Unique-key insert: overwrite in place on a duplicate key and return
    /// the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.core.make_mut().insert_unique(key, value)
    }

    /// True-multi insert: always appends, keeping duplicates.
    pub fn insert_multi(&mut self, key: K, value: V) {
        self.core.make_mut().insert_append(key, value);
    }

    /// True-multi insert that skips an identical `(key, value)` pair already
    /// present. Reports whether it inserted.
    pub fn insert_multi_unique(&mut self, key: K, value: V) -> bool
    where
        V: PartialEq,
    {
        let dup = self
            .core
            .find_slots(&key)
            .into_iter()
            .any(|s| self.core.value_at(s as usize) == Some(&value));
        if dup {
            return false;
        }
        self.core.make_mut().insert_append(key, value);
        true
    }

    /// Remove one entry under `key` and return its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.core.contains(key) {
            return None;
        }
        self.core.make_mut().remove_one(key).map(|(_k, v)| v)
    }

    /// Remove every entry under `key`; returns how many were removed.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.core.contains(key) {
            return 0;
        }
        self.core.make_mut().remove_all(key)
    }

    /// Checked dense-order access; the order is not stable across mutation.
    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.core.key_at(index)
    }

    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.core.value_at(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.core.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.core.keys()
    }

    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.core.make_mut().clear();
    }

    #[cfg(test)]
    pub(crate) fn shares_block(&self, other: &Self) -> bool {
        self.core.shares_with(&other.core)
    }

    #[cfg(test)]
    pub(crate) fn check_consistency(&self) {
        self.core.check_consistency();
    }
}

impl<K, V, S> std::fmt::Debug for UnorderedMultiMap<K, V, S>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
    S: BuildHasher + Clone + Default,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> FromIterator<(K, V)> for UnorderedMultiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::with_hasher(S::default());
        for (k, v) in iter {
            out.insert_multi(k, v);
        }
        out
    }
}
