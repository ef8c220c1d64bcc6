//! UnorderedSet: unique values over HashCore, copy-on-write.
//!
//! The set stores each value once in the shared hash core (unit values on
//! the value side) and adds the set algebra. Cloning a set shares the
//! block; the first mutation after a share clones it. Set algebra builds
//! a fresh set by membership testing, so results never alias an operand.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::hash_core::HashCore;
use crate::shared::Shared;

pub struct UnorderedSet<T, S = RandomState> {
    core: Shared<HashCore<T, (), S>>,
}

impl<T> UnorderedSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<T> Default for UnorderedSet<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Clone for UnorderedSet<T, S> {
    /// O(1): shares the block and bumps its count.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T, S> UnorderedSet<T, S>
where
    T: Eq + Hash + Clone,
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

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.core.contains(value)
    }

    /// Insert a value; a duplicate is a no-op. Reports whether it inserted.
    pub fn insert(&mut self, value: T) -> bool {
        if self.core.contains(&value) {
            return false;
        }
        self.core.make_mut().insert_append(value, ());
        true
    }

    /// Remove a value; reports whether it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if !self.core.contains(value) {
            return false;
        }
        self.core.make_mut().remove_one(value).is_some()
    }

    /// Checked dense-order access; the order is not stable across mutation.
    pub fn value_at(&self, index: usize) -> Option<&T> {
        self.core.key_at(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.core.keys()
    }

    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.core.make_mut().clear();
    }

    /// Values present in either set.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = Self::with_hasher(S::default());
        for v in self.iter() {
            out.insert(v.clone());
        }
        for v in other.iter() {
            out.insert(v.clone());
        }
        out
    }

    /// Values present in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = Self::with_hasher(S::default());
        for v in self.iter() {
            if other.contains(v) {
                out.insert(v.clone());
            }
        }
        out
    }

    /// Values present in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Self::with_hasher(S::default());
        for v in self.iter() {
            if !other.contains(v) {
                out.insert(v.clone());
            }
        }
        out
    }

    /// Values present in exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut out = Self::with_hasher(S::default());
        for v in self.iter() {
            if !other.contains(v) {
                out.insert(v.clone());
            }
        }
        for v in other.iter() {
            if !self.contains(v) {
                out.insert(v.clone());
            }
        }
        out
    }

    /// Whether every value of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|v| other.contains(v))
    }

    #[cfg(test)]
    pub(crate) fn shares_block(&self, other: &Self) -> bool {
        self.core.shares_with(&other.core)
    }
}

impl<T, S> std::fmt::Debug for UnorderedSet<T, S>
where
    T: Eq + Hash + Clone + std::fmt::Debug,
    S: BuildHasher + Clone + Default,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> FromIterator<T> for UnorderedSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut out = Self::with_hasher(S::default());
        for v in iter {
            out.insert(v);
        }
        out
    }
}
