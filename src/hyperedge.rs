//! HyperedgeIndex: entries indexed under several keys at once.
//!
//! Each entry carries a sequence of component keys and one value; the
//! entry's dense index is registered in the bucket of every *distinct*
//! component key (a key repeated within one entry registers once; the
//! stored sequence is deduplicated on insert). Adjacency queries then
//! read straight off the buckets: "which entries touch key K", "which
//! other keys co-occur with K".
//!
//! Removal is the delicate part. `remove_key` drops every entry touching
//! the key, and each swap-remove invalidates the moved entry's index in
//! *every* bucket it was registered under, not just the probed one. The
//! whole removal (unregistering the doomed entry, swap-filling the hole,
//! repairing the moved entry's registrations) runs as one internal pass
//! over a descending index list, so pending targets keep their indices.
//!
//! The bucket table follows the same sizing policy as `hash_core`
//! (grow immediately, shrink with hysteresis, fixed minimum).

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::hash_core::{desired_exp, MIN_TABLE_EXP, SHRINK_SLACK_EXP};
use crate::shared::Shared;
use crate::unordered_set::UnorderedSet;

#[derive(Clone, Debug)]
struct HyperEntry<K, V> {
    /// Distinct component keys, first-occurrence order.
    keys: Vec<K>,
    value: V,
}

#[derive(Clone, Debug)]
struct HyperCore<K, V, S> {
    hasher: S,
    entries: Vec<HyperEntry<K, V>>,
    buckets: Vec<Vec<u32>>,
    exp: u32,
}

pub struct HyperedgeIndex<K, V, S = RandomState> {
    core: Shared<HyperCore<K, V, S>>,
}

impl<K, V> HyperedgeIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for HyperedgeIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Clone for HyperedgeIndex<K, V, S> {
    /// O(1): shares the block and bumps its count.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K, V, S> HyperCore<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            entries: Vec::new(),
            buckets: vec![Vec::new(); 1 << MIN_TABLE_EXP],
            exp: MIN_TABLE_EXP,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & ((1usize << self.exp) - 1)
    }

    /// Dense indices of entries touching `q`, deduplicated, bucket order.
    ///
    /// An entry whose distinct keys collide into one bucket appears there
    /// once per key, so matches are deduplicated while scanning.
    fn slots_with<Q>(&self, q: &Q) -> Vec<u32>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let b = self.bucket_of(self.make_hash(q));
        let mut out: Vec<u32> = Vec::new();
        for &i in &self.buckets[b] {
            let entry = &self.entries[i as usize];
            if entry.keys.iter().any(|k| k.borrow() == q) && !out.contains(&i) {
                out.push(i);
            }
        }
        out
    }

    fn register(&mut self, idx: u32) {
        let mut targets: Vec<usize> = Vec::with_capacity(self.entries[idx as usize].keys.len());
        for key in &self.entries[idx as usize].keys {
            targets.push(self.bucket_of(self.make_hash(key)));
        }
        for b in targets {
            self.buckets[b].push(idx);
        }
    }

    /// Remove the entry at `idx`: unregister it everywhere, swap-fill the
    /// hole, and repair every registration of the moved entry. Does not
    /// re-evaluate sizing; callers do that once per public operation.
    fn remove_entry_at(&mut self, idx: u32) -> HyperEntry<K, V> {
        let last = (self.entries.len() - 1) as u32;

        // Unregister the doomed entry from each distinct key's bucket.
        let doomed_buckets: Vec<usize> = self.entries[idx as usize]
            .keys
            .iter()
            .map(|k| self.bucket_of(self.make_hash(k)))
            .collect();
        for b in doomed_buckets {
            let pos = self.buckets[b]
                .iter()
                .position(|&i| i == idx)
                .expect("registration for live entry");
            self.buckets[b].swap_remove(pos);
        }

        let entry = self.entries.swap_remove(idx as usize);

        // The former tail entry now sits at `idx`; repatch each of its
        // registrations. A bucket holding two of its keys is visited twice
        // and each visit fixes one occurrence.
        if idx != last {
            let moved_buckets: Vec<usize> = self.entries[idx as usize]
                .keys
                .iter()
                .map(|k| self.bucket_of(self.make_hash(k)))
                .collect();
            for b in moved_buckets {
                let pos = self.buckets[b]
                    .iter()
                    .position(|&i| i == last)
                    .expect("registration for moved entry");
                self.buckets[b][pos] = idx;
            }
        }

        entry
    }

    fn resize_check(&mut self) {
        let want = desired_exp(self.entries.len());
        if want > self.exp || want + SHRINK_SLACK_EXP <= self.exp {
            self.rebuild(want);
        }
    }

    fn rebuild(&mut self, exp: u32) {
        self.exp = exp;
        self.buckets.clear();
        self.buckets.resize(1usize << exp, Vec::new());
        for idx in 0..self.entries.len() as u32 {
            self.register(idx);
        }
    }

    #[cfg(test)]
    fn check_consistency(&self) {
        assert_eq!(self.buckets.len(), 1usize << self.exp);

        // Expected registration multiset: one (bucket, index) per distinct
        // key per entry.
        let mut expect: Vec<(usize, u32)> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            assert!(!entry.keys.is_empty(), "entry {} has no keys", i);
            let mut distinct = hashbrown::HashSet::new();
            for key in &entry.keys {
                assert!(distinct.insert(key), "entry {} stores a repeated key", i);
                expect.push((self.bucket_of(self.make_hash(key)), i as u32));
            }
        }
        let mut actual: Vec<(usize, u32)> = Vec::new();
        for (b, bucket) in self.buckets.iter().enumerate() {
            for &i in bucket {
                assert!(
                    (i as usize) < self.entries.len(),
                    "registration {} out of range",
                    i
                );
                actual.push((b, i));
            }
        }
        expect.sort_unstable();
        actual.sort_unstable();
        assert_eq!(expect, actual, "bucket registrations diverge from entries");
    }
}

impl<K, V, S> HyperedgeIndex<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            core: Shared::new(HyperCore::with_hasher(hasher)),
        }
    }

    pub fn len(&self) -> usize {
        self.core.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.entries.is_empty()
    }

    /// Insert an entry under the given component keys. Repeated keys in the
    /// sequence register once. An empty sequence is rejected: no entry is
    /// stored and `None` is returned; otherwise the entry's dense index.
    pub fn insert<I>(&mut self, keys: I, value: V) -> Option<usize>
    where
        I: IntoIterator<Item = K>,
    {
        let mut distinct: Vec<K> = Vec::new();
        for key in keys {
            if !distinct.contains(&key) {
                distinct.push(key);
            }
        }
        if distinct.is_empty() {
            return None;
        }

        let core = self.core.make_mut();
        let idx = core.entries.len() as u32;
        core.entries.push(HyperEntry {
            keys: distinct,
            value,
        });
        core.register(idx);
        core.resize_check();
        Some(idx as usize)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.core.slots_with(key).is_empty()
    }

    /// The other keys co-occurring with `key` in any entry; `key` itself is
    /// excluded. Empty set when the key touches nothing.
    pub fn keys_with<Q>(&self, key: &Q) -> UnorderedSet<K, S>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut out = UnorderedSet::with_hasher(S::default());
        for idx in self.core.slots_with(key) {
            for k in &self.core.entries[idx as usize].keys {
                if k.borrow() != key {
                    out.insert(k.clone());
                }
            }
        }
        out
    }

    /// Values of entries touching `key`, in dense-index order.
    pub fn values_with<Q>(&self, key: &Q) -> Vec<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut slots = self.core.slots_with(key);
        slots.sort_unstable();
        slots
            .into_iter()
            .map(|i| &self.core.entries[i as usize].value)
            .collect()
    }

    /// Dense indices of entries touching `key`, ascending. Not stable
    /// across mutation.
    pub fn indexes_with<Q>(&self, key: &Q) -> Vec<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut slots = self.core.slots_with(key);
        slots.sort_unstable();
        slots.into_iter().map(|i| i as usize).collect()
    }

    /// Remove every entry touching `key`, repairing all buckets those
    /// entries were registered under. Returns how many entries were
    /// removed.
    pub fn remove_key<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let targets: hashbrown::HashSet<u32> =
            self.core.slots_with(key).into_iter().collect();
        if targets.is_empty() {
            return 0;
        }
        let mut order: Vec<u32> = targets.into_iter().collect();
        // Descending order: a swap-remove pulls from the tail, which is
        // never a pending target, so remaining targets keep their indices.
        order.sort_unstable_by(|a, b| b.cmp(a));

        let core = self.core.make_mut();
        let removed = order.len();
        for idx in order {
            core.remove_entry_at(idx);
        }
        core.resize_check();
        removed
    }

    /// Checked dense-order access to an entry's value.
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.core.entries.get(index).map(|e| &e.value)
    }

    /// Checked dense-order access to an entry's distinct component keys.
    pub fn keys_at(&self, index: usize) -> Option<&[K]> {
        self.core.entries.get(index).map(|e| e.keys.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[K], &V)> {
        self.core
            .entries
            .iter()
            .map(|e| (e.keys.as_slice(), &e.value))
    }

    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        let core = self.core.make_mut();
        core.entries.clear();
        core.buckets.clear();
        core.buckets.resize(1 << MIN_TABLE_EXP, Vec::new());
        core.exp = MIN_TABLE_EXP;
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

impl<K, V, S> std::fmt::Debug for HyperedgeIndex<K, V, S>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
    S: BuildHasher + Clone + Default,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
