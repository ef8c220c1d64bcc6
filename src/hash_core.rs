//! HashCore: structural layer shared by the unordered set and multimap.
//!
//! Storage is a pair of dense parallel arrays (`keys`, `values`) plus a
//! power-of-two bucket table; a bucket holds the dense-array slot indices
//! of the entries whose key hashes to it. Removal swap-removes the dense
//! arrays and repairs the bucket entry that pointed at the moved slot, so
//! the arrays stay compact and index-addressable.
//!
//! Invariants:
//! - `keys.len() == values.len()`; the sum of bucket lengths equals it.
//! - Every bucket entry `i` lives in the bucket `hash(keys[i])` maps to.
//! - `buckets.len() == 1 << exp`, recomputed after each insert/remove:
//!   grow as soon as the desired exponent exceeds the current one, shrink
//!   only once it falls at least two below (hysteresis, so a table at a
//!   sizing boundary does not rebuild back and forth).
//!
//! Dense order is the iteration and index-access order; it is not stable
//! across mutation (a removal moves the last entry into the freed slot).

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Minimum table exponent; the table never shrinks below `1 << 4` buckets.
pub(crate) const MIN_TABLE_EXP: u32 = 4;

/// Target mean bucket occupancy used to derive the table exponent.
pub(crate) const SLOTS_PER_BUCKET: usize = 4;

/// Shrink only when the desired exponent is this far below the current one.
pub(crate) const SHRINK_SLACK_EXP: u32 = 2;

/// Desired table exponent for `len` entries: the bit length of
/// `len / SLOTS_PER_BUCKET`, clamped to the minimum.
pub(crate) fn desired_exp(len: usize) -> u32 {
    let loaded = len / SLOTS_PER_BUCKET;
    let bits = usize::BITS - loaded.leading_zeros();
    bits.max(MIN_TABLE_EXP)
}

#[derive(Clone, Debug)]
pub struct HashCore<K, V, S = RandomState> {
    hasher: S,
    keys: Vec<K>,
    values: Vec<V>,
    buckets: Vec<Vec<u32>>,
    exp: u32,
}

impl<K, V> HashCore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for HashCore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashCore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone + Default,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            keys: Vec::new(),
            values: Vec::new(),
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

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// First dense slot holding `q`, scanning its bucket.
    pub fn find_slot<Q>(&self, q: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let b = self.bucket_of(self.make_hash(q));
        self.buckets[b]
            .iter()
            .copied()
            .find(|&i| self.keys[i as usize].borrow() == q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_slot(q).is_some()
    }

    /// All dense slots holding `q`, in bucket order.
    pub fn find_slots<Q>(&self, q: &Q) -> Vec<u32>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let b = self.bucket_of(self.make_hash(q));
        self.buckets[b]
            .iter()
            .copied()
            .filter(|&i| self.keys[i as usize].borrow() == q)
            .collect()
    }

    /// Insert with unique-key semantics: overwrite the value in place when
    /// the key is already present and return the previous value.
    pub fn insert_unique(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.find_slot(&key) {
            return Some(std::mem::replace(&mut self.values[slot as usize], value));
        }
        self.push_entry(key, value);
        None
    }

    /// Append unconditionally: true duplicates are kept.
    pub fn insert_append(&mut self, key: K, value: V) -> u32 {
        self.push_entry(key, value)
    }

    fn push_entry(&mut self, key: K, value: V) -> u32 {
        let slot = self.keys.len() as u32;
        let b = self.bucket_of(self.make_hash(&key));
        self.keys.push(key);
        self.values.push(value);
        self.buckets[b].push(slot);
        self.resize_check();
        slot
    }

    /// Remove the entry at `slot`, swap-filling the hole from the tail and
    /// repairing the moved entry's bucket reference.
    pub fn remove_slot(&mut self, slot: u32) -> Option<(K, V)> {
        if slot as usize >= self.keys.len() {
            return None;
        }
        let last = (self.keys.len() - 1) as u32;

        // Unlink the doomed slot from its bucket.
        let b = self.bucket_of(self.make_hash(&self.keys[slot as usize]));
        let pos = self.buckets[b]
            .iter()
            .position(|&i| i == slot)
            .expect("bucket entry for live slot");
        self.buckets[b].swap_remove(pos);

        let key = self.keys.swap_remove(slot as usize);
        let value = self.values.swap_remove(slot as usize);

        // The former tail entry now sits at `slot`; repair its bucket.
        if slot != last {
            let mb = self.bucket_of(self.make_hash(&self.keys[slot as usize]));
            let mpos = self.buckets[mb]
                .iter()
                .position(|&i| i == last)
                .expect("bucket entry for moved slot");
            self.buckets[mb][mpos] = slot;
        }

        self.resize_check();
        Some((key, value))
    }

    /// Remove one occurrence of `q`.
    pub fn remove_one<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.find_slot(q)?;
        self.remove_slot(slot)
    }

    /// Remove every occurrence of `q`; returns how many were removed.
    pub fn remove_all<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut removed = 0;
        while self.remove_one(q).is_some() {
            removed += 1;
        }
        removed
    }

    pub fn key_at(&self, slot: usize) -> Option<&K> {
        self.keys.get(slot)
    }

    pub fn value_at(&self, slot: usize) -> Option<&V> {
        self.values.get(slot)
    }

    pub fn value_of_slot_mut(&mut self, slot: u32) -> Option<&mut V> {
        self.values.get_mut(slot as usize)
    }

    /// Dense-order iteration; order is not stable across mutation.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
        self.buckets.clear();
        self.buckets.resize(1 << MIN_TABLE_EXP, Vec::new());
        self.exp = MIN_TABLE_EXP;
    }

    /// Re-evaluate the table exponent after a mutation.
    fn resize_check(&mut self) {
        let want = desired_exp(self.keys.len());
        if want > self.exp || want + SHRINK_SLACK_EXP <= self.exp {
            self.rebuild(want);
        }
    }

    fn rebuild(&mut self, exp: u32) {
        self.exp = exp;
        self.buckets.clear();
        self.buckets.resize(1usize << exp, Vec::new());
        for slot in 0..self.keys.len() {
            let b = self.bucket_of(self.make_hash(&self.keys[slot]));
            self.buckets[b].push(slot as u32);
        }
    }

    /// Walk the bucket table asserting the structural invariants. Test
    /// support; panics on violation.
    #[cfg(any(test, feature = "bench_internal"))]
    pub fn check_consistency(&self) {
        assert_eq!(self.keys.len(), self.values.len());
        assert_eq!(self.buckets.len(), 1usize << self.exp);
        assert!(self.exp >= MIN_TABLE_EXP);

        let mut seen = hashbrown::HashSet::new();
        for (b, bucket) in self.buckets.iter().enumerate() {
            for &slot in bucket {
                assert!(
                    (slot as usize) < self.keys.len(),
                    "bucket entry {} out of range",
                    slot
                );
                assert!(seen.insert(slot), "slot {} registered twice", slot);
                let expect = self.bucket_of(self.make_hash(&self.keys[slot as usize]));
                assert_eq!(expect, b, "slot {} registered in the wrong bucket", slot);
            }
        }
        assert_eq!(seen.len(), self.keys.len(), "bucket total != stored count");
    }
}
