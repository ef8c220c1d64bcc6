// End-to-end scenarios over the public surface.

use rc_collections::{HyperedgeIndex, OrderedMultiMap, UnorderedMultiMap, UnorderedSet};
use std::collections::BTreeSet;

/// Invariant: insert 1..=1000, all resolve; remove 1..=500, the upper
/// half resolves and the lower half is gone; a copy taken before the
/// removal still reports all 1000.
#[test]
fn multi_map_thousand_keys() {
    let mut m: UnorderedMultiMap<u32, String> = UnorderedMultiMap::new();
    for i in 1..=1000 {
        m.insert(i, format!("v{}", i));
    }
    assert_eq!(m.len(), 1000);
    for i in 1..=1000 {
        assert_eq!(m.get(&i).map(String::as_str), Some(format!("v{}", i).as_str()));
    }

    let snapshot = m.clone();
    for i in 1..=500 {
        assert!(m.remove(&i).is_some());
    }
    assert_eq!(m.len(), 500);
    for i in 1..=500 {
        assert!(!m.contains_key(&i));
        assert_eq!(m.get(&i), None);
    }
    for i in 501..=1000 {
        assert!(m.contains_key(&i));
    }
    assert_eq!(snapshot.len(), 1000);
    for i in 1..=1000 {
        assert!(snapshot.contains_key(&i));
    }
}

/// Invariant: overwrite-on-reinsert for the map, no-op for the set.
#[test]
fn reinsert_semantics() {
    let mut m = UnorderedMultiMap::new();
    assert_eq!(m.insert("k", 1), None);
    assert_eq!(m.insert("k", 2), Some(1));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&"k"), Some(&2));

    let mut s = UnorderedSet::new();
    assert!(s.insert("k"));
    assert!(!s.insert("k"));
    assert_eq!(s.len(), 1);
}

/// Invariant: insert [5,3,8,1,4,7,9,2,6]; ranks
/// 0..9 read [1..9]; height within the AVL bound.
#[test]
fn ordered_map_scenario() {
    let mut m = OrderedMultiMap::new();
    for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        m.insert(k, ());
    }
    assert_eq!(m.len(), 9);
    let keys: Vec<i32> = (0..9).map(|i| *m.key_at(i).unwrap()).collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert!(m.height() <= 5); // ceil(1.44 * log2(9))

    for i in 0..9 {
        let k = *m.key_at(i).unwrap();
        assert_eq!(m.rank_of(&k), Some(i));
    }
}

/// Invariant: for an entry with keys {a,b,c},
/// every component key sees the other two, and removing through one key
/// removes the entry from the others' views.
#[test]
fn hyperedge_symmetry() {
    let mut h = HyperedgeIndex::new();
    h.insert(["a", "b", "c"], 1).unwrap();
    h.insert(["b", "c", "d"], 2).unwrap();

    let with_a: BTreeSet<&str> = h.keys_with(&"a").iter().copied().collect();
    let with_b: BTreeSet<&str> = h.keys_with(&"b").iter().copied().collect();
    assert!(with_a.is_superset(&["b", "c"].into()));
    assert!(with_b.is_superset(&["a", "c"].into()));

    assert_eq!(h.remove_key(&"a"), 1);
    assert_eq!(h.values_with(&"b"), vec![&2]);
    assert_eq!(h.values_with(&"c"), vec![&2]);
    assert_eq!(h.values_with(&"d"), vec![&2]);
    assert!(h.values_with(&"a").is_empty());
}

/// Invariant: set algebra over overlapping ranges, including operands
/// that share a block.
#[test]
fn set_algebra_roundtrip() {
    let a: UnorderedSet<i32> = (0..8).collect();
    let b: UnorderedSet<i32> = (4..12).collect();

    let union: BTreeSet<i32> = a.union(&b).iter().copied().collect();
    let inter: BTreeSet<i32> = a.intersection(&b).iter().copied().collect();
    let diff: BTreeSet<i32> = a.difference(&b).iter().copied().collect();
    let sym: BTreeSet<i32> = a.symmetric_difference(&b).iter().copied().collect();

    assert_eq!(union, (0..12).collect());
    assert_eq!(inter, (4..8).collect());
    assert_eq!(diff, (0..4).collect());
    assert_eq!(sym, (0..4).chain(8..12).collect());

    // Algebra between a set and its own copy.
    let a2 = a.clone();
    assert_eq!(a.union(&a2).len(), a.len());
    assert_eq!(a.intersection(&a2).len(), a.len());
    assert!(a.difference(&a2).is_empty());
    assert!(a.symmetric_difference(&a2).is_empty());
}

/// Invariant: dense-index access is checked across the hash containers.
#[test]
fn checked_index_access() {
    let mut m = UnorderedMultiMap::new();
    m.insert(1u8, 'a');
    assert!(m.key_at(0).is_some());
    assert!(m.key_at(1).is_none());
    assert!(m.value_at(7).is_none());

    let s: UnorderedSet<u8> = [1, 2].into_iter().collect();
    assert!(s.value_at(1).is_some());
    assert!(s.value_at(2).is_none());

    let mut h = HyperedgeIndex::new();
    h.insert([1u8], 'x').unwrap();
    assert_eq!(h.value_at(0), Some(&'x'));
    assert_eq!(h.value_at(1), None);
    assert_eq!(h.keys_at(1), None);

    let t: OrderedMultiMap<u8, ()> = [(1, ()), (2, ())].into_iter().collect();
    assert!(t.key_at(1).is_some());
    assert!(t.key_at(2).is_none());
    assert!(t.value_at(usize::MAX).is_none());
}

/// Invariant: a multimap in true-multi mode holds duplicates, and
/// `get_mut_or_default` creates exactly one entry for a missing key.
#[test]
fn multi_mode_and_default_creation() {
    let mut m: UnorderedMultiMap<&'static str, Vec<i32>> = UnorderedMultiMap::new();
    m.get_mut_or_default("list").push(1);
    m.get_mut_or_default("list").push(2);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&"list"), Some(&vec![1, 2]));

    let mut counts: UnorderedMultiMap<char, u32> = UnorderedMultiMap::new();
    for c in "abracadabra".chars() {
        *counts.get_mut_or_default(c) += 1;
    }
    assert_eq!(counts.get(&'a'), Some(&5));
    assert_eq!(counts.get(&'b'), Some(&2));
    assert_eq!(counts.get(&'z'), None);
}

/// Invariant: clearing detaches from a shared block instead of wiping it.
#[test]
fn clear_respects_sharing() {
    let mut a: UnorderedSet<i32> = (0..10).collect();
    let b = a.clone();
    a.clear();
    assert!(a.is_empty());
    assert_eq!(b.len(), 10);

    let mut t: OrderedMultiMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
    let u = t.clone();
    t.clear();
    assert!(t.is_empty());
    assert_eq!(u.len(), 10);
    assert_eq!(u.rank_of(&9), Some(9));
}
