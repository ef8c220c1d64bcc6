// Copy-on-write isolation across the public surface: for a container A
// and a copy B, mutating B leaves every observable query on A unchanged,
// and vice versa. These tests only observe query results; the sharing
// internals are covered by the in-crate unit tests.

use rc_collections::{HyperedgeIndex, OrderedMultiMap, UnorderedMultiMap, UnorderedSet};

/// Invariant: set copies diverge independently after mutation on either
/// side; a chain of copies isolates each link.
#[test]
fn set_copies_are_isolated() {
    let mut a: UnorderedSet<i32> = (0..50).collect();
    let mut b = a.clone();
    let c = b.clone();

    a.insert(100);
    b.remove(&0);

    assert!(a.contains(&100));
    assert!(a.contains(&0));
    assert_eq!(a.len(), 51);

    assert!(!b.contains(&100));
    assert!(!b.contains(&0));
    assert_eq!(b.len(), 49);

    assert!(!c.contains(&100));
    assert!(c.contains(&0));
    assert_eq!(c.len(), 50);
}

/// Invariant: map copies keep their view of overwritten and removed
/// entries.
#[test]
fn multi_map_copies_are_isolated() {
    let mut a: UnorderedMultiMap<String, i32> = UnorderedMultiMap::new();
    for i in 0..20 {
        a.insert(format!("k{}", i), i);
    }
    let b = a.clone();

    a.insert("k0".to_string(), -1);
    a.remove(&"k1".to_string());
    a.insert_multi("k2".to_string(), 99);

    assert_eq!(a.get("k0"), Some(&-1));
    assert_eq!(b.get("k0"), Some(&0));
    assert!(!a.contains_key("k1"));
    assert_eq!(b.get("k1"), Some(&1));
    assert_eq!(a.count_key("k2"), 2);
    assert_eq!(b.count_key("k2"), 1);
    assert_eq!(b.len(), 20);
}

/// Invariant: hyperedge copies keep removed entries visible from every
/// component key.
#[test]
fn hyperedge_copies_are_isolated() {
    let mut a = HyperedgeIndex::new();
    a.insert(["a", "b", "c"], 1).unwrap();
    a.insert(["c", "d"], 2).unwrap();
    let b = a.clone();

    a.remove_key(&"c");
    assert!(a.is_empty());

    assert_eq!(b.len(), 2);
    assert_eq!(b.values_with(&"c"), vec![&1, &2]);
    let via_b: Vec<&str> = b.keys_with(&"b").iter().copied().collect();
    assert!(via_b.contains(&"a"));
    assert!(via_b.contains(&"c"));
}

/// Invariant: ordered-map copies keep their ranks and chains.
#[test]
fn ordered_map_copies_are_isolated() {
    let mut a: OrderedMultiMap<i32, i32> = (0..100).map(|k| (k, k)).collect();
    a.insert(50, 500); // chain on key 50
    let b = a.clone();

    a.remove_key(&50);
    a.insert(200, 2);

    assert!(!a.contains_key(&50));
    assert_eq!(b.get_all(&50), &[50, 500]);
    assert_eq!(b.len(), 101);
    assert!(!b.contains_key(&200));
    assert_eq!(b.rank_of(&99), Some(100));
}

/// Invariant: dropping the original after a copy leaves the copy fully
/// usable (the block lives while any handle does).
#[test]
fn copy_survives_original_drop() {
    let survivor = {
        let mut a = OrderedMultiMap::new();
        for k in [5, 3, 8, 1] {
            a.insert(k, k * 10);
        }
        a.clone()
    };
    assert_eq!(survivor.len(), 4);
    assert_eq!(survivor.get(&8), Some(&80));
    assert_eq!(survivor.key_at(0), Some(&1));

    let survivor_set = {
        let s: UnorderedSet<u8> = (0..10).collect();
        s.clone()
    };
    assert_eq!(survivor_set.len(), 10);
}

/// Invariant: mutating a detached copy repeatedly never leaks changes
/// back through earlier generations of copies.
#[test]
fn copy_chains_stay_independent() {
    let mut generations: Vec<UnorderedMultiMap<u32, u32>> = Vec::new();
    let mut m = UnorderedMultiMap::new();
    for gen in 0..5u32 {
        m.insert(gen, gen);
        generations.push(m.clone());
    }

    // Each generation saw exactly the keys inserted up to its point.
    for (gen, snapshot) in generations.iter().enumerate() {
        assert_eq!(snapshot.len(), gen + 1);
        for k in 0..=gen as u32 {
            assert_eq!(snapshot.get(&k), Some(&k));
        }
        assert!(!snapshot.contains_key(&(gen as u32 + 1)));
    }
}
