#![cfg(test)]

// Property tests for OrderedMultiMap kept inside the crate so they can
// run the structural invariant checker after every step.

use crate::ordered_multi_map::OrderedMultiMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn flatten(model: &BTreeMap<u8, Vec<i32>>) -> Vec<(u8, i32)> {
    model
        .iter()
        .flat_map(|(k, vs)| vs.iter().map(move |v| (*k, *v)))
        .collect()
}

// Property: state-machine equivalence against BTreeMap<key, Vec<value>>.
// The chain is LIFO for `remove` (most recent value first) and
// oldest-first for iteration and rank access, so every operation has one
// defined outcome in the model.
//
// Invariants exercised across random operation sequences:
// - `insert` chains duplicates; `get` sees the most recent value.
// - `remove` pops the most recent; `remove_key` drains the chain.
// - In-order iteration equals the flattened model.
// - `key_at`/`value_at`/`rank_of` agree with the flattened model.
// - After every step the tree passes the structural check: AVL balance,
//   height/count bookkeeping, parent links, key ordering.
proptest! {
    #[test]
    fn prop_tree_state_machine(
        ops in proptest::collection::vec((0u8..=4u8, 0u8..12u8, any::<i32>()), 1..200)
    ) {
        let mut sut: OrderedMultiMap<u8, i32> = OrderedMultiMap::new();
        let mut model: BTreeMap<u8, Vec<i32>> = BTreeMap::new();

        for (op, key, value) in ops {
            match op {
                0 => {
                    sut.insert(key, value);
                    model.entry(key).or_default().push(value);
                }
                1 => {
                    let removed = sut.remove(&key);
                    let expect = model.get_mut(&key).and_then(Vec::pop);
                    if model.get(&key).is_some_and(Vec::is_empty) {
                        model.remove(&key);
                    }
                    prop_assert_eq!(removed, expect);
                }
                2 => {
                    let removed = sut.remove_key(&key);
                    let expect = model.remove(&key).unwrap_or_default();
                    prop_assert_eq!(removed, expect);
                }
                3 => {
                    prop_assert_eq!(sut.get(&key).copied(), model.get(&key).and_then(|v| v.last()).copied());
                    prop_assert_eq!(sut.get_all(&key), model.get(&key).map(Vec::as_slice).unwrap_or(&[]));
                    prop_assert_eq!(sut.contains_key(&key), model.contains_key(&key));
                }
                4 => {
                    // Rank probes around the current size.
                    let flat = flatten(&model);
                    let i = (value.unsigned_abs() as usize) % (flat.len() + 1);
                    match flat.get(i) {
                        Some(&(k, v)) => {
                            prop_assert_eq!(sut.key_at(i), Some(&k));
                            prop_assert_eq!(sut.value_at(i), Some(&v));
                        }
                        None => {
                            prop_assert_eq!(sut.key_at(i), None);
                            prop_assert_eq!(sut.value_at(i), None);
                        }
                    }
                }
                _ => unreachable!(),
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.values().map(Vec::len).sum::<usize>());
        }

        // Full in-order sweep and rank duality at the end of the run.
        let flat = flatten(&model);
        let swept: Vec<(u8, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&swept, &flat);
        for (key, _) in &flat {
            let rank = sut.rank_of(key).expect("key present");
            prop_assert_eq!(sut.key_at(rank), Some(key));
            prop_assert_eq!(rank, flat.iter().position(|(k, _)| k == key).unwrap());
        }
    }
}

// Property: the AVL height bound holds for any insert-only workload.
proptest! {
    #[test]
    fn prop_height_bound(keys in proptest::collection::vec(any::<u16>(), 1..512)) {
        let mut sut: OrderedMultiMap<u16, ()> = OrderedMultiMap::new();
        for k in &keys {
            sut.insert(*k, ());
        }
        sut.check_invariants();

        let n = sut.key_count() as f64;
        let bound = (1.44 * n.log2()).ceil() as usize + 1;
        prop_assert!(sut.height() <= bound.max(1), "height {} over bound {}", sut.height(), bound);
    }
}
