#![cfg(test)]

// Property tests for the hash components kept inside the crate so they
// can call the internal consistency checker after every step.

use crate::multi_map::UnorderedMultiMap;
use crate::unordered_set::UnorderedSet;
use proptest::prelude::*;
use std::collections::HashMap;

// Property: state-machine equivalence of UnorderedMultiMap against a
// HashMap<key, Vec<value>> model. Even keys use unique-insert semantics
// (at most one value), odd keys use true-multi semantics, so every
// operation has one defined outcome in the model.
//
// Invariants exercised across random operation sequences:
// - `insert` overwrites, `insert_multi` appends, per-key multisets match.
// - `remove` returns a value the model holds; `remove_all` drains the key.
// - `contains_key`/`count_key`/`len` parity with the model after each op.
// - The bucket structure stays consistent after every mutation
//   (`check_consistency`: totals, slot ranges, bucket membership).
proptest! {
    #[test]
    fn prop_multi_map_state_machine(
        ops in proptest::collection::vec((0u8..=5u8, 0u8..8u8, any::<i32>()), 1..200)
    ) {
        let mut sut: UnorderedMultiMap<u8, i32> = UnorderedMultiMap::new();
        let mut model: HashMap<u8, Vec<i32>> = HashMap::new();

        for (op, key, value) in ops {
            match op {
                // Unique-key insert on even keys only.
                0 => {
                    let k = key & !1;
                    let old = sut.insert(k, value);
                    let slot = model.entry(k).or_default();
                    prop_assert_eq!(old.as_ref(), slot.first());
                    slot.clear();
                    slot.push(value);
                }
                // True-multi insert on odd keys only.
                1 => {
                    let k = key | 1;
                    sut.insert_multi(k, value);
                    model.entry(k).or_default().push(value);
                }
                // Pair-deduped multi insert on odd keys.
                2 => {
                    let k = key | 1;
                    let inserted = sut.insert_multi_unique(k, value);
                    let slot = model.entry(k).or_default();
                    prop_assert_eq!(inserted, !slot.contains(&value));
                    if inserted {
                        slot.push(value);
                    }
                }
                // Remove one occurrence; the model gives up whatever value
                // the dense store handed back.
                3 => {
                    let removed = sut.remove(&key);
                    let slot = model.entry(key).or_default();
                    match removed {
                        Some(v) => {
                            let pos = slot.iter().position(|&x| x == v);
                            prop_assert!(pos.is_some(), "removed a value the model lacks");
                            slot.remove(pos.unwrap());
                        }
                        None => prop_assert!(slot.is_empty()),
                    }
                }
                // Remove every occurrence.
                4 => {
                    let n = sut.remove_all(&key);
                    let slot = model.entry(key).or_default();
                    prop_assert_eq!(n, slot.len());
                    slot.clear();
                }
                // Pure queries.
                5 => {
                    let slot = model.get(&key).map(Vec::as_slice).unwrap_or(&[]);
                    prop_assert_eq!(sut.contains_key(&key), !slot.is_empty());
                    prop_assert_eq!(sut.count_key(&key), slot.len());
                    let mut got: Vec<i32> = sut.get_all(&key).into_iter().copied().collect();
                    let mut want: Vec<i32> = slot.to_vec();
                    got.sort_unstable();
                    want.sort_unstable();
                    prop_assert_eq!(got, want);
                }
                _ => unreachable!(),
            }

            sut.check_consistency();
            let expected_len: usize = model.values().map(Vec::len).sum();
            prop_assert_eq!(sut.len(), expected_len);
        }
    }
}

// Property: UnorderedSet tracks a model set under inserts and removals,
// and the set algebra agrees with the model algebra.
proptest! {
    #[test]
    fn prop_set_state_machine(
        ops in proptest::collection::vec((0u8..=1u8, 0u8..16u8), 1..150),
        other in proptest::collection::btree_set(0u8..16u8, 0..12)
    ) {
        let mut sut: UnorderedSet<u8> = UnorderedSet::new();
        let mut model: std::collections::BTreeSet<u8> = Default::default();

        for (op, v) in ops {
            match op {
                0 => {
                    prop_assert_eq!(sut.insert(v), model.insert(v));
                }
                1 => {
                    prop_assert_eq!(sut.remove(&v), model.remove(&v));
                }
                _ => unreachable!(),
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.contains(&v), model.contains(&v));
        }

        let rhs: UnorderedSet<u8> = other.iter().copied().collect();
        let union: std::collections::BTreeSet<u8> = sut.union(&rhs).iter().copied().collect();
        let inter: std::collections::BTreeSet<u8> =
            sut.intersection(&rhs).iter().copied().collect();
        let diff: std::collections::BTreeSet<u8> = sut.difference(&rhs).iter().copied().collect();
        let sym: std::collections::BTreeSet<u8> =
            sut.symmetric_difference(&rhs).iter().copied().collect();

        prop_assert_eq!(union, model.union(&other).copied().collect::<std::collections::BTreeSet<u8>>());
        prop_assert_eq!(inter, model.intersection(&other).copied().collect::<std::collections::BTreeSet<u8>>());
        prop_assert_eq!(diff, model.difference(&other).copied().collect::<std::collections::BTreeSet<u8>>());
        prop_assert_eq!(sym, model.symmetric_difference(&other).copied().collect::<std::collections::BTreeSet<u8>>());
    }
}
