// Public-surface property tests (consolidated).
//
// Property 1: copy-on-write isolation under random mutation; a snapshot
//  taken at a random point never changes afterwards.
// Property 2: ordered-map iteration is always sorted and rank access
//  agrees with iteration.

use proptest::prelude::*;
use rc_collections::{OrderedMultiMap, UnorderedMultiMap};

// Property 1: snapshot stability. Apply a random op sequence; at a chosen
// point take a copy and record its full contents; keep mutating the
// original; the copy must still read back exactly the recorded contents.
proptest! {
    #[test]
    fn prop_snapshot_never_changes(
        before in proptest::collection::vec((0u8..=2u8, 0u8..10u8, any::<i16>()), 0..60),
        after in proptest::collection::vec((0u8..=2u8, 0u8..10u8, any::<i16>()), 1..60)
    ) {
        fn apply(m: &mut UnorderedMultiMap<u8, i16>, ops: &[(u8, u8, i16)]) {
            for &(op, key, value) in ops {
                match op {
                    0 => {
                        m.insert(key, value);
                    }
                    1 => {
                        m.insert_multi(key, value);
                    }
                    2 => {
                        m.remove(&key);
                    }
                    _ => unreachable!(),
                }
            }
        }

        let mut m: UnorderedMultiMap<u8, i16> = UnorderedMultiMap::new();
        apply(&mut m, &before);

        let snapshot = m.clone();
        let mut recorded: Vec<(u8, Vec<i16>)> = (0u8..10)
            .map(|k| {
                let mut vs: Vec<i16> = snapshot.get_all(&k).into_iter().copied().collect();
                vs.sort_unstable();
                (k, vs)
            })
            .collect();
        recorded.retain(|(_k, vs)| !vs.is_empty());
        let recorded_len = snapshot.len();

        apply(&mut m, &after);

        prop_assert_eq!(snapshot.len(), recorded_len);
        for (k, want) in recorded {
            let mut got: Vec<i16> = snapshot.get_all(&k).into_iter().copied().collect();
            got.sort_unstable();
            prop_assert_eq!(got, want);
        }
    }
}

// Property 2: sorted iteration and rank agreement for the ordered map.
proptest! {
    #[test]
    fn prop_ordered_iteration_sorted(
        entries in proptest::collection::vec((any::<i32>(), any::<i8>()), 0..200)
    ) {
        let map: OrderedMultiMap<i32, i8> = entries.iter().copied().collect();
        prop_assert_eq!(map.len(), entries.len());

        let swept: Vec<i32> = map.iter().map(|(k, _v)| *k).collect();
        let mut sorted = swept.clone();
        sorted.sort();
        prop_assert_eq!(&swept, &sorted);

        for (i, key) in swept.iter().enumerate() {
            prop_assert_eq!(map.key_at(i), Some(key));
        }
        prop_assert_eq!(map.key_at(map.len()), None);

        // First occurrence rank for every distinct key.
        for key in swept.iter() {
            let rank = map.rank_of(key).expect("iterated key resolves");
            prop_assert_eq!(rank, swept.iter().position(|k| k == key).unwrap());
        }
    }
}
