//! rc-collections: reference-counted, copy-on-write associative
//! containers: an unordered set, an unordered multimap, a multi-key
//! hyperedge index, and an AVL-ordered multimap.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one shared-ownership discipline under four containers, built
//!   in safe, verifiable layers so each piece can be reasoned about
//!   independently.
//! - Layers:
//!   - Shared<T>: the copy-on-write block handle; all reference-count
//!     handling lives here. Clone is O(1); the first mutation after a
//!     share deep-clones the block.
//!   - HashCore<K, V, S>: structural hash layer under the set and the
//!     multimap: dense parallel key/value arrays plus power-of-two
//!     buckets of slot indices, swap-remove with bucket repair, and a
//!     grow-immediately/shrink-with-hysteresis sizing policy.
//!   - UnorderedSet / UnorderedMultiMap: public value types over
//!     HashCore behind a Shared block; the set adds the algebra, the
//!     map adds unique/multi insert modes.
//!   - HyperedgeIndex: its own entry store (a key *sequence* per entry)
//!     under the same bucket and sizing discipline; one entry is
//!     registered under each of its distinct keys, and removal repairs
//!     every bucket a moved entry was registered under.
//!   - OrderedMultiMap: AVL tree in a slotmap arena; parent links are
//!     plain arena keys used only to walk upward during fix-up, never
//!     for ownership. Subtree element counts give O(log n) rank↔key
//!     conversion.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (plain `Rc` counts, no
//!   atomics); share across threads only behind external synchronization
//!   by copying per context.
//! - No operation blocks, suspends, or throws: queries are total and
//!   return `Option`/empty for absent keys; the one deliberate
//!   exception is `UnorderedMultiMap::get_mut_or_default`, which creates
//!   the missing key.
//! - Index/rank access is checked (`Option`), never out-of-bounds.
//! - Amortized O(1) hash operations, O(log n) tree operations, O(1)
//!   container clone.
//!
//! Copy-on-write contract
//! - For a container A and a copy B, any observable query on A is
//!   unaffected by mutations of B and vice versa; the block is shared
//!   until the first mutation on either side and freed with the last
//!   handle.
//! - Read-only queries never clone; no-op mutations (removing an absent
//!   key, re-inserting a set duplicate) do not detach a shared block.
//!
//! Key contracts
//! - Hashed containers need `K: Hash + Eq` with consistent results;
//!   lookups accept borrowed forms (`K: Borrow<Q>`).
//! - The ordered map needs `K: Ord` (a strict total order).
//! - Values need clone semantics; the block clone on detach clones them.
//!
//! Notes and non-goals
//! - Dense-array iteration order (set, multimap, hyperedge) is not
//!   stable across mutation: removal swap-fills the hole from the tail.
//! - No persistence; no weak handles; hashers are per-container state
//!   (`S: BuildHasher + Clone + Default`, `RandomState` by default).
//! - Public surface is the four containers; `hash_core` is an
//!   implementation detail exposed to benches behind `bench_internal`.

mod shared;

#[cfg(feature = "bench_internal")]
pub mod hash_core;
#[cfg(not(feature = "bench_internal"))]
mod hash_core;

mod hash_core_proptest;
pub mod hyperedge;
pub mod multi_map;
pub mod ordered_multi_map;
mod ordered_multi_map_proptest;
pub mod unordered_set;

// Public surface
pub use hyperedge::HyperedgeIndex;
pub use multi_map::UnorderedMultiMap;
pub use ordered_multi_map::OrderedMultiMap;
pub use unordered_set::UnorderedSet;
