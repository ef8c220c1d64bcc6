//! OrderedMultiMap: AVL-balanced ordered multimap, copy-on-write.
//!
//! Nodes live in a `slotmap` arena; left/right/parent links are arena
//! keys, so there is no owning pointer anywhere in the tree; the parent
//! link is a navigation aid for the upward fix-up walk and never frees
//! anything. Each node holds one key and a chain of values for duplicate
//! keys (tail = most recently inserted), a height, and a subtree element
//! count that includes chain lengths; the count is what makes rank↔key
//! conversion O(log n).
//!
//! Mutation shape: search downward to the matching node or a null child
//! slot, then fix up from the affected node to the root: recompute
//! height and count at each ancestor and rotate wherever the height
//! difference leaves {-1, 0, 1}, picking the single or double rotation
//! by the taller child's own balance sign.
//!
//! Invariants:
//! - binary-search-tree ordering on keys;
//! - `|height(left) - height(right)| <= 1` at every node;
//! - `count(node) == chain_len(node) + count(left) + count(right)`;
//! - a node's children point back to it through their parent links.

use core::borrow::Borrow;
use slotmap::{DefaultKey, SlotMap};
use std::cmp::Ordering;

use crate::shared::Shared;

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    /// Duplicate chain, oldest first; grown and popped at the tail.
    values: Vec<V>,
    height: u32,
    /// Elements in this subtree, chain lengths included.
    count: usize,
    left: Option<DefaultKey>,
    right: Option<DefaultKey>,
    parent: Option<DefaultKey>,
}

#[derive(Clone, Debug)]
struct TreeCore<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    root: Option<DefaultKey>,
    len: usize,
}

pub struct OrderedMultiMap<K, V> {
    core: Shared<TreeCore<K, V>>,
}

impl<K, V> OrderedMultiMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            core: Shared::new(TreeCore {
                nodes: SlotMap::with_key(),
                root: None,
                len: 0,
            }),
        }
    }
}

impl<K, V> Default for OrderedMultiMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for OrderedMultiMap<K, V> {
    /// O(1): shares the block and bumps its count.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K, V> TreeCore<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    #[inline]
    fn height(&self, node: Option<DefaultKey>) -> u32 {
        node.map_or(0, |k| self.nodes[k].height)
    }

    #[inline]
    fn count(&self, node: Option<DefaultKey>) -> usize {
        node.map_or(0, |k| self.nodes[k].count)
    }

    #[inline]
    fn balance(&self, k: DefaultKey) -> i64 {
        self.height(self.nodes[k].left) as i64 - self.height(self.nodes[k].right) as i64
    }

    fn update(&mut self, k: DefaultKey) {
        let left = self.nodes[k].left;
        let right = self.nodes[k].right;
        let height = 1 + self.height(left).max(self.height(right));
        let count = self.nodes[k].values.len() + self.count(left) + self.count(right);
        let node = &mut self.nodes[k];
        node.height = height;
        node.count = count;
    }

    /// Re-point `parent`'s child slot (or the root) from `from` to `to`.
    fn replace_child(&mut self, parent: Option<DefaultKey>, from: DefaultKey, to: Option<DefaultKey>) {
        match parent {
            None => self.root = to,
            Some(p) => {
                if self.nodes[p].left == Some(from) {
                    self.nodes[p].left = to;
                } else {
                    debug_assert_eq!(self.nodes[p].right, Some(from));
                    self.nodes[p].right = to;
                }
            }
        }
        if let Some(t) = to {
            self.nodes[t].parent = parent;
        }
    }

    /// Left rotation around `k`: its right child takes its place.
    fn rotate_left(&mut self, k: DefaultKey) {
        let r = self.nodes[k].right.expect("rotate_left needs a right child");
        let rl = self.nodes[r].left;
        let parent = self.nodes[k].parent;

        self.nodes[k].right = rl;
        if let Some(rl) = rl {
            self.nodes[rl].parent = Some(k);
        }
        self.replace_child(parent, k, Some(r));
        self.nodes[r].left = Some(k);
        self.nodes[k].parent = Some(r);

        self.update(k);
        self.update(r);
    }

    /// Right rotation around `k`: its left child takes its place.
    fn rotate_right(&mut self, k: DefaultKey) {
        let l = self.nodes[k].left.expect("rotate_right needs a left child");
        let lr = self.nodes[l].right;
        let parent = self.nodes[k].parent;

        self.nodes[k].left = lr;
        if let Some(lr) = lr {
            self.nodes[lr].parent = Some(k);
        }
        self.replace_child(parent, k, Some(l));
        self.nodes[l].right = Some(k);
        self.nodes[k].parent = Some(l);

        self.update(k);
        self.update(l);
    }

    /// Rebalance `k` if its height difference left the AVL range; returns
    /// the root of the (possibly rotated) subtree.
    fn rebalance(&mut self, k: DefaultKey) -> DefaultKey {
        let b = self.balance(k);
        if b > 1 {
            let l = self.nodes[k].left.expect("left-heavy node has a left child");
            if self.balance(l) < 0 {
                self.rotate_left(l); // left-right case
            }
            let new_root = self.nodes[k].left.expect("left child after rotation");
            self.rotate_right(k);
            new_root
        } else if b < -1 {
            let r = self.nodes[k].right.expect("right-heavy node has a right child");
            if self.balance(r) > 0 {
                self.rotate_right(r); // right-left case
            }
            let new_root = self.nodes[k].right.expect("right child after rotation");
            self.rotate_left(k);
            new_root
        } else {
            k
        }
    }

    /// Walk from `start` to the root, recomputing height/count and
    /// rebalancing each ancestor. O(log n).
    fn fix_upward(&mut self, start: Option<DefaultKey>) {
        let mut cur = start;
        while let Some(k) = cur {
            self.update(k);
            let sub = self.rebalance(k);
            cur = self.nodes[sub].parent;
        }
    }

    fn find_node<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cur = self.root;
        while let Some(k) = cur {
            match q.cmp(self.nodes[k].key.borrow()) {
                Ordering::Less => cur = self.nodes[k].left,
                Ordering::Greater => cur = self.nodes[k].right,
                Ordering::Equal => return Some(k),
            }
        }
        None
    }

    fn insert(&mut self, key: K, value: V) {
        self.len += 1;
        let Some(mut cur) = self.root else {
            let node = self.new_node(key, value, None);
            self.root = Some(node);
            return;
        };
        loop {
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Equal => {
                    // Duplicate key: grow the chain; heights are untouched,
                    // so the fix-up only bubbles counts.
                    self.nodes[cur].values.push(value);
                    self.fix_upward(Some(cur));
                    return;
                }
                Ordering::Less => match self.nodes[cur].left {
                    Some(l) => cur = l,
                    None => {
                        let node = self.new_node(key, value, Some(cur));
                        self.nodes[cur].left = Some(node);
                        self.fix_upward(Some(cur));
                        return;
                    }
                },
                Ordering::Greater => match self.nodes[cur].right {
                    Some(r) => cur = r,
                    None => {
                        let node = self.new_node(key, value, Some(cur));
                        self.nodes[cur].right = Some(node);
                        self.fix_upward(Some(cur));
                        return;
                    }
                },
            }
        }
    }

    fn new_node(&mut self, key: K, value: V, parent: Option<DefaultKey>) -> DefaultKey {
        self.nodes.insert(Node {
            key,
            values: vec![value],
            height: 1,
            count: 1,
            left: None,
            right: None,
            parent,
        })
    }

    /// Remove one element under `q`: pop the chain when it holds more than
    /// one value, otherwise delete the node.
    fn remove_one<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.find_node(q)?;
        self.len -= 1;
        if self.nodes[node].values.len() > 1 {
            let v = self.nodes[node].values.pop().expect("chain checked non-empty");
            self.fix_upward(Some(node));
            return Some(v);
        }
        let (_k, mut values) = self.delete_node(node);
        values.pop()
    }

    /// Remove the node for `q` with its whole chain.
    fn remove_key<Q>(&mut self, q: &Q) -> Option<(K, Vec<V>)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.find_node(q)?;
        self.len -= self.nodes[node].values.len();
        Some(self.delete_node(node))
    }

    /// Structural deletion of `node`, returning its payload.
    fn delete_node(&mut self, node: DefaultKey) -> (K, Vec<V>) {
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;

        match (left, right) {
            (None, None) => {
                let parent = self.nodes[node].parent;
                self.replace_child(parent, node, None);
                let n = self.nodes.remove(node).expect("node is live");
                self.fix_upward(parent);
                (n.key, n.values)
            }
            (Some(child), None) | (None, Some(child)) => {
                let parent = self.nodes[node].parent;
                self.replace_child(parent, node, Some(child));
                let n = self.nodes.remove(node).expect("node is live");
                self.fix_upward(parent);
                (n.key, n.values)
            }
            (Some(left), Some(_)) => {
                // Splice in the in-order predecessor when the node is
                // left-heavy (ties go left), else the successor; the chosen
                // node has at most one child on the side it came from.
                let splice = if self.balance(node) >= 0 {
                    let mut r = left;
                    while let Some(next) = self.nodes[r].right {
                        r = next;
                    }
                    r
                } else {
                    let mut r = self.nodes[node].right.expect("two children");
                    while let Some(next) = self.nodes[r].left {
                        r = next;
                    }
                    r
                };

                let splice_parent = self.nodes[splice].parent.expect("splice is below node");
                let splice_child = self.nodes[splice].left.or(self.nodes[splice].right);
                self.replace_child(Some(splice_parent), splice, splice_child);

                let spliced = self.nodes.remove(splice).expect("splice is live");
                let old_key = std::mem::replace(&mut self.nodes[node].key, spliced.key);
                let old_values = std::mem::replace(&mut self.nodes[node].values, spliced.values);

                self.fix_upward(Some(splice_parent));
                (old_key, old_values)
            }
        }
    }

    /// Rank of the first element under `q`, by subtree counts.
    fn rank_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0usize;
        let mut cur = self.root;
        while let Some(k) = cur {
            match q.cmp(self.nodes[k].key.borrow()) {
                Ordering::Less => cur = self.nodes[k].left,
                Ordering::Greater => {
                    rank += self.count(self.nodes[k].left) + self.nodes[k].values.len();
                    cur = self.nodes[k].right;
                }
                Ordering::Equal => return Some(rank + self.count(self.nodes[k].left)),
            }
        }
        None
    }

    /// Node and chain offset holding the element of rank `i`.
    fn locate_rank(&self, mut i: usize) -> Option<(DefaultKey, usize)> {
        if i >= self.len {
            return None;
        }
        let mut cur = self.root;
        while let Some(k) = cur {
            let left_count = self.count(self.nodes[k].left);
            if i < left_count {
                cur = self.nodes[k].left;
                continue;
            }
            i -= left_count;
            let chain = self.nodes[k].values.len();
            if i < chain {
                return Some((k, i));
            }
            i -= chain;
            cur = self.nodes[k].right;
        }
        None
    }

    fn edge_node(&self, leftmost: bool) -> Option<DefaultKey> {
        let mut cur = self.root?;
        loop {
            let next = if leftmost {
                self.nodes[cur].left
            } else {
                self.nodes[cur].right
            };
            match next {
                Some(n) => cur = n,
                None => return Some(cur),
            }
        }
    }
}

impl<K, V> OrderedMultiMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn len(&self) -> usize {
        self.core.len
    }

    pub fn is_empty(&self) -> bool {
        self.core.len == 0
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.core.nodes.len()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.core.find_node(key).is_some()
    }

    /// Most recently inserted value under `key`; `None` when absent.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.core.find_node(key)?;
        self.core.nodes[node].values.last()
    }

    /// The whole chain under `key`, oldest first; empty when absent.
    pub fn get_all<Q>(&self, key: &Q) -> &[V]
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.core.find_node(key) {
            Some(node) => &self.core.nodes[node].values,
            None => &[],
        }
    }

    pub fn count_key<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get_all(key).len()
    }

    /// Exclusive access to the most recent value under `key`; detaches a
    /// shared block. `None` when absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.core.find_node(key).is_none() {
            return None;
        }
        let core = self.core.make_mut();
        let node = core.find_node(key).expect("key present after detach");
        core.nodes[node].values.last_mut()
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.core.make_mut().insert(key, value);
    }

    /// Remove one element under `key`, most recently inserted first.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.core.find_node(key).is_none() {
            return None;
        }
        self.core.make_mut().remove_one(key)
    }

    /// Remove `key` with its whole chain; returns the values, oldest first.
    pub fn remove_key<Q>(&mut self, key: &Q) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.core.find_node(key).is_none() {
            return Vec::new();
        }
        self.core
            .make_mut()
            .remove_key(key)
            .map(|(_k, vs)| vs)
            .unwrap_or_default()
    }

    /// Key of the element with rank `i` (0-based, sorted order); checked.
    pub fn key_at(&self, i: usize) -> Option<&K> {
        let (node, _offset) = self.core.locate_rank(i)?;
        Some(&self.core.nodes[node].key)
    }

    /// Value of the element with rank `i`; chains appear oldest first.
    pub fn value_at(&self, i: usize) -> Option<&V> {
        let (node, offset) = self.core.locate_rank(i)?;
        self.core.nodes[node].values.get(offset)
    }

    /// Rank of the first element under `key`; `None` when absent.
    pub fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.core.rank_of(key)
    }

    /// Smallest key with its most recent value.
    pub fn first(&self) -> Option<(&K, &V)> {
        let node = self.core.edge_node(true)?;
        let n = &self.core.nodes[node];
        Some((&n.key, n.values.last()?))
    }

    /// Largest key with its most recent value.
    pub fn last(&self) -> Option<(&K, &V)> {
        let node = self.core.edge_node(false)?;
        let n = &self.core.nodes[node];
        Some((&n.key, n.values.last()?))
    }

    /// In-order iteration; duplicate chains expand oldest first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut it = Iter {
            tree: &self.core,
            stack: Vec::new(),
            chain: None,
        };
        it.push_left(self.core.root);
        it
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _v)| k)
    }

    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        let core = self.core.make_mut();
        core.nodes.clear();
        core.root = None;
        core.len = 0;
    }

    /// Tree height; 0 when empty. Exposed for balance assertions.
    pub fn height(&self) -> usize {
        self.core.height(self.core.root) as usize
    }

    #[cfg(test)]
    pub(crate) fn shares_block(&self, other: &Self) -> bool {
        self.core.shares_with(&other.core)
    }

    /// Walk the whole tree asserting the structural invariants. Test
    /// support; panics on violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn walk<K: Ord + Clone, V: Clone>(
            tree: &TreeCore<K, V>,
            node: DefaultKey,
            parent: Option<DefaultKey>,
        ) -> (u32, usize) {
            let n = &tree.nodes[node];
            assert_eq!(n.parent, parent, "parent link diverges");
            assert!(!n.values.is_empty(), "node with an empty chain");

            let (lh, lc) = n.left.map_or((0, 0), |l| {
                assert!(tree.nodes[l].key < n.key, "left child key out of order");
                walk(tree, l, Some(node))
            });
            let (rh, rc) = n.right.map_or((0, 0), |r| {
                assert!(tree.nodes[r].key > n.key, "right child key out of order");
                walk(tree, r, Some(node))
            });

            assert!(
                (lh as i64 - rh as i64).abs() <= 1,
                "height difference out of range"
            );
            assert_eq!(n.height, 1 + lh.max(rh), "stale height");
            assert_eq!(n.count, n.values.len() + lc + rc, "stale count");
            (n.height, n.count)
        }

        match self.core.root {
            None => {
                assert_eq!(self.core.len, 0);
                assert!(self.core.nodes.is_empty());
            }
            Some(root) => {
                assert_eq!(self.core.nodes[root].parent, None);
                let (_h, count) = walk(&self.core, root, None);
                assert_eq!(count, self.core.len, "root count != len");
            }
        }

        // Whole-tree ordering, not just the local parent/child checks.
        let mut prev: Option<&K> = None;
        for (k, _v) in self.iter() {
            if let Some(p) = prev {
                assert!(p <= k, "in-order keys regress");
            }
            prev = Some(k);
        }
    }
}

impl<K, V> std::fmt::Debug for OrderedMultiMap<K, V>
where
    K: Ord + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMultiMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

/// In-order iterator over `(key, value)` elements.
pub struct Iter<'a, K, V> {
    tree: &'a TreeCore<K, V>,
    stack: Vec<DefaultKey>,
    chain: Option<(DefaultKey, usize)>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut cur: Option<DefaultKey>) {
        while let Some(k) = cur {
            self.stack.push(k);
            cur = self.tree.nodes[k].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            if let Some((node, i)) = self.chain {
                let n = &tree.nodes[node];
                if i < n.values.len() {
                    self.chain = Some((node, i + 1));
                    return Some((&n.key, &n.values[i]));
                }
                self.chain = None;
                self.push_left(n.right);
            }
            let node = self.stack.pop()?;
            self.chain = Some((node, 0));
        }
    }
}
