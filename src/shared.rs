//! Shared: the copy-on-write block handle.
//!
//! Every container in this crate owns exactly one `Shared<T>` pointing at
//! its storage block. Cloning a container clones the handle (count bump,
//! O(1)); the first mutation after a share deep-clones the block and
//! re-points the handle. All reference-count handling lives here so the
//! container modules never touch `Rc` directly.
//!
//! Counts are plain (non-atomic): the containers are single-threaded
//! value types and `Rc` already makes them `!Send`/`!Sync`.

use std::ops::Deref;
use std::rc::Rc;

/// Owning handle to a potentially shared storage block.
pub(crate) struct Shared<T> {
    block: Rc<T>,
}

impl<T> Shared<T> {
    pub(crate) fn new(block: T) -> Self {
        Self {
            block: Rc::new(block),
        }
    }

    /// Number of live handles on this block. Test support.
    #[cfg(test)]
    pub(crate) fn strong_count(&self) -> usize {
        Rc::strong_count(&self.block)
    }

    /// Whether two handles share one block. Test support.
    #[cfg(test)]
    pub(crate) fn shares_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.block, &other.block)
    }
}

impl<T: Clone> Shared<T> {
    /// Ensure exclusive ownership and return mutable access to the block.
    ///
    /// Clones the block iff the count is greater than one; the handle then
    /// owns the clone with count 1 and the old block's count drops by one.
    /// Read paths must not call this.
    #[inline]
    pub(crate) fn make_mut(&mut self) -> &mut T {
        Rc::make_mut(&mut self.block)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            block: Rc::clone(&self.block),
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.block
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.block.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::Shared;

    /// Invariant: cloning a handle shares the block and bumps the count;
    /// dropping a clone releases it.
    #[test]
    fn clone_shares_and_counts() {
        let a = Shared::new(vec![1, 2, 3]);
        assert_eq!(a.strong_count(), 1);

        let b = a.clone();
        assert!(a.shares_with(&b));
        assert_eq!(a.strong_count(), 2);

        drop(b);
        assert_eq!(a.strong_count(), 1);
    }

    /// Invariant: `make_mut` on a shared handle detaches it onto a private
    /// clone; the other handle keeps the original contents.
    #[test]
    fn make_mut_detaches_when_shared() {
        let mut a = Shared::new(vec![1, 2, 3]);
        let b = a.clone();

        a.make_mut().push(4);
        assert!(!a.shares_with(&b));
        assert_eq!(*a, vec![1, 2, 3, 4]);
        assert_eq!(*b, vec![1, 2, 3]);
        assert_eq!(a.strong_count(), 1);
        assert_eq!(b.strong_count(), 1);
    }

    /// Invariant: `make_mut` on an exclusive handle mutates in place, no clone.
    #[test]
    fn make_mut_in_place_when_exclusive() {
        let mut a = Shared::new(vec![1]);
        a.make_mut().push(2);
        assert_eq!(*a, vec![1, 2]);
        assert_eq!(a.strong_count(), 1);
    }
}
