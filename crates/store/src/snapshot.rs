//! Layered ledger snapshots.
//!
//! A [`SnapshotTree`] represents the full ledger state at one block
//! height as a chain of per-block deltas. Appending a delta produces a
//! new tree that shares every existing layer with its parent, so a
//! reader holding the tree for an older height keeps a consistent view
//! while later blocks are committed.

use sandbox_core::{Delta, RegisterKey};
use std::sync::Arc;

/// An immutable, append-only layered view of ledger state.
///
/// Cloning is cheap: the layers are reference-counted and never
/// mutated after construction.
#[derive(Clone, Debug, Default)]
pub struct SnapshotTree {
    head: Option<Arc<Layer>>,
}

#[derive(Debug)]
struct Layer {
    delta: Delta,
    parent: Option<Arc<Layer>>,
}

impl SnapshotTree {
    /// Creates the empty view: zero layers, every read misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a new tree whose reads consult `delta` first, falling
    /// back to this tree. The receiver is unmodified.
    pub fn append(&self, delta: Delta) -> Self {
        Self {
            head: Some(Arc::new(Layer {
                delta,
                parent: self.head.clone(),
            })),
        }
    }

    /// Reads a register, walking layers from most recent to oldest.
    ///
    /// The first layer containing a write to `key` wins. `None` means
    /// the register has never been written at or before this height;
    /// callers must not conflate this with an empty value.
    pub fn get(&self, key: &RegisterKey) -> Option<&[u8]> {
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            if let Some(value) = current.delta.get(key) {
                return Some(value);
            }
            layer = current.parent.as_deref();
        }
        None
    }

    /// The number of delta layers stacked in this view.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }

    /// Returns true if the view has no layers.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_core::Address;

    fn key(name: &str) -> RegisterKey {
        RegisterKey::new(Address::SERVICE, name)
    }

    fn delta(writes: &[(&str, &[u8])]) -> Delta {
        let mut delta = Delta::new();
        for (name, value) in writes {
            delta.set(key(name), value.to_vec());
        }
        delta
    }

    #[test]
    fn test_empty_tree_misses() {
        let tree = SnapshotTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.get(&key("anything")), None);
    }

    #[test]
    fn test_newest_layer_wins() {
        let tree = SnapshotTree::empty()
            .append(delta(&[("counter", b"1"), ("name", b"a")]))
            .append(delta(&[("counter", b"2")]));

        assert_eq!(tree.get(&key("counter")), Some(b"2".as_slice()));
        assert_eq!(tree.get(&key("name")), Some(b"a".as_slice()));
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_append_leaves_receiver_unchanged() {
        let old = SnapshotTree::empty().append(delta(&[("counter", b"1")]));
        let new = old.append(delta(&[("counter", b"2")]));

        assert_eq!(old.get(&key("counter")), Some(b"1".as_slice()));
        assert_eq!(new.get(&key("counter")), Some(b"2".as_slice()));
        assert_eq!(old.depth(), 1);
    }

    #[test]
    fn test_miss_is_not_a_default_value() {
        let tree = SnapshotTree::empty().append(delta(&[("written", b"")]));
        // An empty written value is a hit; an unwritten key is a miss.
        assert_eq!(tree.get(&key("written")), Some(b"".as_slice()));
        assert_eq!(tree.get(&key("unwritten")), None);
    }
}
