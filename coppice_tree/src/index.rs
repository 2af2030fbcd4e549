// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived key→node and key→parent lookup over a tree snapshot.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::HashMap;

use crate::error::TreeError;
use crate::node::{NodeRef, TreeNode};
use crate::path::Path;

/// A derived, read-only index over one tree snapshot.
///
/// Built by a single depth-first pass over the roots. Construction fails with
/// [`TreeError::DuplicateKey`] if any key repeats; the index holds the
/// invariant that every indexed key has a parent chain terminating at a root.
///
/// The index borrows nothing: it holds cheap reference-counted handles into
/// the snapshot it was built from. Rebuild it whenever the source root vector
/// is replaced (the loader returns a new root vector on every merge); a stale
/// index silently describes the old snapshot, which is exactly what a late
/// loader resolution wants to avoid.
#[derive(Clone, Debug)]
pub struct TreeIndex<K, D = ()> {
    by_key: HashMap<K, NodeRef<K, D>>,
    parents: HashMap<K, Option<K>>,
    order: Vec<K>,
}

impl<K, D> TreeIndex<K, D>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Build the index from a root set.
    ///
    /// Pure: the snapshot is not touched. Fails fast on the first duplicate
    /// key encountered in depth-first order.
    pub fn build(roots: &[NodeRef<K, D>]) -> Result<Self, TreeError<K>> {
        let mut index = Self {
            by_key: HashMap::new(),
            parents: HashMap::new(),
            order: Vec::new(),
        };

        // Depth-first with an explicit stack; `.rev()` keeps sibling order.
        let mut stack: Vec<(Option<K>, &NodeRef<K, D>)> =
            roots.iter().rev().map(|node| (None, node)).collect();
        while let Some((parent, node)) = stack.pop() {
            let key = node.key;
            if index.by_key.insert(key, node.clone()).is_some() {
                return Err(TreeError::DuplicateKey(key));
            }
            index.parents.insert(key, parent);
            index.order.push(key);
            if let Some(children) = node.loaded_children() {
                for child in children.iter().rev() {
                    stack.push((Some(key), child));
                }
            }
        }
        Ok(index)
    }

    /// Look up a node by key. O(1).
    pub fn lookup(&self, key: K) -> Option<&NodeRef<K, D>> {
        self.by_key.get(&key)
    }

    /// Parent of `key`, or `None` for roots and unknown keys. O(1).
    ///
    /// Use [`contains`](Self::contains) to distinguish a root from a key that
    /// is not in the tree at all.
    pub fn parent_of(&self, key: K) -> Option<K> {
        self.parents.get(&key).copied().flatten()
    }

    /// Whether `key` is in the indexed snapshot.
    pub fn contains(&self, key: K) -> bool {
        self.by_key.contains_key(&key)
    }

    /// The path from a root to `key`, inclusive.
    ///
    /// Walks the parent map until it reaches a root. Unknown keys are
    /// [`TreeError::PathBroken`]; the caller should drop whatever stale
    /// selection produced them.
    pub fn ancestors_of(&self, key: K) -> Result<Path<K>, TreeError<K>> {
        if !self.contains(key) {
            return Err(TreeError::PathBroken(key));
        }
        let mut path = Path::new();
        let mut current = Some(key);
        while let Some(k) = current {
            path.push(k);
            current = self.parent_of(k);
        }
        path.reverse();
        Ok(path)
    }

    /// Keys of every node in depth-first order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    /// Nodes in depth-first order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRef<K, D>> {
        self.order.iter().map(|key| &self.by_key[key])
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Visit `key` and every descendant of it, depth-first.
    ///
    /// No-op for keys that are not in the index.
    pub fn for_each_descendant(&self, key: K, mut visit: impl FnMut(&TreeNode<K, D>)) {
        let Some(node) = self.lookup(key) else {
            return;
        };
        let mut stack: Vec<&NodeRef<K, D>> = alloc::vec![node];
        while let Some(node) = stack.pop() {
            visit(node);
            if let Some(children) = node.loaded_children() {
                for child in children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::into_roots;
    use alloc::vec;

    fn sample() -> Vec<NodeRef<u32>> {
        // 1 -> [2 -> [4, 5], 3]
        into_roots(vec![TreeNode::branch(
            1,
            (),
            vec![
                TreeNode::branch(2, (), vec![TreeNode::leaf(4, ()), TreeNode::leaf(5, ())]),
                TreeNode::leaf(3, ()),
            ],
        )])
    }

    #[test]
    fn build_and_lookup() {
        let roots = sample();
        let index = TreeIndex::build(&roots).unwrap();

        assert_eq!(index.len(), 5);
        assert_eq!(index.lookup(4).map(|n| n.key), Some(4));
        assert!(index.lookup(99).is_none());

        assert_eq!(index.parent_of(1), None);
        assert_eq!(index.parent_of(2), Some(1));
        assert_eq!(index.parent_of(5), Some(2));
        assert!(index.contains(1));
        assert!(!index.contains(99));
    }

    #[test]
    fn depth_first_order_preserves_siblings() {
        let roots = sample();
        let index = TreeIndex::build(&roots).unwrap();
        let keys: Vec<u32> = index.keys().collect();
        assert_eq!(keys, vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn duplicate_key_fails_construction() {
        let roots = into_roots(vec![TreeNode::branch(
            1_u32,
            (),
            vec![TreeNode::leaf(2, ()), TreeNode::leaf(2, ())],
        )]);
        assert_eq!(
            TreeIndex::build(&roots).unwrap_err(),
            TreeError::DuplicateKey(2)
        );
    }

    #[test]
    fn ancestors_walk_to_root() {
        let roots = sample();
        let index = TreeIndex::build(&roots).unwrap();

        assert_eq!(index.ancestors_of(5).unwrap().as_slice(), &[1, 2, 5]);
        assert_eq!(index.ancestors_of(1).unwrap().as_slice(), &[1]);
        assert_eq!(
            index.ancestors_of(99).unwrap_err(),
            TreeError::PathBroken(99)
        );
    }

    #[test]
    fn unknown_children_are_not_indexed() {
        let roots = into_roots(vec![TreeNode::lazy(1_u32, ())]);
        let index = TreeIndex::build(&roots).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn for_each_descendant_covers_subtree() {
        let roots = sample();
        let index = TreeIndex::build(&roots).unwrap();

        let mut seen = vec![];
        index.for_each_descendant(2, |node| seen.push(node.key));
        assert_eq!(seen, vec![2, 4, 5]);

        let mut seen = vec![];
        index.for_each_descendant(99, |node| seen.push(node.key));
        assert!(seen.is_empty());
    }
}
