// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter traversal: match nodes against a predicate while keeping ancestor
//! chains visible.

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::{HashMap, HashSet};

use crate::node::{NodeRef, TreeNode};

/// Whether descendants of a matched node stay visible.
///
/// Cascading selectors typically do not auto-expand below a match
/// ([`Exclude`](Self::Exclude)); tree-search surfaces typically do
/// ([`Include`](Self::Include)).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DescendantPolicy {
    /// Only matches and their ancestors are visible.
    Exclude,
    /// Matches, their ancestors, and their whole subtrees are visible.
    Include,
}

/// Result of a filter traversal.
#[derive(Clone, Debug, Default)]
pub struct FilterOutcome<K> {
    /// Every node satisfying the predicate.
    pub matched: HashSet<K>,
    /// `matched`, plus every ancestor of a match (so a deep match keeps its
    /// chain visible), plus every descendant of a match under
    /// [`DescendantPolicy::Include`].
    pub visible: HashSet<K>,
}

/// Filter the tree, O(number of nodes): one depth-first pass over the tree
/// plus an ancestor climb per match.
///
/// The predicate sees every node, disabled or not; whether disabled nodes
/// match is the predicate's own business.
pub fn filter_tree<K, D, F>(
    roots: &[NodeRef<K, D>],
    mut predicate: F,
    policy: DescendantPolicy,
) -> FilterOutcome<K>
where
    K: Copy + Eq + Hash,
    F: FnMut(&TreeNode<K, D>) -> bool,
{
    let mut matched = HashSet::new();
    let mut visible = HashSet::new();
    let mut parent: HashMap<K, K> = HashMap::new();

    // Depth-first with an explicit stack so arbitrarily deep trees cannot
    // overflow; the flag records whether some ancestor already matched.
    let mut stack: Vec<(&NodeRef<K, D>, bool)> =
        roots.iter().rev().map(|node| (node, false)).collect();
    while let Some((node, under_match)) = stack.pop() {
        let is_match = predicate(node);
        if is_match {
            matched.insert(node.key);
            visible.insert(node.key);
        } else if under_match && policy == DescendantPolicy::Include {
            visible.insert(node.key);
        }
        if let Some(children) = node.loaded_children() {
            for child in children.iter().rev() {
                parent.insert(child.key, node.key);
                stack.push((child, under_match || is_match));
            }
        }
    }

    // Matches keep their ancestor chain visible. An ancestor already in
    // `visible` ends the climb: its own chain is either present or owned by
    // another match's climb.
    for &key in &matched {
        let mut current = parent.get(&key).copied();
        while let Some(ancestor) = current {
            if !visible.insert(ancestor) {
                break;
            }
            current = parent.get(&ancestor).copied();
        }
    }

    FilterOutcome { matched, visible }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{TreeNode, into_roots};
    use alloc::vec;
    use alloc::vec::Vec;

    fn sample() -> Vec<NodeRef<u32, &'static str>> {
        into_roots(vec![
            TreeNode::branch(
                1,
                "fruit",
                vec![
                    TreeNode::branch(2, "citrus", vec![TreeNode::leaf(4, "lime")]),
                    TreeNode::leaf(3, "apple"),
                ],
            ),
            TreeNode::leaf(9, "stone"),
        ])
    }

    #[test]
    fn deep_match_keeps_ancestors_visible() {
        let roots = sample();
        let out = filter_tree(&roots, |n| n.data == "lime", DescendantPolicy::Exclude);
        assert_eq!(out.matched.len(), 1);
        assert!(out.matched.contains(&4));
        assert_eq!(out.visible.len(), 3);
        assert!(out.visible.contains(&1));
        assert!(out.visible.contains(&2));
        assert!(out.visible.contains(&4));
    }

    #[test]
    fn include_policy_keeps_subtrees_of_matches() {
        let roots = sample();
        let out = filter_tree(&roots, |n| n.data == "citrus", DescendantPolicy::Include);
        assert!(out.matched.contains(&2));
        // Ancestor 1, match 2, descendant 4.
        assert!(out.visible.contains(&1));
        assert!(out.visible.contains(&2));
        assert!(out.visible.contains(&4));
        assert!(!out.visible.contains(&3));
    }

    #[test]
    fn exclude_policy_hides_subtrees_of_matches() {
        let roots = sample();
        let out = filter_tree(&roots, |n| n.data == "citrus", DescendantPolicy::Exclude);
        assert!(out.visible.contains(&2));
        assert!(!out.visible.contains(&4));
    }

    #[test]
    fn deep_chain_filters_without_recursion() {
        // One node per level, match at the very bottom.
        let mut node = TreeNode::leaf(0_u32, ());
        for key in 1..=4096 {
            node = TreeNode::branch(key, (), vec![node]);
        }
        let roots = into_roots(vec![node]);

        let out = filter_tree(&roots, |n| n.key == 0, DescendantPolicy::Exclude);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.visible.len(), 4097, "whole ancestor chain is visible");
    }

    #[test]
    fn no_match_yields_empty_sets() {
        let roots = sample();
        let out = filter_tree(&roots, |_| false, DescendantPolicy::Include);
        assert!(out.matched.is_empty());
        assert!(out.visible.is_empty());
    }
}
