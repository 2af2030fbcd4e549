// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Checkable dropdown controller: tags, breadcrumbs, and search.

use core::fmt::Debug;
use core::hash::Hash;

use alloc::vec::Vec;
use hashbrown::HashSet;

use coppice_check::{CheckMode, CheckedState, rederive, toggle};
use coppice_tree::{
    DescendantPolicy, FilterOutcome, NodeFlags, NodeRef, TreeError, TreeIndex, TreeNode,
    filter_tree, resolve_path,
};

/// Which checked keys become the dropdown's display tags.
///
/// Tags are *derived* from the check state on every render; choosing a
/// strategy never rewrites the state itself, so switching strategies is
/// lossless.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagStrategy {
    /// Every checked key is a tag.
    All,
    /// A checked key is a tag only if its parent is not also checked, so a
    /// fully checked subtree collapses to its topmost node.
    Parent,
    /// Only checked keys with no enabled children are tags, so a fully
    /// checked subtree expands to its leaves.
    Child,
}

/// Controller for a tree-shaped dropdown with checkbox selection.
///
/// Owns only the [`CheckedState`]; the open/closed popup, text input, and
/// focus are the host's concern. Search and breadcrumbs are pure reads.
#[derive(Clone, Debug)]
pub struct TreeCombo<K> {
    mode: CheckMode,
    strategy: TagStrategy,
    checked: CheckedState<K>,
}

impl<K> TreeCombo<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Controller with nothing checked.
    pub fn new(mode: CheckMode, strategy: TagStrategy) -> Self {
        Self {
            mode,
            strategy,
            checked: CheckedState::new(),
        }
    }

    /// Seed the check state from host-provided keys; cascade ancestors are
    /// re-derived to match.
    pub fn seed_checked<D>(&mut self, index: &TreeIndex<K, D>, keys: impl IntoIterator<Item = K>) {
        let seeded = CheckedState::from_checked(keys);
        self.checked = match self.mode {
            CheckMode::Cascade => rederive(index, &seeded),
            CheckMode::Strict => seeded,
        };
    }

    /// The current check snapshot.
    pub fn checked_state(&self) -> &CheckedState<K> {
        &self.checked
    }

    /// Toggle the checkbox on `key`; returns the keys whose rendered state
    /// changed.
    pub fn toggle_check<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<HashSet<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() || !node.flags.contains(NodeFlags::CHECKABLE) {
            return Ok(HashSet::new());
        }
        let next = !self.checked.is_checked(key);
        let new = toggle(index, key, next, &self.checked, self.mode)?;
        let changed = new.diff(&self.checked);
        self.checked = new;
        Ok(changed)
    }

    /// The display tags under the configured [`TagStrategy`], in the tree's
    /// depth-first order so tag order is stable across toggles.
    pub fn tags<D>(&self, index: &TreeIndex<K, D>) -> Vec<K> {
        index
            .keys()
            .filter(|&key| self.checked.is_checked(key))
            .filter(|&key| match self.strategy {
                TagStrategy::All => true,
                TagStrategy::Parent => !index
                    .parent_of(key)
                    .is_some_and(|parent| self.checked.is_checked(parent)),
                TagStrategy::Child => index.lookup(key).is_none_or(|node| {
                    node.loaded_children()
                        .is_none_or(|children| children.iter().all(|child| child.is_disabled()))
                }),
            })
            .collect()
    }

    /// The root-to-node trail for `key`, as node objects for rendering
    /// breadcrumb labels.
    pub fn breadcrumbs<D>(
        &self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<Vec<NodeRef<K, D>>, TreeError<K>> {
        let path = index.ancestors_of(key)?;
        resolve_path(index, &path)
    }

    /// Search the dropdown: matched keys plus the ancestors that keep them
    /// reachable and the descendants under each match.
    pub fn search<D, F>(&self, roots: &[NodeRef<K, D>], predicate: F) -> FilterOutcome<K>
    where
        F: FnMut(&TreeNode<K, D>) -> bool,
    {
        filter_tree(roots, predicate, DescendantPolicy::Include)
    }

    /// Uncheck everything.
    pub fn clear(&mut self) {
        self.checked = CheckedState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use coppice_tree::into_roots;

    fn catalog() -> Vec<NodeRef<u32, &'static str>> {
        // 1 "fruit" -> [2 "citrus" -> [3 "lemon", 4 "lime"], 5 "apple"]
        into_roots(vec![TreeNode::branch(
            1,
            "fruit",
            vec![
                TreeNode::branch(
                    2,
                    "citrus",
                    vec![TreeNode::leaf(3, "lemon"), TreeNode::leaf(4, "lime")],
                ),
                TreeNode::leaf(5, "apple"),
            ],
        )])
    }

    #[test]
    fn tag_strategies_derive_without_mutating_state() {
        let roots = catalog();
        let index = TreeIndex::build(&roots).unwrap();

        let mut combo = TreeCombo::new(CheckMode::Cascade, TagStrategy::All);
        combo.toggle_check(&index, 2).unwrap();
        let state_before = combo.checked_state().clone();

        // Checking "citrus" cascades: 2, 3, 4 are checked.
        assert_eq!(combo.tags(&index), vec![2, 3, 4]);

        let parent_combo = TreeCombo {
            strategy: TagStrategy::Parent,
            ..combo.clone()
        };
        assert_eq!(parent_combo.tags(&index), vec![2]);

        let child_combo = TreeCombo {
            strategy: TagStrategy::Child,
            ..combo.clone()
        };
        assert_eq!(child_combo.tags(&index), vec![3, 4]);

        assert_eq!(combo.checked_state(), &state_before);
    }

    #[test]
    fn parent_strategy_collapses_a_fully_checked_tree() {
        let roots = catalog();
        let index = TreeIndex::build(&roots).unwrap();
        let mut combo = TreeCombo::new(CheckMode::Cascade, TagStrategy::Parent);
        combo.toggle_check(&index, 1).unwrap();
        assert_eq!(combo.tags(&index), vec![1]);
    }

    #[test]
    fn breadcrumbs_resolve_labels_along_the_trail() {
        let roots = catalog();
        let index = TreeIndex::build(&roots).unwrap();
        let combo = TreeCombo::<u32>::new(CheckMode::Cascade, TagStrategy::All);

        let trail = combo.breadcrumbs(&index, 4).unwrap();
        let labels: Vec<_> = trail.iter().map(|node| node.data).collect();
        assert_eq!(labels, vec!["fruit", "citrus", "lime"]);
    }

    #[test]
    fn search_keeps_matches_reachable() {
        let roots = catalog();
        let combo = TreeCombo::<u32>::new(CheckMode::Cascade, TagStrategy::All);

        let outcome = combo.search(&roots, |node| node.data.contains("citrus"));
        assert!(outcome.matched.contains(&2));
        // Ancestor for reachability, descendants under the match.
        assert!(outcome.visible.contains(&1));
        assert!(outcome.visible.contains(&3) && outcome.visible.contains(&4));
        assert!(!outcome.visible.contains(&5));
    }

    #[test]
    fn strict_mode_checks_exactly_one_key() {
        let roots = catalog();
        let index = TreeIndex::build(&roots).unwrap();
        let mut combo = TreeCombo::new(CheckMode::Strict, TagStrategy::All);

        let changed = combo.toggle_check(&index, 2).unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(combo.tags(&index), vec![2]);
    }
}
