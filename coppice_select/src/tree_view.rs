// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree widget controller: expansion, highlight selection, and checkboxes.

use core::fmt::Debug;
use core::hash::Hash;

use alloc::vec::Vec;
use hashbrown::HashSet;

use coppice_check::{CheckMode, CheckedState, rederive, toggle};
use coppice_loader::{Begin, LoadState, Loader};
use coppice_tree::{Children, NodeFlags, NodeRef, TreeError, TreeIndex, TreeNode};

/// How many rows may be highlighted at once.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectionPolicy {
    /// Selecting a row replaces the previous selection.
    Single,
    /// Selection accumulates; selecting again deselects.
    Multiple,
}

/// Outcome of a tree interaction.
#[derive(Clone, Debug)]
pub enum TreeEvent<K> {
    /// The row joined the highlight selection.
    Selected(K),
    /// The row left the highlight selection.
    Deselected(K),
    /// Check state changed; the set holds every key whose rendered checkbox
    /// differs from before.
    CheckChanged(HashSet<K>),
    /// The row expanded over already-loaded children.
    Expanded(K),
    /// The row collapsed.
    Collapsed(K),
    /// The row expanded over unknown children and a fetch should start now.
    NeedsLoad(K),
    /// The interaction targeted a disabled node or one lacking the relevant
    /// capability flag.
    Ignored,
}

// Manual impls: comparing the `CheckChanged` set needs `K: Eq + Hash`, which
// the derive would not require.
impl<K: Eq + Hash> PartialEq for TreeEvent<K> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Selected(a), Self::Selected(b))
            | (Self::Deselected(a), Self::Deselected(b))
            | (Self::Expanded(a), Self::Expanded(b))
            | (Self::Collapsed(a), Self::Collapsed(b))
            | (Self::NeedsLoad(a), Self::NeedsLoad(b)) => a == b,
            (Self::CheckChanged(a), Self::CheckChanged(b)) => a == b,
            (Self::Ignored, Self::Ignored) => true,
            _ => false,
        }
    }
}

impl<K: Eq + Hash> Eq for TreeEvent<K> {}

/// Controller for a tree widget.
///
/// Holds the three interaction states a tree renders from: the expanded key
/// set, the highlighted key set, and the tri-state [`CheckedState`]. Check
/// toggles delegate to [`coppice_check`] with the configured [`CheckMode`];
/// lazy branches delegate to an internal [`Loader`].
///
/// Nodes flagged without [`NodeFlags::SELECTABLE`] cannot be highlighted and
/// nodes without [`NodeFlags::CHECKABLE`] cannot be checked; both are
/// reported as [`TreeEvent::Ignored`], matching disabled nodes.
#[derive(Clone, Debug)]
pub struct TreeView<K> {
    mode: CheckMode,
    policy: SelectionPolicy,
    checked: CheckedState<K>,
    selected: HashSet<K>,
    expanded: HashSet<K>,
    loader: Loader<K>,
}

impl<K> TreeView<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Controller with nothing expanded, selected, or checked.
    pub fn new(mode: CheckMode, policy: SelectionPolicy) -> Self {
        Self {
            mode,
            policy,
            checked: CheckedState::new(),
            selected: HashSet::new(),
            expanded: HashSet::new(),
            loader: Loader::new(),
        }
    }

    /// Seed the check state from host-provided keys (a form's initial value).
    /// In cascade mode ancestors are re-derived to match.
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

    /// The highlighted key set.
    pub fn selected(&self) -> &HashSet<K> {
        &self.selected
    }

    /// Whether the row at `key` is expanded.
    pub fn is_expanded(&self, key: K) -> bool {
        self.expanded.contains(&key)
    }

    /// Per-key load state, for spinner and retry affordances.
    pub fn load_state(&self, key: K) -> LoadState {
        self.loader.state(key)
    }

    /// Toggle the checkbox on `key`.
    pub fn toggle_check<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<TreeEvent<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() || !node.flags.contains(NodeFlags::CHECKABLE) {
            return Ok(TreeEvent::Ignored);
        }
        let next = !self.checked.is_checked(key);
        let new = toggle(index, key, next, &self.checked, self.mode)?;
        let changed = new.diff(&self.checked);
        self.checked = new;
        Ok(TreeEvent::CheckChanged(changed))
    }

    /// Toggle the highlight on `key`.
    pub fn select<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<TreeEvent<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() || !node.flags.contains(NodeFlags::SELECTABLE) {
            return Ok(TreeEvent::Ignored);
        }
        if self.selected.remove(&key) {
            return Ok(TreeEvent::Deselected(key));
        }
        if self.policy == SelectionPolicy::Single {
            self.selected.clear();
        }
        self.selected.insert(key);
        Ok(TreeEvent::Selected(key))
    }

    /// Expand or collapse the row at `key`.
    ///
    /// Declared leaves are [`TreeError::NotExpandable`]. Collapsing a row
    /// whose fetch is still in flight cancels the load, so the late
    /// resolution is discarded instead of mutating a closed branch.
    pub fn toggle_expand<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<TreeEvent<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if self.expanded.remove(&key) {
            if self.loader.state(key) == LoadState::Loading {
                self.loader.invalidate(key);
            }
            return Ok(TreeEvent::Collapsed(key));
        }
        match &node.children {
            Children::Leaf => Err(TreeError::NotExpandable(key)),
            Children::Loaded(_) => {
                self.expanded.insert(key);
                Ok(TreeEvent::Expanded(key))
            }
            Children::Unknown => {
                self.expanded.insert(key);
                Ok(match self.loader.begin(index, key)? {
                    Begin::Started => TreeEvent::NeedsLoad(key),
                    Begin::InFlight | Begin::AlreadyLoaded => TreeEvent::Expanded(key),
                })
            }
        }
    }

    /// Feed a resolved fetch back in; returns the new root vector. Rebuild
    /// the index over it and call [`TreeView::refresh`] so derived state
    /// covers the new branch.
    pub fn complete_load<D>(
        &mut self,
        roots: &[NodeRef<K, D>],
        index: &TreeIndex<K, D>,
        key: K,
        children: Vec<TreeNode<K, D>>,
    ) -> Result<Vec<NodeRef<K, D>>, TreeError<K>>
    where
        D: Clone,
    {
        self.loader.complete(roots, index, key, children)
    }

    /// Record a failed fetch; the row renders a retry affordance.
    pub fn fail_load(&mut self, key: K) {
        self.loader.fail(key);
    }

    /// Reconcile check state after children were merged under `key`.
    ///
    /// `index` must be built over the post-merge roots. In cascade mode a
    /// checked branch conducts its check down to the children that just
    /// arrived; otherwise ancestors simply re-derive over the new shape.
    pub fn absorb_merge<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<(), TreeError<K>> {
        if self.mode != CheckMode::Cascade {
            return Ok(());
        }
        if self.checked.is_checked(key) {
            self.checked = toggle(index, key, true, &self.checked, CheckMode::Cascade)?;
        } else {
            self.checked = rederive(index, &self.checked);
        }
        Ok(())
    }

    /// Reconcile with a changed tree: prune selection and expansion keys the
    /// index no longer knows, and re-derive cascade ancestors.
    pub fn refresh<D>(&mut self, index: &TreeIndex<K, D>) {
        self.selected.retain(|key| index.contains(*key));
        self.expanded.retain(|key| index.contains(*key));
        if self.mode == CheckMode::Cascade {
            self.checked = rederive(index, &self.checked);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use coppice_tree::into_roots;

    fn org_tree() -> Vec<NodeRef<u32>> {
        // 1 -> [2 -> [3, 4], 5(lazy), 6(no checkbox)]
        into_roots(vec![TreeNode::branch(
            1,
            (),
            vec![
                TreeNode::branch(2, (), vec![TreeNode::leaf(3, ()), TreeNode::leaf(4, ())]),
                TreeNode::lazy(5, ()),
                TreeNode::leaf(6, ()).with_flags(NodeFlags::SELECTABLE),
            ],
        )])
    }

    #[test]
    fn cascade_check_reports_every_changed_row() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);

        let TreeEvent::CheckChanged(changed) = view.toggle_check(&index, 3).unwrap() else {
            panic!("expected a check change");
        };
        // Leaf checked, parent and root went indeterminate.
        assert_eq!(changed.len(), 3);
        assert!(changed.contains(&3) && changed.contains(&2) && changed.contains(&1));
        assert!(view.checked_state().is_indeterminate(2));
    }

    #[test]
    fn strict_check_touches_one_row() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Strict, SelectionPolicy::Multiple);

        let TreeEvent::CheckChanged(changed) = view.toggle_check(&index, 2).unwrap() else {
            panic!("expected a check change");
        };
        assert_eq!(changed.len(), 1);
        assert!(view.checked_state().is_checked(2));
        assert!(!view.checked_state().is_checked(3));
    }

    #[test]
    fn capability_flags_gate_interactions() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);

        // Node 6 is selectable but not checkable.
        assert_eq!(view.toggle_check(&index, 6).unwrap(), TreeEvent::Ignored);
        assert_eq!(view.select(&index, 6).unwrap(), TreeEvent::Selected(6));
    }

    #[test]
    fn single_selection_replaces() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Single);

        view.select(&index, 3).unwrap();
        view.select(&index, 4).unwrap();
        assert_eq!(view.selected().len(), 1);
        assert!(view.selected().contains(&4));

        // Selecting the selected row deselects it.
        assert_eq!(view.select(&index, 4).unwrap(), TreeEvent::Deselected(4));
        assert!(view.selected().is_empty());
    }

    #[test]
    fn expand_lazy_collapse_cancels_the_fetch() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);

        assert_eq!(view.toggle_expand(&index, 5).unwrap(), TreeEvent::NeedsLoad(5));
        assert_eq!(view.load_state(5), LoadState::Loading);

        assert_eq!(view.toggle_expand(&index, 5).unwrap(), TreeEvent::Collapsed(5));
        assert_eq!(view.load_state(5), LoadState::Idle);

        // The late resolution is discarded and the tree stays as it was.
        let err = view
            .complete_load(&roots, &index, 5, vec![TreeNode::leaf(50, ())])
            .unwrap_err();
        assert_eq!(err, TreeError::PathBroken(5));
    }

    #[test]
    fn leaf_expansion_is_not_expandable() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);
        assert_eq!(
            view.toggle_expand(&index, 3).unwrap_err(),
            TreeError::NotExpandable(3)
        );
    }

    #[test]
    fn checked_branch_conducts_onto_loaded_children() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);

        // Check the lazy branch, then load children under it.
        view.toggle_check(&index, 5).unwrap();
        view.toggle_expand(&index, 5).unwrap();
        let new_roots = view
            .complete_load(&roots, &index, 5, vec![TreeNode::leaf(50, ())])
            .unwrap();
        let new_index = TreeIndex::build(&new_roots).unwrap();
        view.absorb_merge(&new_index, 5).unwrap();

        // The user's check on the branch carried down to the new child.
        assert!(view.checked_state().is_checked(5));
        assert!(view.checked_state().is_checked(50));
    }

    #[test]
    fn refresh_prunes_stale_keys() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);
        view.select(&index, 3).unwrap();
        view.toggle_expand(&index, 2).unwrap();

        let replaced = into_roots(vec![TreeNode::leaf(1_u32, ())]);
        let replaced_index = TreeIndex::build(&replaced).unwrap();
        view.refresh(&replaced_index);

        assert!(view.selected().is_empty());
        assert!(!view.is_expanded(2));
    }

    #[test]
    fn seeded_value_derives_ancestors() {
        let roots = org_tree();
        let index = TreeIndex::build(&roots).unwrap();
        let mut view = TreeView::new(CheckMode::Cascade, SelectionPolicy::Multiple);

        view.seed_checked(&index, [3, 4]);
        assert!(view.checked_state().is_checked(2));
        assert!(view.checked_state().is_indeterminate(1));
    }
}
