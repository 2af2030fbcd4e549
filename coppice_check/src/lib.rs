// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Check: tri-state check propagation for keyed option trees.
//!
//! This crate computes the new checked/indeterminate key sets when a node's
//! check state toggles. Two modes exist:
//!
//! - [`CheckMode::Cascade`]: checking a node mirrors the value to every
//!   non-disabled descendant and recomputes every ancestor, producing the
//!   familiar tri-state checkbox behavior where a parent with some (not all)
//!   checked descendants renders indeterminate.
//! - [`CheckMode::Strict`]: each node is an independent unit. Only the toggled
//!   key changes and `indeterminate` stays empty. Callers relying on
//!   "select all descendants" semantics must not use strict mode.
//!
//! State is never mutated in place: [`toggle`] takes a [`CheckedState`] by
//! reference and returns a new one, so the presentation layer can diff
//! snapshots for re-rendering. Two toggles issued in sequence compose by
//! feeding the output of the first into the second.
//!
//! Disabled nodes are frozen but visible to the algorithm: they never enter
//! `checked` through user action and user action never removes them, yet
//! propagation passes through them to their descendants, and whatever state
//! they already hold still counts toward an ancestor's recomputation.
//!
//! ## Minimal example
//!
//! ```rust
//! use coppice_check::{CheckMode, CheckedState, toggle};
//! use coppice_tree::{TreeIndex, TreeNode, into_roots};
//!
//! let roots = into_roots(vec![TreeNode::branch(
//!     "a",
//!     (),
//!     vec![TreeNode::leaf("a1", ()), TreeNode::leaf("a2", ())],
//! )]);
//! let index = TreeIndex::build(&roots).unwrap();
//!
//! let state = CheckedState::new();
//! let state = toggle(&index, "a1", true, &state, CheckMode::Cascade).unwrap();
//! assert!(state.is_indeterminate("a"));
//!
//! let state = toggle(&index, "a2", true, &state, CheckMode::Cascade).unwrap();
//! assert!(state.is_checked("a"));
//! assert!(!state.is_indeterminate("a"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::HashSet;

use coppice_tree::{NodeRef, TreeError, TreeIndex};

/// Propagation mode for check toggles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CheckMode {
    /// Checking a node propagates to all descendants and recomputes all
    /// ancestors.
    Cascade,
    /// Checking a node affects only that node; no propagation, no
    /// indeterminate state.
    Strict,
}

/// Effective check state of a single node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CheckState {
    /// Not checked and no checked descendant.
    Unchecked,
    /// Fully checked.
    Checked,
    /// Some but not all descendants are checked.
    Indeterminate,
}

/// Immutable snapshot of checked and indeterminate key sets.
///
/// Under cascade mode the two sets are disjoint and a node with no children
/// never appears in `indeterminate`. Under strict mode `indeterminate` is
/// always empty.
#[derive(Clone, Debug, Default)]
pub struct CheckedState<K> {
    checked: HashSet<K>,
    indeterminate: HashSet<K>,
}

// Manual impls: comparing the `HashSet` fields needs `K: Eq + Hash`, which
// the derive would not require.
impl<K: Eq + Hash> PartialEq for CheckedState<K> {
    fn eq(&self, other: &Self) -> bool {
        self.checked == other.checked && self.indeterminate == other.indeterminate
    }
}

impl<K: Eq + Hash> Eq for CheckedState<K> {}

impl<K> CheckedState<K>
where
    K: Copy + Eq + Hash,
{
    /// Empty state: nothing checked.
    pub fn new() -> Self {
        Self {
            checked: HashSet::new(),
            indeterminate: HashSet::new(),
        }
    }

    /// Seed a state from host-provided checked keys (for example a form's
    /// initial value). Run [`rederive`] over it afterwards if ancestors should
    /// reflect the seed in cascade mode.
    pub fn from_checked(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            checked: keys.into_iter().collect(),
            indeterminate: HashSet::new(),
        }
    }

    /// Whether `key` is checked.
    pub fn is_checked(&self, key: K) -> bool {
        self.checked.contains(&key)
    }

    /// Whether `key` is indeterminate.
    pub fn is_indeterminate(&self, key: K) -> bool {
        self.indeterminate.contains(&key)
    }

    /// Effective state of `key`.
    pub fn effective(&self, key: K) -> CheckState {
        if self.checked.contains(&key) {
            CheckState::Checked
        } else if self.indeterminate.contains(&key) {
            CheckState::Indeterminate
        } else {
            CheckState::Unchecked
        }
    }

    /// The checked key set.
    pub fn checked(&self) -> &HashSet<K> {
        &self.checked
    }

    /// The indeterminate key set.
    pub fn indeterminate(&self) -> &HashSet<K> {
        &self.indeterminate
    }

    /// Keys whose effective state differs between `self` and `other`.
    ///
    /// The rendering layer re-renders exactly these rows after a toggle.
    pub fn diff(&self, other: &Self) -> HashSet<K> {
        let mut changed = HashSet::new();
        for &key in self
            .checked
            .iter()
            .chain(self.indeterminate.iter())
            .chain(other.checked.iter())
            .chain(other.indeterminate.iter())
        {
            if self.effective(key) != other.effective(key) {
                changed.insert(key);
            }
        }
        changed
    }

    fn apply(&mut self, key: K, state: CheckState) {
        match state {
            CheckState::Unchecked => {
                self.checked.remove(&key);
                self.indeterminate.remove(&key);
            }
            CheckState::Checked => {
                self.checked.insert(key);
                self.indeterminate.remove(&key);
            }
            CheckState::Indeterminate => {
                self.checked.remove(&key);
                self.indeterminate.insert(key);
            }
        }
    }
}

/// Compute the state after toggling `key` to `next`.
///
/// Toggling a disabled node is a no-op returning the input state unchanged;
/// disabling is enforced here, not only in the presentation layer. Unknown
/// keys are [`TreeError::PathBroken`]. The input state is never modified.
pub fn toggle<K, D>(
    index: &TreeIndex<K, D>,
    key: K,
    next: bool,
    state: &CheckedState<K>,
    mode: CheckMode,
) -> Result<CheckedState<K>, TreeError<K>>
where
    K: Copy + Eq + Hash + Debug,
{
    let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
    if node.is_disabled() {
        return Ok(state.clone());
    }

    let mut next_state = state.clone();
    let target = if next {
        CheckState::Checked
    } else {
        CheckState::Unchecked
    };

    match mode {
        CheckMode::Strict => {
            next_state.apply(key, target);
        }
        CheckMode::Cascade => {
            // Mirror down through the subtree; disabled nodes keep their
            // frozen state but do not block propagation to their descendants.
            index.for_each_descendant(key, |node| {
                if !node.is_disabled() {
                    next_state.apply(node.key, target);
                }
            });

            // Recompute ancestors until one is already consistent.
            let mut current = index.parent_of(key);
            while let Some(ancestor_key) = current {
                let ancestor = index
                    .lookup(ancestor_key)
                    .ok_or(TreeError::PathBroken(ancestor_key))?;
                if ancestor.is_disabled() {
                    break;
                }
                let derived = derive(ancestor, &next_state);
                if derived == next_state.effective(ancestor_key) {
                    break;
                }
                next_state.apply(ancestor_key, derived);
                current = index.parent_of(ancestor_key);
            }
        }
    }

    Ok(next_state)
}

/// Recompute every ancestor's checked/indeterminate membership bottom-up.
///
/// Leaf-level membership is taken as ground truth; internal non-disabled
/// nodes are rederived from their children, and childless nodes are stripped
/// of any spurious indeterminate entry. Idempotent: rederiving an
/// already-consistent state yields an equal state. Useful after seeding with
/// [`CheckedState::from_checked`] or after a loader merge changes the shape
/// of the tree.
pub fn rederive<K, D>(index: &TreeIndex<K, D>, state: &CheckedState<K>) -> CheckedState<K>
where
    K: Copy + Eq + Hash + Debug,
{
    let mut next_state = state.clone();
    // Reverse depth-first order visits children before parents.
    let keys: alloc::vec::Vec<K> = index.keys().collect();
    for &key in keys.iter().rev() {
        let Some(node) = index.lookup(key) else {
            continue;
        };
        if node.is_disabled() {
            continue;
        }
        match node.loaded_children() {
            Some(children) if !children.is_empty() => {
                // A parent with no enabled children can only be checked
                // directly; derivation must not erase that check.
                if next_state.is_checked(key) && children.iter().all(|child| child.is_disabled()) {
                    continue;
                }
                let derived = derive(node, &next_state);
                next_state.apply(key, derived);
            }
            _ => {
                // A node with no children is never indeterminate.
                next_state.indeterminate.remove(&key);
            }
        }
    }
    next_state
}

/// Derive a parent's state from its children's effective states.
///
/// Checked iff every non-disabled child is checked (and at least one exists);
/// indeterminate iff anything below carries state; disabled children count
/// with whatever frozen state they hold.
fn derive<K, D>(node: &NodeRef<K, D>, state: &CheckedState<K>) -> CheckState
where
    K: Copy + Eq + Hash,
{
    let Some(children) = node.loaded_children() else {
        return state.effective(node.key);
    };
    if children.is_empty() {
        return state.effective(node.key);
    }

    let mut enabled = 0_usize;
    let mut enabled_checked = 0_usize;
    let mut any_effective = false;
    for child in children {
        let effective = state.effective(child.key);
        any_effective |= effective != CheckState::Unchecked;
        if !child.is_disabled() {
            enabled += 1;
            if effective == CheckState::Checked {
                enabled_checked += 1;
            }
        }
    }

    if enabled > 0 && enabled_checked == enabled {
        CheckState::Checked
    } else if any_effective {
        CheckState::Indeterminate
    } else {
        CheckState::Unchecked
    }
}
