// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-path and multi-path cascader controllers.

use core::fmt::Debug;
use core::hash::Hash;

use alloc::vec::Vec;

use coppice_loader::{Begin, LoadState, Loader};
use coppice_tree::{
    Children, Columns, NodeFlags, NodeRef, Path, TreeError, TreeIndex, TreeNode, columns_for,
    resolve_path,
};

/// What pointer gesture opens the next column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExpandTrigger {
    /// Columns open on click only; hover is inert.
    Click,
    /// Columns open on hover as well as click.
    Hover,
}

/// Outcome of a cascader interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascaderEvent<K> {
    /// The active path changed; re-render the columns.
    PathChanged,
    /// A leaf was clicked: this root-to-leaf path is now the committed value.
    Committed(Path<K>),
    /// The node's children are unknown and a fetch should start now.
    /// The active path already includes the node, so its (empty) column is
    /// open and can render a spinner.
    NeedsLoad(K),
    /// The interaction targeted a disabled or non-selectable node.
    Ignored,
}

/// Single-value cascader: columns of options, one committed root-to-leaf
/// path.
///
/// Two paths are tracked. The *hovered* path is the transient trail the
/// pointer is exploring; the *committed* path is the chosen value. The
/// active path, which drives which columns are open, is the hovered path
/// when non-empty and the committed path otherwise, so closing and reopening
/// the dropdown shows the current value's trail.
#[derive(Clone, Debug)]
pub struct Cascader<K> {
    trigger: ExpandTrigger,
    hovered: Path<K>,
    committed: Path<K>,
    loader: Loader<K>,
}

impl<K> Cascader<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Controller with no value and no open columns.
    pub fn new(trigger: ExpandTrigger) -> Self {
        Self {
            trigger,
            hovered: Path::new(),
            committed: Path::new(),
            loader: Loader::new(),
        }
    }

    /// The path driving which columns are open.
    pub fn active_path(&self) -> &Path<K> {
        if self.hovered.is_empty() {
            &self.committed
        } else {
            &self.hovered
        }
    }

    /// The committed value, empty if nothing was chosen yet.
    pub fn committed_path(&self) -> &Path<K> {
        &self.committed
    }

    /// Per-key load state, for spinner and retry affordances.
    pub fn load_state(&self, key: K) -> LoadState {
        self.loader.state(key)
    }

    /// Handle a click on the option with `key`.
    ///
    /// A branch click extends the hovered trail and opens its column without
    /// committing. A terminal click (declared leaf or loaded-empty node)
    /// commits the full root-to-leaf path and collapses the hovered trail.
    pub fn click<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<CascaderEvent<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() {
            return Ok(CascaderEvent::Ignored);
        }
        let path = index.ancestors_of(key)?;
        if node.is_terminal() {
            if !node.flags.contains(NodeFlags::SELECTABLE) {
                return Ok(CascaderEvent::Ignored);
            }
            self.committed = path.clone();
            self.hovered.clear();
            return Ok(CascaderEvent::Committed(path));
        }
        self.hovered = path;
        self.expand_event(index, key)
    }

    /// Handle the pointer entering the option with `key`.
    ///
    /// Inert under [`ExpandTrigger::Click`]. Under hover expansion this
    /// extends the trail like a branch click, but never commits.
    pub fn hover<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<CascaderEvent<K>, TreeError<K>> {
        if self.trigger == ExpandTrigger::Click {
            return Ok(CascaderEvent::Ignored);
        }
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() {
            return Ok(CascaderEvent::Ignored);
        }
        self.hovered = index.ancestors_of(key)?;
        if node.is_terminal() {
            return Ok(CascaderEvent::PathChanged);
        }
        self.expand_event(index, key)
    }

    fn expand_event<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<CascaderEvent<K>, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if matches!(node.children, Children::Unknown) {
            return Ok(match self.loader.begin(index, key)? {
                Begin::Started => CascaderEvent::NeedsLoad(key),
                Begin::InFlight | Begin::AlreadyLoaded => CascaderEvent::PathChanged,
            });
        }
        Ok(CascaderEvent::PathChanged)
    }

    /// Feed a resolved fetch back in; returns the new root vector.
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

    /// Record a failed fetch; the option renders a retry affordance.
    pub fn fail_load(&mut self, key: K) {
        self.loader.fail(key);
    }

    /// The pointer left the column area: collapse the hovered trail back to
    /// the committed value.
    pub fn close(&mut self) {
        self.hovered.clear();
    }

    /// Reset to no value and no open columns.
    pub fn clear(&mut self) {
        self.hovered.clear();
        self.committed.clear();
    }

    /// The open columns for the current active path.
    ///
    /// Fails with [`TreeError::PathBroken`] when the active path references a
    /// removed node; callers clear the stale path and retry with the empty
    /// one.
    pub fn columns<D>(
        &self,
        index: &TreeIndex<K, D>,
        roots: &[NodeRef<K, D>],
    ) -> Result<Columns<K, D>, TreeError<K>> {
        columns_for(index, roots, self.active_path())
    }
}

/// Outcome of a [`MultiCascader::commit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MultiCommit {
    /// The path joined the committed set.
    Added,
    /// The path was already committed and was removed (toggle).
    Removed,
    /// The target was disabled, non-selectable, or not terminal.
    Ignored,
}

/// Multi-value cascader: independently committed leaf paths, no check
/// propagation between them.
#[derive(Clone, Debug, Default)]
pub struct MultiCascader<K> {
    paths: Vec<Path<K>>,
}

impl<K> MultiCascader<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Controller with an empty committed set.
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Toggle the root-to-leaf path ending at `key` in the committed set.
    pub fn commit<D>(
        &mut self,
        index: &TreeIndex<K, D>,
        key: K,
    ) -> Result<MultiCommit, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if node.is_disabled() || !node.is_terminal() || !node.flags.contains(NodeFlags::SELECTABLE)
        {
            return Ok(MultiCommit::Ignored);
        }
        let path = index.ancestors_of(key)?;
        if let Some(slot) = self.paths.iter().position(|p| *p == path) {
            self.paths.remove(slot);
            Ok(MultiCommit::Removed)
        } else {
            self.paths.push(path);
            Ok(MultiCommit::Added)
        }
    }

    /// The committed paths, in commit order.
    pub fn paths(&self) -> &[Path<K>] {
        &self.paths
    }

    /// Drop committed paths the current tree can no longer resolve.
    ///
    /// Run after a tree replacement; merges never break existing paths.
    pub fn retain_valid<D>(&mut self, index: &TreeIndex<K, D>) {
        self.paths.retain(|path| resolve_path(index, path).is_ok());
    }

    /// Remove every committed path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
