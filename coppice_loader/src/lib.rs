// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Loader: on-demand children for keyed option trees.
//!
//! This crate tracks per-node load state and merges fetched children into the
//! tree without mutating it. The host owns the actual asynchronous work (an
//! HTTP call, a channel, a timer); the loader is a deterministic state
//! machine driven by three calls:
//!
//! - [`Loader::begin`] — announce that a node's unknown children are wanted.
//!   Returns [`Begin::Started`] exactly once per load attempt; a second call
//!   while the first is still in flight is the dedup no-op
//!   [`Begin::InFlight`], so the host invokes its fetcher exactly once.
//! - [`Loader::complete`] — deliver fetched children. The merge is immutable:
//!   the target node and its ancestor spine are rebuilt, untouched branches
//!   are shared by reference count, and a new root vector is returned.
//!   Callers holding the old roots see no change.
//! - [`Loader::fail`] — record a fetch failure. The tree is untouched and the
//!   node becomes retryable: the next [`Loader::begin`] starts over.
//!
//! Late resolutions are handled by re-deriving everything from the *current*
//! tree: [`Loader::complete`] looks the key up in the index the caller built
//! over the tree as it stands now, not a captured snapshot. If the node was
//! removed (or the load was cancelled with [`Loader::invalidate`] because the
//! user collapsed it), the result is discarded with
//! [`TreeError::PathBroken`] instead of leaking orphaned state into a tree
//! the user is no longer viewing.
//!
//! Declared leaves fail fast with [`TreeError::NotExpandable`] before any
//! fetcher runs; that is the load-bearing difference between
//! `Children::Leaf` and `Children::Unknown`.
//!
//! ## Minimal example
//!
//! ```rust
//! use coppice_loader::{Begin, Loader};
//! use coppice_tree::{TreeIndex, TreeNode, into_roots};
//!
//! let roots = into_roots(vec![TreeNode::lazy(1_u32, ())]);
//! let index = TreeIndex::build(&roots).unwrap();
//! let mut loader = Loader::new();
//!
//! // First request starts the fetch; a concurrent second one does not.
//! assert_eq!(loader.begin(&index, 1).unwrap(), Begin::Started);
//! assert_eq!(loader.begin(&index, 1).unwrap(), Begin::InFlight);
//!
//! // The host's fetch resolves; merge produces a new root vector.
//! let children = vec![TreeNode::leaf(2, ()), TreeNode::leaf(3, ())];
//! let new_roots = loader.complete(&roots, &index, 1, children).unwrap();
//! assert_eq!(new_roots[0].loaded_children().unwrap().len(), 2);
//! // The old snapshot is untouched.
//! assert!(roots[0].loaded_children().is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::{HashMap, HashSet};

use coppice_tree::{Children, NodeRef, TreeError, TreeIndex, TreeNode};

/// Per-node load state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// No load has run, or the last one was cancelled.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Children were fetched and merged.
    Loaded,
    /// The last fetch failed; the node is retryable.
    Error,
}

/// Outcome of [`Loader::begin`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Begin {
    /// The caller should start its fetcher now.
    Started,
    /// A fetch for this key is already in flight; do nothing and wait for it.
    InFlight,
    /// The node's children are already known; no fetch is needed.
    AlreadyLoaded,
}

/// Load-state tracker and merge driver.
///
/// One instance per tree surface. The loader never holds tree data itself;
/// every operation takes the current roots/index so that late resolutions are
/// judged against the tree as it stands now.
#[derive(Clone, Debug, Default)]
pub struct Loader<K> {
    states: HashMap<K, LoadState>,
}

impl<K> Loader<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// New tracker with every key idle.
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Current load state for `key`.
    pub fn state(&self, key: K) -> LoadState {
        self.states.get(&key).copied().unwrap_or_default()
    }

    /// Announce that `key`'s children are wanted.
    ///
    /// Declared leaves are [`TreeError::NotExpandable`] and unknown keys are
    /// [`TreeError::PathBroken`]; in both cases no state changes and the
    /// fetcher must not run. An `Error` state restarts (retry); a `Loading`
    /// state dedups to [`Begin::InFlight`]. A `Loaded` mark for a node whose
    /// children are nonetheless `Unknown` is stale (the tree was replaced)
    /// and also restarts.
    pub fn begin<D>(&mut self, index: &TreeIndex<K, D>, key: K) -> Result<Begin, TreeError<K>> {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        match &node.children {
            Children::Leaf => return Err(TreeError::NotExpandable(key)),
            Children::Loaded(_) => return Ok(Begin::AlreadyLoaded),
            Children::Unknown => {}
        }
        match self.state(key) {
            LoadState::Loading => Ok(Begin::InFlight),
            // The node's children are `Unknown` here, so a `Loaded` mark is
            // stale (the tree was replaced out from under the loader) and the
            // branch must be fetchable again.
            LoadState::Idle | LoadState::Error | LoadState::Loaded => {
                self.states.insert(key, LoadState::Loading);
                Ok(Begin::Started)
            }
        }
    }

    /// Deliver fetched children for `key` and merge them into the tree.
    ///
    /// Returns the new root vector on success and marks the key `Loaded`. A
    /// resolution that arrives after the key was cancelled or removed is
    /// discarded: state resets to idle and the error is
    /// [`TreeError::PathBroken`]. A structurally invalid payload (a fetched
    /// key colliding with an existing one) marks the key `Error` and leaves
    /// the tree untouched. No outcome partially applies a merge.
    pub fn complete<D>(
        &mut self,
        roots: &[NodeRef<K, D>],
        index: &TreeIndex<K, D>,
        key: K,
        children: Vec<TreeNode<K, D>>,
    ) -> Result<Vec<NodeRef<K, D>>, TreeError<K>>
    where
        D: Clone,
    {
        if self.state(key) != LoadState::Loading || !index.contains(key) {
            self.states.remove(&key);
            return Err(TreeError::PathBroken(key));
        }
        match merge_children(roots, index, key, children) {
            Ok(new_roots) => {
                self.states.insert(key, LoadState::Loaded);
                Ok(new_roots)
            }
            Err(err) => {
                self.states.insert(key, LoadState::Error);
                Err(err)
            }
        }
    }

    /// Record a fetch failure for `key`.
    ///
    /// The tree is untouched; the key renders a retry affordance and the next
    /// [`Loader::begin`] starts over.
    pub fn fail(&mut self, key: K) {
        if self.state(key) == LoadState::Loading {
            self.states.insert(key, LoadState::Error);
        }
    }

    /// Cancel any interest in `key` (collapsed or removed while in flight).
    ///
    /// The in-flight work itself is not aborted; its eventual
    /// [`Loader::complete`] is discarded instead.
    pub fn invalidate(&mut self, key: K) {
        self.states.remove(&key);
    }
}

/// Merge `children` under `key`, returning a new root vector.
///
/// The target node is rebuilt with loaded children and its ancestor spine is
/// re-derived from the supplied index and cloned; every untouched branch is
/// shared with the input tree by reference count. Fetched keys (including
/// nested ones) must not collide with existing keys or each other
/// ([`TreeError::DuplicateKey`]). The input tree is never modified.
pub fn merge_children<K, D>(
    roots: &[NodeRef<K, D>],
    index: &TreeIndex<K, D>,
    key: K,
    children: Vec<TreeNode<K, D>>,
) -> Result<Vec<NodeRef<K, D>>, TreeError<K>>
where
    K: Copy + Eq + Hash + Debug,
    D: Clone,
{
    let target = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
    if target.is_leaf() {
        return Err(TreeError::NotExpandable(key));
    }
    validate_fetched_keys(index, &children)?;

    let spine = index.ancestors_of(key)?;

    // Rebuild from the target upward. Ancestors always have loaded children:
    // they are on the path to an indexed node.
    let mut replacement = Rc::new(TreeNode {
        key: target.key,
        data: target.data.clone(),
        flags: target.flags,
        children: Children::Loaded(children.into_iter().map(Rc::new).collect()),
    });
    let mut child_key = key;
    for &ancestor_key in spine[..spine.len() - 1].iter().rev() {
        let ancestor = index
            .lookup(ancestor_key)
            .ok_or(TreeError::PathBroken(ancestor_key))?;
        let Some(siblings) = ancestor.loaded_children() else {
            return Err(TreeError::PathBroken(ancestor_key));
        };
        let mut rebuilt: Vec<NodeRef<K, D>> = siblings.to_vec();
        let slot = rebuilt
            .iter()
            .position(|n| n.key == child_key)
            .ok_or(TreeError::PathBroken(child_key))?;
        rebuilt[slot] = replacement;
        replacement = Rc::new(TreeNode {
            key: ancestor.key,
            data: ancestor.data.clone(),
            flags: ancestor.flags,
            children: Children::Loaded(rebuilt),
        });
        child_key = ancestor_key;
    }

    let mut new_roots = roots.to_vec();
    let slot = new_roots
        .iter()
        .position(|n| n.key == child_key)
        .ok_or(TreeError::PathBroken(child_key))?;
    new_roots[slot] = replacement;
    Ok(new_roots)
}

/// Reject fetched subtrees whose keys collide with the tree or each other.
fn validate_fetched_keys<K, D>(
    index: &TreeIndex<K, D>,
    children: &[TreeNode<K, D>],
) -> Result<(), TreeError<K>>
where
    K: Copy + Eq + Hash + Debug,
{
    let mut seen: HashSet<K> = HashSet::new();
    let mut stack: Vec<&TreeNode<K, D>> = children.iter().collect();
    while let Some(node) = stack.pop() {
        if index.contains(node.key) || !seen.insert(node.key) {
            return Err(TreeError::DuplicateKey(node.key));
        }
        if let Some(grandchildren) = node.loaded_children() {
            stack.extend(grandchildren.iter().map(Rc::as_ref));
        }
    }
    Ok(())
}
