// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path resolution: sibling-column derivation and path→node lookup.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use smallvec::SmallVec;

use crate::error::TreeError;
use crate::index::TreeIndex;
use crate::node::{Children, NodeRef};

/// Ordered root→node key sequence describing one location in the tree.
///
/// Paths are short in practice; the inline capacity avoids heap traffic for
/// the common case.
pub type Path<K> = SmallVec<[K; 8]>;

/// The sibling columns implied by an active path, as shown by a cascading
/// selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Columns<K, D = ()> {
    /// Column 0 is the root siblings; column `i` is the children of the node
    /// at `active_path[i - 1]`. A column is empty (not absent) when that
    /// node's children are not yet loaded.
    pub columns: Vec<Vec<NodeRef<K, D>>>,
    /// Node on the active path whose children are [`Children::Unknown`], if
    /// any. The caller should hand this key to the loader; its column stays
    /// empty until the merge lands.
    pub pending_load: Option<K>,
}

/// Derive the sibling columns for `active_path`.
///
/// Unloaded children produce an empty column plus a [`Columns::pending_load`]
/// request rather than an error; a declared leaf ends the column list. The
/// whole path is validated first, so any key that is no longer in the index
/// (or no longer linked to its predecessor) is [`TreeError::PathBroken`] even
/// when an earlier node would have ended the columns — the caller drops the
/// stale path.
pub fn columns_for<K, D>(
    index: &TreeIndex<K, D>,
    roots: &[NodeRef<K, D>],
    active_path: &[K],
) -> Result<Columns<K, D>, TreeError<K>>
where
    K: Copy + Eq + Hash + Debug,
{
    let nodes = resolve_path(index, active_path)?;

    let mut columns = Vec::with_capacity(active_path.len() + 1);
    columns.push(roots.to_vec());
    let mut pending_load = None;

    for node in &nodes {
        match &node.children {
            Children::Loaded(children) => columns.push(children.clone()),
            Children::Unknown => {
                if pending_load.is_none() {
                    pending_load = Some(node.key);
                }
                columns.push(Vec::new());
            }
            Children::Leaf => break,
        }
    }

    Ok(Columns {
        columns,
        pending_load,
    })
}

/// Resolve a stored path back to its node handles.
///
/// Verifies not just that every key still exists but that each consecutive
/// pair is still parent→child and the first key is still a root; a tree
/// mutated out from under a stale path fails with [`TreeError::PathBroken`]
/// instead of silently resolving to the wrong nodes.
pub fn resolve_path<K, D>(
    index: &TreeIndex<K, D>,
    path: &[K],
) -> Result<Vec<NodeRef<K, D>>, TreeError<K>>
where
    K: Copy + Eq + Hash + Debug,
{
    let mut nodes = Vec::with_capacity(path.len());
    let mut expected_parent: Option<K> = None;
    for &key in path {
        let node = index.lookup(key).ok_or(TreeError::PathBroken(key))?;
        if index.parent_of(key) != expected_parent {
            return Err(TreeError::PathBroken(key));
        }
        nodes.push(node.clone());
        expected_parent = Some(key);
    }
    Ok(nodes)
}
