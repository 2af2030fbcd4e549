// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Tree: the keyed option-tree model shared by the selection engine.
//!
//! This crate owns the data model that the rest of the Coppice crates operate
//! on: a rooted, ordered, labeled tree of options whose nodes can be disabled,
//! lazily populated, and addressed by a host-chosen key type.
//!
//! The core pieces are:
//!
//! - [`TreeNode`] / [`NodeRef`]: a single option node and its reference-counted
//!   handle. Children are a three-state tag ([`Children`]): not yet loaded,
//!   loaded (possibly empty), or a declared leaf that can never be expanded.
//! - [`TreeIndex`]: a derived, read-only key→node and key→parent view built by
//!   a single depth-first pass. Construction fails on duplicate keys; lookups
//!   and parent queries are O(1).
//! - [`columns_for`] / [`resolve_path`]: derivation of the sibling columns
//!   implied by an active path (as shown by a cascading selector) and
//!   resolution of a stored path back to node handles, with stale paths
//!   reported as [`TreeError::PathBroken`] rather than panicking.
//! - [`filter_tree`]: a single-pass filter traversal that keeps the ancestor
//!   chain of every match visible.
//!
//! Trees are never mutated in place. The root set is a `Vec<NodeRef<K, D>>`,
//! and every structural update elsewhere in Coppice produces a new root vector
//! whose untouched branches are shared by reference count. Callers holding the
//! old roots see no change.
//!
//! The node key `K` is any small copyable handle (`Copy + Eq + Hash`), for
//! example a `u64` id or an interned-string symbol. `D` is an opaque host
//! payload (label, icon); the engine never interprets it.
//!
//! ## Minimal example
//!
//! ```rust
//! use coppice_tree::{TreeIndex, TreeNode, into_roots, resolve_path};
//!
//! let roots = into_roots(vec![TreeNode::branch(
//!     1_u32,
//!     (),
//!     vec![TreeNode::leaf(2, ()), TreeNode::leaf(3, ())],
//! )]);
//!
//! let index = TreeIndex::build(&roots).unwrap();
//! assert_eq!(index.parent_of(2), Some(1));
//!
//! let path = index.ancestors_of(3).unwrap();
//! assert_eq!(path.as_slice(), &[1, 3]);
//!
//! let nodes = resolve_path(&index, &path).unwrap();
//! assert_eq!(nodes.len(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod index;
mod node;
mod path;
mod search;

pub use error::TreeError;
pub use index::TreeIndex;
pub use node::{Children, NodeFlags, NodeRef, TreeNode, into_roots};
pub use path::{Columns, Path, columns_for, resolve_path};
pub use search::{DescendantPolicy, FilterOutcome, filter_tree};
