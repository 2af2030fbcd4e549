// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node types: flags, the three-state children tag, and the option node itself.

use alloc::rc::Rc;
use alloc::vec::Vec;

/// Reference-counted handle to a tree node.
///
/// The source tree is a `Vec<NodeRef<K, D>>` of roots. Structural updates
/// (for example merging lazily loaded children) rebuild only the spine from
/// the changed node to its root and share every untouched branch through this
/// handle, so holders of an older root vector observe no change.
pub type NodeRef<K, D = ()> = Rc<TreeNode<K, D>>;

bitflags::bitflags! {
    /// Per-node property flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is disabled: it never enters a checked set and ignores
        /// selection, though check propagation still passes through it to its
        /// descendants.
        const DISABLED   = 0b0000_0001;
        /// Node may be highlighted (selected) in a tree view.
        const SELECTABLE = 0b0000_0010;
        /// Node participates in checkbox interaction.
        const CHECKABLE  = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::SELECTABLE | Self::CHECKABLE
    }
}

/// The three-state children tag.
///
/// The distinction between "not yet loaded" and "loaded, empty" is load-bearing
/// for lazy loading: only [`Children::Unknown`] nodes may be handed to the
/// loader, and a [`Children::Leaf`] node must never be, regardless of what a
/// fetcher might claim about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Children<K, D = ()> {
    /// Children exist but have not been fetched yet.
    Unknown,
    /// Children are known, possibly none.
    Loaded(Vec<NodeRef<K, D>>),
    /// Declared leaf: there are no children and there never will be.
    Leaf,
}

/// A single option node.
///
/// `K` is the host-chosen key, unique across the whole tree (enforced when a
/// [`TreeIndex`](crate::TreeIndex) is built). `D` is an opaque host payload
/// such as a display label; the engine carries it but never reads it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode<K, D = ()> {
    /// Tree-wide unique key.
    pub key: K,
    /// Host payload (label, icon, ...).
    pub data: D,
    /// Property flags.
    pub flags: NodeFlags,
    /// Children tag.
    pub children: Children<K, D>,
}

impl<K, D> TreeNode<K, D> {
    /// Create a node with already-known children.
    ///
    /// An empty `children` vector builds a "loaded, empty" node, which is
    /// distinct from a declared [`leaf`](Self::leaf).
    pub fn branch(key: K, data: D, children: Vec<Self>) -> Self {
        Self {
            key,
            data,
            flags: NodeFlags::default(),
            children: Children::Loaded(children.into_iter().map(Rc::new).collect()),
        }
    }

    /// Create a declared leaf. The loader refuses to expand these.
    pub fn leaf(key: K, data: D) -> Self {
        Self {
            key,
            data,
            flags: NodeFlags::default(),
            children: Children::Leaf,
        }
    }

    /// Create a node whose children are not yet loaded.
    pub fn lazy(key: K, data: D) -> Self {
        Self {
            key,
            data,
            flags: NodeFlags::default(),
            children: Children::Unknown,
        }
    }

    /// Replace the node's flags.
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark the node disabled.
    pub fn disabled(mut self) -> Self {
        self.flags |= NodeFlags::DISABLED;
        self
    }

    /// Whether the node is disabled.
    pub fn is_disabled(&self) -> bool {
        self.flags.contains(NodeFlags::DISABLED)
    }

    /// Whether the node is a declared leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.children, Children::Leaf)
    }

    /// Loaded children, or `None` for [`Children::Unknown`] and
    /// [`Children::Leaf`].
    pub fn loaded_children(&self) -> Option<&[NodeRef<K, D>]> {
        match &self.children {
            Children::Loaded(children) => Some(children),
            Children::Unknown | Children::Leaf => None,
        }
    }

    /// Whether the node can terminate a cascader path: a declared leaf or a
    /// node whose loaded children turned out empty.
    pub fn is_terminal(&self) -> bool {
        match &self.children {
            Children::Leaf => true,
            Children::Loaded(children) => children.is_empty(),
            Children::Unknown => false,
        }
    }

    /// Wrap the node in a [`NodeRef`].
    pub fn into_ref(self) -> NodeRef<K, D> {
        Rc::new(self)
    }
}

/// Wrap a vector of nodes into a root set of [`NodeRef`]s.
pub fn into_roots<K, D>(nodes: Vec<TreeNode<K, D>>) -> Vec<NodeRef<K, D>> {
    nodes.into_iter().map(Rc::new).collect()
}
