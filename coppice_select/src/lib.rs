// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Select: per-surface selection facades over the option-tree engine.
//!
//! The lower crates ([`coppice_tree`], [`coppice_check`], [`coppice_loader`])
//! are pure functions and host-driven state machines. This crate composes
//! them into the stateful controllers a widget actually holds:
//!
//! - [`Cascader`] — single-path column navigation with click or hover
//!   expansion and an explicit commit on leaves.
//! - [`MultiCascader`] — a set of independently committed leaf paths, no
//!   check propagation.
//! - [`TreeView`] — expand/collapse tracking, highlight selection, and
//!   tri-state checkboxes.
//! - [`TreeCombo`] — a checkable dropdown: breadcrumbs, display tags, and
//!   search over the same tree state.
//!
//! Every facade follows the same shape: interaction methods take the current
//! [`TreeIndex`](coppice_tree::TreeIndex) and return an event describing what
//! changed (including the changed keys the rendering layer needs for minimal
//! re-render), or [`TreeError`](coppice_tree::TreeError) when the interaction
//! references a node that no longer exists. Lazy children surface as a
//! `NeedsLoad` event; the host runs its fetcher and feeds the result back
//! through the facade's `complete_load`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod cascader;
mod combo;
mod tree_view;

pub use cascader::{Cascader, CascaderEvent, ExpandTrigger, MultiCascader, MultiCommit};
pub use combo::{TagStrategy, TreeCombo};
pub use tree_view::{SelectionPolicy, TreeEvent, TreeView};
