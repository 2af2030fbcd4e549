// Copyright 2025 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors shared across the Coppice crates.

/// Errors raised by tree construction and path/selection operations.
///
/// All of these are reported synchronously. Fetch failures during lazy loading
/// are not represented here; they surface as the `Error` load state on the
/// loader, which is retryable and never corrupts the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError<K> {
    /// A key appeared more than once while building a [`TreeIndex`].
    ///
    /// Fatal to that tree: the index is not built and the caller must fix the
    /// source data.
    ///
    /// [`TreeIndex`]: crate::TreeIndex
    #[error("duplicate key in tree: {0:?}")]
    DuplicateKey(K),
    /// A path or selection operation referenced a key that is no longer in the
    /// tree, or a path whose links no longer hold.
    ///
    /// Recoverable: the caller should drop the stale path or selection rather
    /// than treat this as fatal.
    #[error("path references a key not in the tree: {0:?}")]
    PathBroken(K),
    /// A load was requested for a declared leaf.
    ///
    /// Programmer error in the host; the fetcher is never invoked.
    #[error("load requested on a declared leaf: {0:?}")]
    NotExpandable(K),
}

impl<K> TreeError<K> {
    /// The key the error refers to.
    pub fn key(&self) -> &K {
        match self {
            Self::DuplicateKey(key) | Self::PathBroken(key) | Self::NotExpandable(key) => key,
        }
    }
}
