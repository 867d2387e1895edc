// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Build State Provider Port
//!
//! The staleness analyzer needs to compare mtimes without knowing how or
//! where they are stored — that belongs to the session cache in the
//! `warp` crate's infrastructure layer. `BuildStateProvider` is the seam:
//! the domain depends on this trait, infrastructure implements it.

use std::path::Path;
use std::time::SystemTime;

use crate::error::WarpError;

/// Read-only access to on-disk build state, scoped to one session.
pub trait BuildStateProvider {
    /// The last-modified time of `pipe`'s declared product at
    /// `relative_path`, or `None` if it has never been produced.
    fn product_mtime(&self, pipe: &str, relative_path: &Path) -> Result<Option<SystemTime>, WarpError>;

    /// The last-modified time of `pipe`'s source (its backing file, or
    /// the engine binary itself for a synthetic pipe), used to detect
    /// that a pipe's definition changed since its products were built.
    fn source_mtime(&self, pipe: &str) -> Result<Option<SystemTime>, WarpError>;

    /// Whether a static product already exists in the shared,
    /// session-independent static-products store.
    fn static_product_exists(&self, relative_path: &Path) -> Result<bool, WarpError>;
}
