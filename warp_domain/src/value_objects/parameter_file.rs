// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Parameter File Value Object
//!
//! A reference to an external key/value document on disk, attached to a
//! pipe. Immutable after pipe definition; the uniqueness invariant
//! (a non-`multi_use` path may be attached to at most one pipe across the
//! graph) is enforced by [`crate::aggregates::graph::Graph::add`], not
//! here — this type only carries the declaration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFile {
    path: PathBuf,
    multi_use: bool,
}

impl ParameterFile {
    pub fn new(path: impl Into<PathBuf>, multi_use: bool) -> Self {
        Self {
            path: path.into(),
            multi_use,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn multi_use(&self) -> bool {
        self.multi_use
    }
}
