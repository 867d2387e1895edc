// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Product Dependency
//!
//! A pipe's declared dependency on another pipe's product, labeled with
//! the keyword the action code uses to refer to it. `source_pipe` starts
//! unresolved and is filled in by [`crate::aggregates::graph::Graph::add`]
//! once the producing pipe is known — either an existing node, or a
//! freshly synthesized source pipe.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProductDependency {
    key: String,
    product_path: PathBuf,
    source_pipe: Option<String>,
}

impl ProductDependency {
    pub fn new(key: impl Into<String>, product_path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            product_path: product_path.into(),
            source_pipe: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn product_path(&self) -> &Path {
        &self.product_path
    }

    pub fn source_pipe(&self) -> Option<&str> {
        self.source_pipe.as_deref()
    }

    pub fn resolve(&mut self, producer: impl Into<String>) {
        self.source_pipe = Some(producer.into());
    }

    pub fn is_resolved(&self) -> bool {
        self.source_pipe.is_some()
    }
}
