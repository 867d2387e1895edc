// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Product Value Object
//!
//! A declared input or output artifact of a pipe. `Product` carries only
//! declarative attributes — path resolution, the custom reader/writer
//! pair (when present), and the producing pipe once
//! the graph has resolved it. The in-memory payload type is
//! [`ProductValue`]; actual filesystem I/O happens in the `warp` crate's
//! infrastructure layer, which is the only place a `ProductWriter` /
//! `ProductReader` closure is ever invoked.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::WarpError;

/// The in-memory payload carried by a product between pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductValue {
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

impl ProductValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ProductValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProductValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// A custom writer: `(path, value) -> Result<(), WarpError>`. Responsible
/// for creating a file or directory at `path`; existence is checked by
/// the executor after the pipe action returns.
pub type ProductWriter = Arc<dyn Fn(&Path, &ProductValue) -> Result<(), WarpError> + Send + Sync>;

/// A custom reader: `path -> Result<ProductValue, WarpError>`.
pub type ProductReader = Arc<dyn Fn(&Path) -> Result<ProductValue, WarpError> + Send + Sync>;

/// Whether and how a product's value is persisted between builds.
#[derive(Clone)]
pub enum SaveMode {
    /// Persisted with the engine's default opaque binary codec.
    Default,
    /// Persisted with a caller-supplied writer/reader pair.
    Custom { writer: ProductWriter, reader: ProductReader },
    /// Held in working memory only; never written to disk.
    Disabled,
}

impl SaveMode {
    pub fn is_saved(&self) -> bool {
        !matches!(self, SaveMode::Disabled)
    }
}

impl fmt::Debug for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveMode::Default => write!(f, "SaveMode::Default"),
            SaveMode::Custom { .. } => write!(f, "SaveMode::Custom(..)"),
            SaveMode::Disabled => write!(f, "SaveMode::Disabled"),
        }
    }
}

/// A declared input or output artifact of a pipe.
///
/// `relative_path` is the author's declared location; the concrete
/// on-disk path is resolved by the session cache (`warp::infrastructure
/// ::home`) according to the `static`/`external` flags, never here —
/// this type has no notion of a home directory.
#[derive(Clone, Debug)]
pub struct Product {
    relative_path: PathBuf,
    is_static: bool,
    is_external: bool,
    save: SaveMode,
    source_pipe: Option<String>,
}

impl Product {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_static: false,
            is_external: false,
            save: SaveMode::Default,
            source_pipe: None,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_external(mut self, is_external: bool) -> Self {
        self.is_external = is_external;
        self
    }

    pub fn with_save(mut self, save: SaveMode) -> Self {
        self.save = save;
        self
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_external(&self) -> bool {
        self.is_external
    }

    pub fn save_mode(&self) -> &SaveMode {
        &self.save
    }

    pub fn is_saved(&self) -> bool {
        self.save.is_saved()
    }

    pub fn source_pipe(&self) -> Option<&str> {
        self.source_pipe.as_deref()
    }

    pub fn set_source_pipe(&mut self, pipe_name: impl Into<String>) {
        self.source_pipe = Some(pipe_name.into());
    }
}

/// Returns true if `a` and `b` nest at path-component granularity in
/// either direction (one is a strict prefix of the other).
pub fn paths_nest(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let a_components: Vec<_> = a.components().collect();
    let b_components: Vec<_> = b.components().collect();
    let (shorter, longer) = if a_components.len() <= b_components.len() {
        (&a_components, &b_components)
    } else {
        (&b_components, &a_components)
    };
    !shorter.is_empty() && longer.starts_with(shorter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_nested_paths_either_direction() {
        assert!(paths_nest(Path::new("data/x"), Path::new("data/x/y")));
        assert!(paths_nest(Path::new("data/x/y"), Path::new("data/x")));
        assert!(paths_nest(Path::new("data/x"), Path::new("data/x")));
    }

    #[test]
    fn sibling_paths_do_not_nest() {
        assert!(!paths_nest(Path::new("data/x"), Path::new("data/y")));
        assert!(!paths_nest(Path::new("data/xy"), Path::new("data/x")));
    }

    #[test]
    fn product_defaults_are_session_local_and_saved() {
        let p = Product::new("out/a.bin");
        assert!(!p.is_static());
        assert!(!p.is_external());
        assert!(p.is_saved());
        assert!(p.source_pipe().is_none());
    }
}
