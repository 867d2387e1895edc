// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Build State Provider Adapter
//!
//! Implements `warp_domain`'s [`BuildStateProvider`] port against the
//! on-disk session cache: product mtimes come from whichever of the
//! session's `products/`, the shared `static_products/`, or the literal
//! path (for an external product) actually holds the file. A pipe's
//! source mtime is its declared source file's mtime, or the running
//! binary's own mtime for a pipe with none (synthetic source pipes).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use warp_domain::repositories::BuildStateProvider;
use warp_domain::WarpError;

use super::home::Home;

/// Adapts a [`Home`] plus a pipe-name → source-path lookup to the
/// domain's read-only build-state port.
pub struct HomeBuildStateProvider<'a> {
    home: &'a Home,
    source_paths: HashMap<String, Option<String>>,
}

impl<'a> HomeBuildStateProvider<'a> {
    pub fn new(home: &'a Home, source_paths: HashMap<String, Option<String>>) -> Self {
        Self { home, source_paths }
    }
}

fn mtime_of(path: &Path) -> Result<Option<SystemTime>, WarpError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified()?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl<'a> BuildStateProvider for HomeBuildStateProvider<'a> {
    fn product_mtime(&self, _pipe: &str, relative_path: &Path) -> Result<Option<SystemTime>, WarpError> {
        let session_path = self.home.resolve_product_path(relative_path, false, false);
        if let Some(mtime) = mtime_of(&session_path)? {
            return Ok(Some(mtime));
        }

        let static_path = self.home.resolve_product_path(relative_path, false, true);
        if let Some(mtime) = mtime_of(&static_path)? {
            return Ok(Some(mtime));
        }

        mtime_of(relative_path)
    }

    fn source_mtime(&self, pipe: &str) -> Result<Option<SystemTime>, WarpError> {
        match self.source_paths.get(pipe).and_then(|p| p.as_deref()) {
            Some(path) => mtime_of(Path::new(path)),
            None => match std::env::current_exe() {
                Ok(exe) => mtime_of(&exe),
                Err(_) => Ok(None),
            },
        }
    }

    fn static_product_exists(&self, relative_path: &Path) -> Result<bool, WarpError> {
        Ok(self.home.static_products_exists(relative_path))
    }
}
