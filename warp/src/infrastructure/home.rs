// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Session Cache (Home)
//!
//! On-disk layout and session lifecycle:
//!
//! ```text
//! <HOME>/
//!   meta.warp                  # most-recently-loaded session id
//!   static_products/<rel>      # shared across sessions
//!   <session_id>/
//!     timestamp.warp           # decimal seconds, session creation time
//!     products/<rel>           # session-local outputs
//!     <pipe_hash>/
//!       metadata.csv
//!       parameters.yml
//!       source.txt
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use warp_domain::WarpError;

const STATIC_PRODUCTS_DIR: &str = "static_products";
const META_FILE: &str = "meta.warp";
const TIMESTAMP_FILE: &str = "timestamp.warp";

/// The session cache rooted at a home directory. Owns session lifecycle
/// (`resume`/`load`/`create`/`clear_cache`) and path resolution for
/// products.
#[derive(Debug)]
pub struct Home {
    home_path: PathBuf,
    current_session: String,
}

impl Home {
    /// Ensures `home_path` exists and sets the current session, minting
    /// a fresh id from wall-clock time if none is given.
    pub fn new(home_path: impl Into<PathBuf>, session_id: Option<String>) -> Result<Self, WarpError> {
        let home_path = home_path.into();
        fs::create_dir_all(&home_path)?;

        let current_session = session_id.unwrap_or_else(mint_session_id);
        let home = Self {
            home_path,
            current_session,
        };
        home.session_dir()?;
        Ok(home)
    }

    pub fn home_path(&self) -> &Path {
        &self.home_path
    }

    pub fn current_session(&self) -> &str {
        &self.current_session
    }

    /// Creates `HOME/<id>/products/` and the session timestamp marker if
    /// they don't already exist, and returns the session directory.
    /// Idempotent.
    pub fn session_dir(&self) -> Result<PathBuf, WarpError> {
        let dir = self.home_path.join(&self.current_session);
        fs::create_dir_all(dir.join("products"))?;

        let timestamp_path = dir.join(TIMESTAMP_FILE);
        if !timestamp_path.exists() {
            fs::write(&timestamp_path, now_secs().to_string())?;
        }
        Ok(dir)
    }

    /// Returns `HOME/<session_id>/timestamp.warp`'s recorded creation
    /// time, if the session exists and has been initialized.
    pub fn session_timestamp(&self, session_id: &str) -> Result<Option<u64>, WarpError> {
        let path = self.home_path.join(session_id).join(TIMESTAMP_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(contents.trim().parse::<u64>().ok())
    }

    pub fn is_valid(&self, session_id: &str) -> bool {
        self.home_path.join(session_id).is_dir()
    }

    /// Immediate subdirectories of home, excluding `static_products`.
    pub fn list_sessions(&self) -> Result<Vec<String>, WarpError> {
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.home_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != STATIC_PRODUCTS_DIR {
                sessions.push(name);
            }
        }
        sessions.sort();
        Ok(sessions)
    }

    /// Reads `HOME/meta.warp` and switches to that session if present.
    pub fn resume(&mut self) -> Result<(), WarpError> {
        let meta_path = self.home_path.join(META_FILE);
        if let Ok(contents) = fs::read_to_string(&meta_path) {
            let session_id = contents.trim().to_string();
            if !session_id.is_empty() {
                self.current_session = session_id;
                self.session_dir()?;
                tracing::info!(session = %self.current_session, "session resumed");
            }
        }
        Ok(())
    }

    /// Switches to an existing session.
    pub fn load(&mut self, session_id: impl Into<String>) -> Result<(), WarpError> {
        let session_id = session_id.into();
        if !self.is_valid(&session_id) {
            return Err(WarpError::MissingSession(session_id));
        }
        self.current_session = session_id;
        tracing::info!(session = %self.current_session, "session loaded");
        self.write_meta()
    }

    /// Creates a new session; fails if one with this id already exists.
    pub fn create(&mut self, session_id: impl Into<String>) -> Result<(), WarpError> {
        let session_id = session_id.into();
        if self.is_valid(&session_id) {
            return Err(WarpError::Internal(format!("session already exists: {session_id}")));
        }
        self.current_session = session_id;
        self.session_dir()?;
        tracing::info!(session = %self.current_session, "session created");
        self.write_meta()
    }

    /// Wipes the home directory (`clear_all`) or a single session
    /// directory, minting a fresh current session if the cleared one was
    /// current.
    pub fn clear_cache(&mut self, session_id: Option<&str>, clear_all: bool) -> Result<(), WarpError> {
        if clear_all {
            for entry in fs::read_dir(&self.home_path)? {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
            }
            self.current_session = mint_session_id();
            self.session_dir()?;
            tracing::info!(session = %self.current_session, "cache cleared for entire home, new session minted");
            return Ok(());
        }

        let target = session_id.unwrap_or(&self.current_session).to_string();
        let dir = self.home_path.join(&target);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        tracing::info!(session = %target, "session cache cleared");

        if target == self.current_session {
            self.current_session = mint_session_id();
            self.session_dir()?;
        }
        Ok(())
    }

    fn write_meta(&self) -> Result<(), WarpError> {
        fs::write(self.home_path.join(META_FILE), &self.current_session)?;
        Ok(())
    }

    /// Updates `HOME/meta.warp` to the current session, per the build
    /// algorithm's final step.
    pub fn write_current_session_meta(&self) -> Result<(), WarpError> {
        self.write_meta()
    }

    /// Resolves a product's path per the rules of §3: literal for
    /// external products, `static_products/` for static ones, and
    /// `<session>/products/` otherwise.
    pub fn resolve_product_path(&self, relative_path: &Path, external: bool, is_static: bool) -> PathBuf {
        if external {
            relative_path.to_path_buf()
        } else if is_static {
            self.home_path.join(STATIC_PRODUCTS_DIR).join(relative_path)
        } else {
            self.home_path.join(&self.current_session).join("products").join(relative_path)
        }
    }

    pub fn static_products_exists(&self, relative_path: &Path) -> bool {
        self.home_path.join(STATIC_PRODUCTS_DIR).join(relative_path).exists()
    }
}

fn mint_session_id() -> String {
    now_secs().to_string()
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
