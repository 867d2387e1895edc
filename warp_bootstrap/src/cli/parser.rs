// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap. Defines the raw CLI
//! structure; security validation happens afterward in
//! [`crate::cli::validator`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI structure for the `warp` binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "warp")]
#[command(about = concat!("WARP pipeline build engine v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Home directory override (defaults to `WARP_HOME_DIR`/`HOME_DIR_DEFAULT`)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Link the static products of other sessions into this one when
    /// resolving staleness and backfills. Use with caution: it can
    /// produce surprising results across sessions with divergent
    /// histories.
    #[arg(long, global = true)]
    pub link_static_products: bool,
}

/// A single `key=value` parameter override, applied on top of a pipe's
/// config files.
fn parse_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected key=value, got `{raw}`")),
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a single pipe directly, bypassing staleness analysis
    Build {
        /// Pipe name (fuzzily resolved)
        target: String,

        /// Parameter overrides as key=value pairs, repeatable
        #[arg(short = 'o', long = "override", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
    },

    /// Compute the stale trajectory for a target and rebuild it
    Backfill {
        /// Pipe name (fuzzily resolved)
        target: String,

        /// Parameter overrides as key=value pairs, repeatable; overridden
        /// pipes are always rebuilt
        #[arg(short = 'o', long = "override", value_parser = parse_override)]
        overrides: Vec<(String, String)>,

        /// Rebuild the full lineage, ignoring staleness
        #[arg(long)]
        rebuild_all: bool,

        /// Suppress static-product pruning for this backfill, even if
        /// linking static products is enabled
        #[arg(long)]
        rebuild_static_products: bool,
    },

    /// Print lineage, staleness, and last-build metadata for a pipe
    Status {
        /// Pipe name (fuzzily resolved)
        target: String,
    },

    /// Resume the session recorded in `HOME/meta.warp`
    Resume,

    /// Switch to an existing session
    LoadSession {
        /// Session identifier
        session_id: String,
    },

    /// Create a new session
    CreateSession {
        /// Session identifier; minted from the current time if omitted
        session_id: Option<String>,
    },

    /// Wipe a session's cache
    ClearCache {
        /// Session identifier; defaults to the current session
        session_id: Option<String>,

        /// Wipe the entire home directory and start fresh
        #[arg(long)]
        all: bool,
    },

    /// Print the current parameter values of a pipe
    Parameters {
        /// Pipe name (fuzzily resolved)
        pipe: String,
    },

    /// Print the declared products of a pipe
    Products {
        /// Pipe name (fuzzily resolved)
        pipe: String,
    },

    /// Print full detail of a single pipe
    ViewPipe {
        /// Pipe name (fuzzily resolved)
        pipe: String,
    },

    /// List every pipe name in the graph
    Pipes,

    /// List every known session
    Sessions,

    /// Hidden re-entry point: build exactly one pipe in an existing
    /// session. Invoked by the executor's child process, never by a user.
    #[command(hide = true, name = "__run-child")]
    RunChild {
        #[arg(long)]
        session_id: String,

        #[arg(long)]
        target: String,

        /// Parameter overrides forwarded by the parent process
        #[arg(short = 'o', long = "override", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
    },
}

/// Parses `std::env::args()` into a [`Cli`].
pub fn parse_cli() -> Cli {
    Cli::parse()
}
