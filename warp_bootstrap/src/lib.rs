// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! Sits **outside** the domain / application / infrastructure layering
//! that `warp_domain` and `warp` implement, and provides:
//!
//! - **Entry point** — CLI parsing and validation before anything else
//!   runs.
//! - **Signal handling** — graceful shutdown on SIGTERM / SIGINT /
//!   SIGHUP.
//! - **Shutdown coordination** — cancellation tokens and a grace
//!   period for in-flight subprocess builds.
//! - **Platform abstraction** — the one place that reads `HOME` /
//!   `USERPROFILE` directly.
//! - **Exit-code mapping** — Unix `sysexits.h` conventions, derived
//!   from `warp_domain::WarpError::category()`.
//!
//! ## Architecture position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (this crate)              │
//! │  entry point, CLI validation, signals,       │
//! │  shutdown coordination, exit codes           │
//! └───────────────────────┬───────────────────────┘
//!                         ▼
//! ┌─────────────────────────────────────────────┐
//! │                  warp                        │
//! │  application (Workspace) + infrastructure    │
//! │  (Home, config loading, executor) + CLI      │
//! │  presentation                                │
//! └───────────────────────┬───────────────────────┘
//!                         ▼
//! ┌─────────────────────────────────────────────┐
//! │               warp_domain                    │
//! │  Graph, Pipe, staleness — no I/O              │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ParseError, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Parses and validates CLI arguments. The one entry point the `warp`
/// binary's `main` calls before anything else runs.
pub fn bootstrap_cli() -> Result<ValidatedCli, ParseError> {
    cli::parse_and_validate()
}
