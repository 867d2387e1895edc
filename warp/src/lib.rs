// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # warp_engine
//!
//! Application, infrastructure, and CLI presentation for the pipeline
//! build engine. [`warp_domain`] holds the pure graph/staleness kernel;
//! this crate supplies everything that kernel has no notion of — disk,
//! subprocesses, config files, and the terminal.
//!
//! ```text
//! presentation::cli   -> dispatches ValidatedCommand onto Workspace
//! application::Workspace -> glues graph + session cache + executor
//! infrastructure       -> Home, config_loader, metadata, product_io,
//!                          process_executor, build_state
//! ```

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::Workspace;
pub use infrastructure::{EngineConfig, Home};
