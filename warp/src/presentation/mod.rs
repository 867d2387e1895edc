// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! CLI presentation: dispatches a validated command onto [`Workspace`]
//! and formats its results for a terminal.
//!
//! [`Workspace`]: crate::application::Workspace

pub mod cli;
