// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Use-case layer: the [`Workspace`] façade wiring the domain graph to
//! the session cache and subprocess executor.

pub mod workspace;

pub use workspace::{StatusReport, Workspace};
