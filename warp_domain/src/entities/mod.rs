// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Executable domain records: [`Pipe`] and its [`ProductDependency`]
//! edges, plus the [`ActionContext`] an action runs against.

pub mod action_context;
pub mod dependency;
pub mod pipe;

pub use action_context::{Action, ActionContext, DependencyValue};
pub use dependency::ProductDependency;
pub use pipe::{Pipe, PipeAction, PipeBuilder, PipeOrigin};
