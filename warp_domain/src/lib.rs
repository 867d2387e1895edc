// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # warp-domain
//!
//! The pure, I/O-free core of the build engine: pipes, the graph that
//! connects them, and the staleness rules that decide what needs to
//! run. Nothing in this crate touches a filesystem, a clock, or a
//! subprocess directly — those concerns live behind the
//! [`repositories::BuildStateProvider`] port and are fulfilled by the
//! `warp` crate's infrastructure layer.
//!
//! Module layout follows a conventional DDD split:
//!
//! - [`value_objects`] — immutable data with no identity: parameters,
//!   parameter files, products.
//! - [`entities`] — data with identity and behavior: pipes, their
//!   dependency edges, and the context an action runs against.
//! - [`aggregates`] — the [`aggregates::Graph`], the only entry point
//!   through which pipes are connected and topology invariants are
//!   enforced.
//! - [`services`] — stateless domain logic spanning a graph and a port,
//!   namely staleness analysis.
//! - [`repositories`] — port traits implemented outside this crate.
//! - [`error`] — the shared [`error::WarpError`] type.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::WarpError;
