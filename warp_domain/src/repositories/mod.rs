// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Port traits implemented by the `warp` crate's infrastructure layer.
//! Nothing in this module touches a filesystem; it only describes the
//! shape of the data the domain needs from one.

pub mod build_state_provider;

pub use build_state_provider::BuildStateProvider;
