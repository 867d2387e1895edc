// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Domain services: stateless operations over more than one aggregate
//! instance, or over an aggregate plus a port.

pub mod staleness;

pub use staleness::gap_pipes;
