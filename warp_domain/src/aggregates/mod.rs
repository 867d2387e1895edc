// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The [`graph::Graph`] aggregate: the multi-DAG of pipes and the
//! invariants that hold across the whole collection rather than any
//! single pipe.

pub mod graph;

pub use graph::{AddScript, Graph, GraphScript};
