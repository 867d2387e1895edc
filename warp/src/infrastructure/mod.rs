// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Concrete implementations of the domain's ports, plus the session
//! cache, config loading, and subprocess re-entry the domain has no
//! notion of: [`home`], [`build_state`], [`config_loader`],
//! [`metadata`], [`product_io`], [`process_executor`].

pub mod build_state;
pub mod config_loader;
pub mod home;
pub mod metadata;
pub mod process_executor;
pub mod product_io;

pub use config_loader::{EngineConfig, FlatConfig};
pub use home::Home;
