// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Declarative attributes of a pipe: [`Parameter`], [`ParameterFile`], and
//! [`Product`].

pub mod parameter;
pub mod parameter_file;
pub mod product;

pub use parameter::{Parameter, ParameterType, ParameterValue};
pub use parameter_file::ParameterFile;
pub use product::{paths_nest, Product, ProductReader, ProductValue, ProductWriter, SaveMode};
