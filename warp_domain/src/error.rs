// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error enum for the pipeline graph, the staleness
//! analyzer, and the value objects that back them. Infrastructure-level
//! failures (I/O, subprocess, serialization) are wrapped here too so that
//! the application layer can propagate one error type end to end with `?`.
//!
//! `category()` and `is_recoverable()` exist because the CLI's exit-code
//! mapper and the executor's retry-free abort logic both need to classify
//! a failure without re-deriving a `match` over every variant.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum WarpError {
    #[error("duplicate pipe name: {0}")]
    DuplicatePipe(String),

    #[error("product path {new} nests with existing product {existing}")]
    NestedProduct { new: String, existing: String },

    #[error("config path {0} is already bound to another pipe and is not multi_use")]
    DuplicateConfig(String),

    #[error("pipe {pipe} has unresolved dependency on product {product}")]
    UnresolvedDependency { pipe: String, product: String },

    #[error("unknown pipe: {0}")]
    UnknownPipe(String),

    #[error("ambiguous pipe name {query}: matches {matches:?}")]
    AmbiguousName { query: String, matches: Vec<String> },

    #[error("no producer found for dependency {dependency} of pipe {pipe}")]
    MissingProducer { pipe: String, dependency: String },

    #[error("invalid parameter type for {parameter}: expected {expected}, got {actual}")]
    InvalidParameterType {
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("pipe action failed for {pipe}: {message}")]
    PipeActionFailure { pipe: String, message: String },

    #[error("pipe {pipe} promised product {product} but it was not produced")]
    ProductNotProduced { pipe: String, product: String },

    #[error("pipe {0} has stale ancestors; run backfill before building")]
    StaleAncestors(String),

    #[error("chronology violation: {descendant} is older than ancestor {ancestor}")]
    ChronologyViolation { descendant: String, ancestor: String },

    #[error("home directory not found or could not be created: {0}")]
    MissingHome(String),

    #[error("session does not exist: {0}")]
    MissingSession(String),

    #[error("duplicate parameter key {0} across config files")]
    DuplicateParameterKey(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("subprocess failure: {0}")]
    Subprocess(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WarpError {
    /// Broad category used for logging and exit-code mapping.
    pub fn category(&self) -> &'static str {
        match self {
            WarpError::DuplicatePipe(_)
            | WarpError::NestedProduct { .. }
            | WarpError::DuplicateConfig(_)
            | WarpError::UnresolvedDependency { .. } => "graph_construction",
            WarpError::UnknownPipe(_) | WarpError::AmbiguousName { .. } => "name_resolution",
            WarpError::MissingProducer { .. } => "dependency_load",
            WarpError::InvalidParameterType { .. } | WarpError::DuplicateParameterKey(_) => "configuration",
            WarpError::PipeActionFailure { .. } => "pipe_action",
            WarpError::ProductNotProduced { .. } => "postcondition",
            WarpError::StaleAncestors(_) | WarpError::ChronologyViolation { .. } => "staleness",
            WarpError::MissingHome(_) | WarpError::MissingSession(_) => "session",
            WarpError::Io(_) => "io",
            WarpError::Serialization(_) => "serialization",
            WarpError::Subprocess(_) => "subprocess",
            WarpError::Internal(_) => "internal",
        }
    }

    /// Whether the caller can reasonably retry without changing anything.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WarpError::Io(_) | WarpError::Subprocess(_))
    }
}

impl From<std::io::Error> for WarpError {
    fn from(err: std::io::Error) -> Self {
        WarpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WarpError {
    fn from(err: serde_json::Error) -> Self {
        WarpError::Serialization(err.to_string())
    }
}
