// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Action Context
//!
//! The surface a pipe's action closure runs against: resolved dependency
//! values keyed by the keyword the author chose, parameters keyed by
//! name, and a slot for each owned product the action is expected to
//! fill in. Loading dependency values from disk and persisting produced
//! outputs to disk both happen outside this type, in the executor —
//! `ActionContext` only holds values already in memory.

use std::collections::HashMap;

use crate::error::WarpError;
use crate::value_objects::{Parameter, ParameterValue, ProductValue};

/// A dependency value bound into the context: either the literal product
/// path of a source-pipe dependency, or a deserialized/in-memory payload.
#[derive(Debug, Clone)]
pub enum DependencyValue {
    /// The dependency's producer is a source pipe; the action receives
    /// the product path itself, not a deserialized value.
    SourcePath(String),
    Value(ProductValue),
}

impl DependencyValue {
    pub fn as_source_path(&self) -> Option<&str> {
        match self {
            DependencyValue::SourcePath(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&ProductValue> {
        match self {
            DependencyValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ActionContext {
    parameters: HashMap<String, Parameter>,
    inputs: HashMap<String, DependencyValue>,
    outputs: HashMap<String, ProductValue>,
}

impl ActionContext {
    pub fn new(parameters: HashMap<String, Parameter>, inputs: HashMap<String, DependencyValue>) -> Self {
        Self {
            parameters,
            inputs,
            outputs: HashMap::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name).map(Parameter::value)
    }

    /// Pipe actions set parameter values without type validation — the
    /// action owns the value completely once running.
    pub fn set_param(&mut self, name: &str, value: ParameterValue) {
        if let Some(p) = self.parameters.get_mut(name) {
            p.set_untyped(value);
        }
    }

    pub fn input(&self, key: &str) -> Option<&DependencyValue> {
        self.inputs.get(key)
    }

    pub fn set_output(&mut self, product_relative_path: impl Into<String>, value: ProductValue) {
        self.outputs.insert(product_relative_path.into(), value);
    }

    pub fn output(&self, product_relative_path: &str) -> Option<&ProductValue> {
        self.outputs.get(product_relative_path)
    }

    pub fn into_outputs(self) -> HashMap<String, ProductValue> {
        self.outputs
    }

    pub fn parameters(&self) -> &HashMap<String, Parameter> {
        &self.parameters
    }
}

/// A pipe's executable action: read inputs and parameters, write outputs.
pub type Action = std::sync::Arc<dyn Fn(&mut ActionContext) -> Result<(), WarpError> + Send + Sync>;
