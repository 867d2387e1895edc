// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Parameter Value Object
//!
//! A named scalar attached to a pipe. The legal scalar types are fixed:
//! null, bool, integer, real, string, timestamp, byte string, complex.
//! `ParameterType` is inferred from the declared
//! default at construction time and never changes afterward — later
//! assignments (config file, override, or the pipe action itself) are
//! checked against it.

use crate::error::WarpError;
use serde::{Deserialize, Serialize};

/// The legal scalar type tags for a [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Null,
    Bool,
    Integer,
    Real,
    String,
    Timestamp,
    ByteString,
    Complex,
}

impl ParameterType {
    pub fn name(&self) -> &'static str {
        match self {
            ParameterType::Null => "null",
            ParameterType::Bool => "bool",
            ParameterType::Integer => "integer",
            ParameterType::Real => "real",
            ParameterType::String => "string",
            ParameterType::Timestamp => "timestamp",
            ParameterType::ByteString => "byte_string",
            ParameterType::Complex => "complex",
        }
    }
}

/// A scalar value tagged with its [`ParameterType`].
///
/// `Complex` values and `ByteString` values are represented as JSON so
/// that a single serde-based codec handles every variant uniformly,
/// matching the domain's use of `serde_json` as its one configuration
/// serialization format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ParameterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    /// Seconds since the Unix epoch, UTC.
    Timestamp(i64),
    ByteString(Vec<u8>),
    Complex(serde_json::Value),
}

impl ParameterValue {
    pub fn type_of(&self) -> ParameterType {
        match self {
            ParameterValue::Null => ParameterType::Null,
            ParameterValue::Bool(_) => ParameterType::Bool,
            ParameterValue::Integer(_) => ParameterType::Integer,
            ParameterValue::Real(_) => ParameterType::Real,
            ParameterValue::String(_) => ParameterType::String,
            ParameterValue::Timestamp(_) => ParameterType::Timestamp,
            ParameterValue::ByteString(_) => ParameterType::ByteString,
            ParameterValue::Complex(_) => ParameterType::Complex,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            ParameterValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// A named scalar attached to a pipe.
///
/// `value` is mutated in three ways over a pipe's lifecycle: by config
/// files at build start, by caller-supplied overrides, and by the pipe
/// action itself (ephemeral unless written back through a product). Only
/// the first two are subject to type validation — the action runs with
/// full trust, matching the rest of the domain's treatment of in-process
/// code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: ParameterValue,
    declared_type: ParameterType,
}

impl Parameter {
    /// Creates a parameter whose type is inferred from `default`.
    pub fn new(name: impl Into<String>, default: ParameterValue) -> Self {
        let declared_type = default.type_of();
        Self {
            name: name.into(),
            value: default,
            declared_type,
        }
    }

    /// Creates a string-typed parameter with no declared default: a
    /// parameter with no explicit default value defaults to an empty
    /// string rather than null.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterValue::String(String::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    pub fn declared_type(&self) -> ParameterType {
        self.declared_type
    }

    /// Sets the value from trusted code (the pipe action itself). No
    /// type check — the action owns this value completely.
    pub fn set_untyped(&mut self, value: ParameterValue) {
        self.value = value;
    }

    /// Sets the value from an external source (config file or caller
    /// override), rejecting a type mismatch instead of silently coercing
    /// or overwriting the declared type.
    pub fn set_checked(&mut self, value: ParameterValue) -> Result<(), WarpError> {
        if value.type_of() != self.declared_type {
            return Err(WarpError::InvalidParameterType {
                parameter: self.name.clone(),
                expected: self.declared_type.name().to_string(),
                actual: value.type_of().name().to_string(),
            });
        }
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_type_from_default() {
        let p = Parameter::new("x", ParameterValue::Integer(7));
        assert_eq!(p.declared_type(), ParameterType::Integer);
        assert_eq!(p.value().as_integer(), Some(7));
    }

    #[test]
    fn rejects_type_mismatch_on_checked_set() {
        let mut p = Parameter::new("x", ParameterValue::Integer(7));
        let err = p.set_checked(ParameterValue::String("nope".into())).unwrap_err();
        assert!(matches!(err, WarpError::InvalidParameterType { .. }));
        assert_eq!(p.value().as_integer(), Some(7));
    }

    #[test]
    fn accepts_matching_type_on_checked_set() {
        let mut p = Parameter::new("x", ParameterValue::Integer(7));
        p.set_checked(ParameterValue::Integer(42)).unwrap();
        assert_eq!(p.value().as_integer(), Some(42));
    }

    #[test]
    fn untyped_set_bypasses_validation() {
        let mut p = Parameter::new("x", ParameterValue::Integer(7));
        p.set_untyped(ParameterValue::String("anything".into()));
        assert_eq!(p.value().as_str(), Some("anything"));
    }

    #[test]
    fn default_string_parameter_has_no_default_value() {
        let p = Parameter::string("name");
        assert_eq!(p.declared_type(), ParameterType::String);
    }
}
