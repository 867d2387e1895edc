// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Config File Loading
//!
//! A config file binds a flat set of parameter names to scalar values
//! for one pipe. Only YAML (`.yml`/`.yaml`) and JSON (`.json`) are
//! accepted; the extension picks the parser. Anything else — a nested
//! mapping, a sequence, a top-level scalar — is rejected as an
//! [`WarpError::InvalidParameterType`].

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use warp_domain::value_objects::ParameterValue;
use warp_domain::WarpError;

const HOME_DIR_DEFAULT: &str = ".warp";
const WARP_PORT_DEFAULT: u16 = 8050;

/// A flat mapping of parameter name to scalar value, as read from a
/// config file on disk.
pub type FlatConfig = BTreeMap<String, ParameterValue>;

/// Loads a config file into a [`FlatConfig`], dispatching on extension.
pub fn load(path: &Path) -> Result<FlatConfig, WarpError> {
    let contents = std::fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let json: JsonValue = match extension {
        "yml" | "yaml" => serde_yaml::from_str(&contents).map_err(|e| WarpError::Serialization(e.to_string()))?,
        "json" => serde_json::from_str(&contents)?,
        other => {
            return Err(WarpError::InvalidParameterType {
                parameter: path.display().to_string(),
                expected: "a .yml, .yaml, or .json config file".to_string(),
                actual: format!(".{other}"),
            })
        }
    };

    let JsonValue::Object(map) = json else {
        return Err(WarpError::InvalidParameterType {
            parameter: path.display().to_string(),
            expected: "a flat mapping of parameter name to scalar".to_string(),
            actual: describe_json_shape(&json).to_string(),
        });
    };

    map.into_iter().map(|(key, value)| Ok((key.clone(), scalar_from_json(&key, value)?))).collect()
}

fn scalar_from_json(key: &str, value: JsonValue) -> Result<ParameterValue, WarpError> {
    match value {
        JsonValue::Null => Ok(ParameterValue::Null),
        JsonValue::Bool(b) => Ok(ParameterValue::Bool(b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParameterValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(ParameterValue::Real(f))
            } else {
                Err(WarpError::InvalidParameterType {
                    parameter: key.to_string(),
                    expected: "integer or real".to_string(),
                    actual: n.to_string(),
                })
            }
        }
        JsonValue::String(s) => Ok(ParameterValue::String(s)),
        other => Err(WarpError::InvalidParameterType {
            parameter: key.to_string(),
            expected: "a scalar (null, bool, integer, real, or string)".to_string(),
            actual: describe_json_shape(&other).to_string(),
        }),
    }
}

fn describe_json_shape(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "a nested mapping",
    }
}

/// Process-wide settings read once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub home_dir: PathBuf,
    pub port: u16,
    pub hostname: Option<String>,
}

impl EngineConfig {
    /// Reads `WARP_HOME_DIR` (must be an existing absolute directory if
    /// set), `HOME_DIR_DEFAULT` (overrides the `.warp` home directory
    /// name), `WARP_PORT`, and `HOSTNAME`, defaulting home to `./.warp`
    /// when unset.
    pub fn from_env() -> Result<Self, WarpError> {
        let home_dir_name = env::var("HOME_DIR_DEFAULT").unwrap_or_else(|_| HOME_DIR_DEFAULT.to_string());

        let home_dir = match env::var_os("WARP_HOME_DIR") {
            Some(raw) => {
                let path = PathBuf::from(raw);
                if !path.is_absolute() {
                    return Err(WarpError::MissingHome(format!(
                        "WARP_HOME_DIR must be an absolute path, got {}",
                        path.display()
                    )));
                }
                if !path.is_dir() {
                    return Err(WarpError::MissingHome(format!(
                        "WARP_HOME_DIR parent directory does not exist: {}",
                        path.display()
                    )));
                }
                path.join(&home_dir_name)
            }
            None => PathBuf::from(&home_dir_name),
        };

        let port = match env::var("WARP_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| WarpError::InvalidParameterType {
                    parameter: "WARP_PORT".to_string(),
                    expected: "an integer port number".to_string(),
                    actual: raw,
                })?,
            Err(_) => WARP_PORT_DEFAULT,
        };

        let hostname = env::var("HOSTNAME").ok();

        Ok(Self { home_dir, port, hostname })
    }
}
