// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Secure Command-Line Argument Parsing
//!
//! Security-first validation for every argument that ends up on a
//! filesystem path or inside a config override, applied after clap has
//! already parsed the raw structure.
//!
//! ## Dangerous patterns rejected
//!
//! - `..` — path traversal
//! - `~` — home directory expansion
//! - `$` — variable expansion
//! - Backticks — command substitution
//! - `;` `&` `|` — command chaining
//! - `>` `<` — redirection
//! - Null bytes, newlines, carriage returns

use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_ARG_LENGTH: usize = 1000;
const MAX_PATH_LENGTH: usize = 4096;

const DANGEROUS_PATTERNS: &[&str] = &[
    "..", "~", "$", "`", ";", "&", "|", ">", "<", "\n", "\r", "\0",
];

const PROTECTED_DIRS: &[&str] = &[
    "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("argument too long (max {MAX_ARG_LENGTH} characters): {0}")]
    ArgumentTooLong(String),

    #[error("dangerous pattern `{pattern}` detected in argument: {arg}")]
    DangerousPattern { pattern: String, arg: String },

    #[error("path exceeds maximum length (max {MAX_PATH_LENGTH})")]
    PathTooLong,

    #[error("access to protected system directory denied: {0}")]
    ProtectedDirectory(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid value for {arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error(transparent)]
    Clap(#[from] clap::Error),
}

/// Validates individual CLI argument strings before they reach a pipe
/// name, session id, or config override.
pub struct SecureArgParser;

impl SecureArgParser {
    /// Rejects an argument that is too long or contains a dangerous
    /// pattern.
    pub fn validate_argument(arg: &str) -> Result<(), ParseError> {
        if arg.len() > MAX_ARG_LENGTH {
            return Err(ParseError::ArgumentTooLong(
                arg.chars().take(50).collect::<String>() + "...",
            ));
        }

        for pattern in DANGEROUS_PATTERNS {
            if arg.contains(pattern) {
                return Err(ParseError::DangerousPattern {
                    pattern: pattern.to_string(),
                    arg: arg.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Validates and canonicalizes a path that must already exist
    /// (config override files, a `--home` override).
    pub fn validate_path(path: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(path).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidPath(format!("path too long: {path}")),
            ParseError::DangerousPattern { pattern, .. } => {
                ParseError::InvalidPath(format!("path contains dangerous pattern '{pattern}': {path}"))
            }
            other => other,
        })?;

        let path_obj = Path::new(path);

        let canonical = path_obj.canonicalize().map_err(|e| {
            if !path_obj.exists() {
                ParseError::PathNotFound(path.to_string())
            } else {
                ParseError::InvalidPath(format!("{path}: {e}"))
            }
        })?;

        if canonical.to_string_lossy().len() > MAX_PATH_LENGTH {
            return Err(ParseError::PathTooLong);
        }

        for protected in PROTECTED_DIRS {
            if canonical.starts_with(protected) {
                return Err(ParseError::ProtectedDirectory(canonical.display().to_string()));
            }
        }

        Ok(canonical)
    }

    /// Same as [`Self::validate_path`] but accepts `None`.
    pub fn validate_optional_path(path: Option<&str>) -> Result<Option<PathBuf>, ParseError> {
        match path {
            Some(p) => Self::validate_path(p).map(Some),
            None => Ok(None),
        }
    }

    /// Validates a pipe name or session id: no length/pattern violations,
    /// but no existence check (the name is resolved against the graph or
    /// home directory later, which produces a domain-level error of its
    /// own if the name is unknown).
    pub fn validate_name(arg_name: &str, value: &str) -> Result<(), ParseError> {
        Self::validate_argument(value).map_err(|e| match e {
            ParseError::ArgumentTooLong(_) => ParseError::InvalidValue {
                arg: arg_name.to_string(),
                reason: "too long".to_string(),
            },
            ParseError::DangerousPattern { pattern, .. } => ParseError::InvalidValue {
                arg: arg_name.to_string(),
                reason: format!("contains dangerous pattern '{pattern}'"),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_safe_arguments() {
        assert!(SecureArgParser::validate_argument("build_report").is_ok());
        assert!(SecureArgParser::validate_argument("stage.output").is_ok());
    }

    #[test]
    fn rejects_too_long_arguments() {
        let long_arg = "a".repeat(MAX_ARG_LENGTH + 1);
        assert!(matches!(
            SecureArgParser::validate_argument(&long_arg),
            Err(ParseError::ArgumentTooLong(_))
        ));
    }

    #[test]
    fn detects_dangerous_patterns() {
        let dangerous = ["../etc/passwd", "~/.ssh/id_rsa", "$(whoami)", "`ls`", "a;rm -rf /"];
        for arg in dangerous {
            assert!(
                matches!(
                    SecureArgParser::validate_argument(arg),
                    Err(ParseError::DangerousPattern { .. })
                ),
                "failed to detect dangerous pattern in: {arg}"
            );
        }
    }

    #[test]
    fn validate_name_wraps_dangerous_pattern_as_invalid_value() {
        let result = SecureArgParser::validate_name("target", "a;b");
        assert!(matches!(result, Err(ParseError::InvalidValue { .. })));
    }
}
