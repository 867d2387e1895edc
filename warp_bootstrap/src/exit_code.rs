// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! - **0**: success
//! - **1**: general error
//! - **64-78**: specific error conditions (BSD sysexits.h)
//! - **128+N**: fatal signal N (e.g. 130 = SIGINT)

use std::fmt;
use warp_domain::WarpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,

    /// General error.
    Error = 1,

    /// Invalid arguments, missing required arguments, unknown flags.
    UsageError = 64,

    /// Malformed config file, bad parameter type, parse failure.
    DataError = 65,

    /// Input file not found or unreadable.
    NoInput = 66,

    NoUser = 67,

    NoHost = 68,

    /// A required collaborator (git, a pipe's subprocess) is unavailable.
    Unavailable = 69,

    /// Internal consistency check failed — a graph invariant violated,
    /// an `Internal` domain error.
    Software = 70,

    OsError = 71,

    OsFile = 72,

    /// Cannot write a product or session file.
    CantCreate = 73,

    IoError = 74,

    TempFail = 75,

    Protocol = 76,

    NoPerm = 77,

    /// Home directory or session configuration is invalid.
    Config = 78,

    /// SIGINT (Ctrl+C).
    Interrupted = 130,

    /// SIGTERM.
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a [`WarpError`] to an exit code using its
    /// [`WarpError::category`], rather than sniffing the message text.
    pub fn from_warp_error(error: &WarpError) -> Self {
        match error.category() {
            "graph_construction" | "name_resolution" | "configuration" => ExitCode::DataError,
            "dependency_load" => ExitCode::NoInput,
            "pipe_action" => ExitCode::Software,
            "postcondition" => ExitCode::CantCreate,
            "staleness" => ExitCode::Software,
            "session" => ExitCode::Config,
            "io" => ExitCode::IoError,
            "serialization" => ExitCode::DataError,
            "subprocess" => ExitCode::Unavailable,
            _ => ExitCode::Error,
        }
    }

    /// Falls back to message-sniffing for errors outside the
    /// `WarpError` hierarchy (CLI validation, `anyhow` context at the
    /// outermost boundary).
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let error_string = error.to_string().to_lowercase();

        if error_string.contains("permission") || error_string.contains("access denied") {
            ExitCode::NoPerm
        } else if error_string.contains("not found") || error_string.contains("no such") {
            ExitCode::NoInput
        } else if error_string.contains("invalid") || error_string.contains("argument") {
            ExitCode::UsageError
        } else if error_string.contains("parse") || error_string.contains("format") {
            ExitCode::DataError
        } else if error_string.contains("io") || error_string.contains("read") || error_string.contains("write") {
            ExitCode::IoError
        } else if error_string.contains("config") {
            ExitCode::Config
        } else if error_string.contains("unavailable") || error_string.contains("not available") {
            ExitCode::Unavailable
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::NoUser => "User does not exist",
            ExitCode::NoHost => "Host name unknown",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::OsFile => "Critical OS file missing",
            ExitCode::CantCreate => "Cannot create output file",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::Protocol => "Remote error in protocol",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

/// Maps a [`WarpError`] to an [`ExitCode`] — the structured counterpart
/// to [`ExitCode::from_error`].
pub fn map_error_to_exit_code(error: &WarpError) -> ExitCode {
    ExitCode::from_warp_error(error)
}

/// Maps a `Result<T, WarpError>` straight to an exit code, discarding
/// the success value.
pub fn result_to_exit_code<T>(result: &Result<T, WarpError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => map_error_to_exit_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values_match_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Error.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn is_success_and_is_error_are_complementary() {
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::Error.is_success());
        assert!(ExitCode::Error.is_error());
        assert!(!ExitCode::Success.is_error());
    }

    #[test]
    fn is_signal_only_for_signal_codes() {
        assert!(ExitCode::Interrupted.is_signal());
        assert!(ExitCode::Terminated.is_signal());
        assert!(!ExitCode::Success.is_signal());
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }

    #[test]
    fn display_includes_description_and_code() {
        let display = format!("{}", ExitCode::UsageError);
        assert!(display.contains("Command line usage error"));
        assert!(display.contains("64"));
    }

    #[test]
    fn from_error_sniffs_io_error_kind() {
        use std::io;

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        assert_eq!(ExitCode::from_error(&err), ExitCode::NoPerm);

        let err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        assert_eq!(ExitCode::from_error(&err), ExitCode::NoInput);
    }

    #[test]
    fn from_warp_error_uses_category() {
        assert_eq!(
            map_error_to_exit_code(&WarpError::UnknownPipe("x".into())),
            ExitCode::DataError
        );
        assert_eq!(
            map_error_to_exit_code(&WarpError::MissingProducer {
                pipe: "p".into(),
                dependency: "d".into()
            }),
            ExitCode::NoInput
        );
        assert_eq!(
            map_error_to_exit_code(&WarpError::Subprocess("child exited 1".into())),
            ExitCode::Unavailable
        );
    }

    #[test]
    fn result_to_exit_code_success_and_failure() {
        let ok: Result<(), WarpError> = Ok(());
        assert_eq!(result_to_exit_code(&ok), ExitCode::Success);

        let err: Result<(), WarpError> = Err(WarpError::Internal("boom".into()));
        assert_eq!(result_to_exit_code(&err), ExitCode::Error);
    }

    #[test]
    fn conversion_to_i32() {
        let code: i32 = ExitCode::Config.into();
        assert_eq!(code, 78);
    }
}
