// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated command
//! └─────────────────────────────────────┘
//! ```

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// CLI arguments after security validation: canonicalized paths, range
/// and pattern checked values.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub home: Option<PathBuf>,
    pub link_static_products: bool,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Build {
        target: String,
        overrides: Vec<(String, String)>,
    },
    Backfill {
        target: String,
        overrides: Vec<(String, String)>,
        rebuild_all: bool,
        rebuild_static_products: bool,
    },
    Status {
        target: String,
    },
    Resume,
    LoadSession {
        session_id: String,
    },
    CreateSession {
        session_id: Option<String>,
    },
    ClearCache {
        session_id: Option<String>,
        all: bool,
    },
    Parameters {
        pipe: String,
    },
    Products {
        pipe: String,
    },
    ViewPipe {
        pipe: String,
    },
    Pipes,
    Sessions,
    RunChild {
        session_id: String,
        target: String,
        overrides: Vec<(String, String)>,
    },
}

/// Parses and validates CLI arguments in one step.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(parser::parse_cli())
}

fn validate_overrides(overrides: &[(String, String)]) -> Result<(), ParseError> {
    for (k, v) in overrides {
        SecureArgParser::validate_name("override key", k)?;
        SecureArgParser::validate_argument(v)?;
    }
    Ok(())
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let home = SecureArgParser::validate_optional_path(cli.home.as_deref().map(|p| p.to_string_lossy().to_string()).as_deref())?;

    let command = match cli.command {
        Commands::Build { target, overrides } => {
            SecureArgParser::validate_name("target", &target)?;
            validate_overrides(&overrides)?;
            ValidatedCommand::Build { target, overrides }
        }
        Commands::Backfill {
            target,
            overrides,
            rebuild_all,
            rebuild_static_products,
        } => {
            SecureArgParser::validate_name("target", &target)?;
            validate_overrides(&overrides)?;
            ValidatedCommand::Backfill {
                target,
                overrides,
                rebuild_all,
                rebuild_static_products,
            }
        }
        Commands::Status { target } => {
            SecureArgParser::validate_name("target", &target)?;
            ValidatedCommand::Status { target }
        }
        Commands::Resume => ValidatedCommand::Resume,
        Commands::LoadSession { session_id } => {
            SecureArgParser::validate_name("session-id", &session_id)?;
            ValidatedCommand::LoadSession { session_id }
        }
        Commands::CreateSession { session_id } => {
            if let Some(ref id) = session_id {
                SecureArgParser::validate_name("session-id", id)?;
            }
            ValidatedCommand::CreateSession { session_id }
        }
        Commands::ClearCache { session_id, all } => {
            if let Some(ref id) = session_id {
                SecureArgParser::validate_name("session-id", id)?;
            }
            ValidatedCommand::ClearCache { session_id, all }
        }
        Commands::Parameters { pipe } => {
            SecureArgParser::validate_name("pipe", &pipe)?;
            ValidatedCommand::Parameters { pipe }
        }
        Commands::Products { pipe } => {
            SecureArgParser::validate_name("pipe", &pipe)?;
            ValidatedCommand::Products { pipe }
        }
        Commands::ViewPipe { pipe } => {
            SecureArgParser::validate_name("pipe", &pipe)?;
            ValidatedCommand::ViewPipe { pipe }
        }
        Commands::Pipes => ValidatedCommand::Pipes,
        Commands::Sessions => ValidatedCommand::Sessions,
        Commands::RunChild { session_id, target, overrides } => {
            SecureArgParser::validate_name("session-id", &session_id)?;
            SecureArgParser::validate_name("target", &target)?;
            validate_overrides(&overrides)?;
            ValidatedCommand::RunChild { session_id, target, overrides }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        home,
        link_static_products: cli.link_static_products,
    })
}
