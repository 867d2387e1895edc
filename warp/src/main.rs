// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point: parses and validates CLI arguments through
//! `warp_bootstrap`, wires a sample pipe graph, and dispatches onto the
//! `Workspace` façade while watching for a shutdown signal.

mod demo;

use std::process::ExitCode as ProcessExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use warp_bootstrap::shutdown::ShutdownCoordinator;
use warp_bootstrap::signals::create_signal_handler;
use warp_bootstrap::{bootstrap_cli, map_error_to_exit_code, ExitCode, ValidatedCli, ValidatedCommand};
use warp_domain::WarpError;
use warp_engine::application::Workspace;
use warp_engine::infrastructure::EngineConfig;
use warp_engine::presentation::cli;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ProcessExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warp_engine=info,warp_bootstrap=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let validated = match bootstrap_cli() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            return to_process_exit_code(ExitCode::UsageError);
        }
    };

    let engine_config = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return to_process_exit_code(map_error_to_exit_code(&e));
        }
    };

    let coordinator = ShutdownCoordinator::new(SHUTDOWN_GRACE);
    let token = coordinator.token();
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        create_signal_handler()
            .wait_for_signal(Box::new(move || {
                signal_coordinator.initiate_shutdown();
            }))
            .await;
    });

    let build_task = tokio::task::spawn_blocking(move || run(validated, engine_config));

    tokio::select! {
        result = build_task => {
            match result {
                Ok(Ok(())) => to_process_exit_code(ExitCode::Success),
                Ok(Err(e)) => {
                    tracing::error!("{e}");
                    to_process_exit_code(map_error_to_exit_code(&e))
                }
                Err(join_error) => {
                    tracing::error!("build task panicked: {join_error}");
                    to_process_exit_code(ExitCode::Software)
                }
            }
        }
        _ = token.cancelled() => {
            tracing::warn!("shutdown requested, waiting up to {:?} for the in-flight build to finish", SHUTDOWN_GRACE);
            coordinator.wait_for_shutdown().await;
            to_process_exit_code(ExitCode::Interrupted)
        }
    }
}

fn run(validated: ValidatedCli, engine_config: EngineConfig) -> Result<(), WarpError> {
    let home_path = validated.home.unwrap_or(engine_config.home_dir);
    let link_static_products = validated.link_static_products;

    if let ValidatedCommand::RunChild { session_id, target, overrides } = validated.command {
        let mut workspace = Workspace::rehydrate(home_path, session_id, demo::demo_pipes())?;
        return workspace.run_child(&target, overrides.into_iter().collect());
    }

    let mut workspace = Workspace::new(home_path, None, demo::demo_pipes())?.with_link_static_products(link_static_products);
    if matches!(validated.command, ValidatedCommand::CreateSession { .. }) {
        return cli::dispatch(&mut workspace, validated.command);
    }

    workspace.resume()?;
    cli::dispatch(&mut workspace, validated.command)
}

fn to_process_exit_code(code: ExitCode) -> ProcessExitCode {
    ProcessExitCode::from(code.as_i32() as u8)
}
