// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Dispatch
//!
//! Translates a validated command into calls against [`Workspace`] and
//! formats the result for a terminal. No business logic lives here —
//! every decision the output reflects was already made by the façade.

use std::collections::BTreeMap;

use warp_bootstrap::ValidatedCommand;
use warp_domain::WarpError;

use crate::application::Workspace;

/// Runs one validated command against `workspace`, printing its result.
/// Session-management commands (`CreateSession`, `ClearCache`, …) are
/// handled by the caller before this is reached.
pub fn dispatch(workspace: &mut Workspace, command: ValidatedCommand) -> Result<(), WarpError> {
    match command {
        ValidatedCommand::Build { target, overrides } => {
            workspace.build(&target, to_flat_overrides(overrides))?;
            println!("built {target}");
        }
        ValidatedCommand::Backfill {
            target,
            overrides,
            rebuild_all,
            rebuild_static_products,
        } => {
            let trajectory = workspace.backfill(&target, to_nested_overrides(overrides, &target), rebuild_all, rebuild_static_products)?;
            print_trajectory(&trajectory);
        }
        ValidatedCommand::Status { target } => {
            let report = workspace.status(&target)?;
            print_status(&report);
            workspace.check_ancestry_integrity(&target)?;
        }
        ValidatedCommand::Resume => {
            workspace.resume()?;
            println!("resumed session {}", workspace.pipes().len());
        }
        ValidatedCommand::LoadSession { session_id } => {
            workspace.load_session(session_id.clone())?;
            println!("loaded session {session_id}");
        }
        ValidatedCommand::CreateSession { session_id } => {
            workspace.create_session(session_id)?;
        }
        ValidatedCommand::ClearCache { session_id, all } => {
            workspace.clear_cache(session_id.as_deref(), all)?;
            println!("cache cleared");
        }
        ValidatedCommand::Parameters { pipe } => {
            for (key, value) in workspace.parameters(&pipe)? {
                println!("{key} = {value:?}");
            }
        }
        ValidatedCommand::Products { pipe } => {
            for (relative, resolved) in workspace.products(&pipe)? {
                println!("{} -> {}", relative.display(), resolved.display());
            }
        }
        ValidatedCommand::ViewPipe { pipe } => {
            println!("{}", workspace.view_pipe(&pipe)?);
        }
        ValidatedCommand::Pipes => {
            for name in workspace.pipes() {
                println!("{name}");
            }
        }
        ValidatedCommand::Sessions => {
            let timestamps = workspace.session_timestamps()?;
            for session_id in workspace.sessions()? {
                match timestamps.get(&session_id) {
                    Some(ts) => println!("{session_id}\t{ts}"),
                    None => println!("{session_id}"),
                }
            }
        }
        ValidatedCommand::RunChild { target, overrides, .. } => {
            workspace.run_child(&target, to_flat_overrides(overrides))?;
        }
    }
    Ok(())
}

fn to_flat_overrides(overrides: Vec<(String, String)>) -> BTreeMap<String, String> {
    overrides.into_iter().collect()
}

/// Backfill overrides are given on the CLI as bare `key=value` pairs
/// scoped to the target pipe — there is no per-pipe override syntax on
/// the command line, unlike the `configs_override` map the façade
/// accepts for programmatic callers.
fn to_nested_overrides(overrides: Vec<(String, String)>, target: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    if overrides.is_empty() {
        return BTreeMap::new();
    }
    let mut nested = BTreeMap::new();
    nested.insert(target.to_string(), to_flat_overrides(overrides));
    nested
}

fn print_trajectory(trajectory: &[String]) {
    if trajectory.is_empty() {
        println!("nothing stale; target already up to date");
        return;
    }
    println!("Build trajectory: {}", trajectory.join(" -> "));
}

fn print_status(report: &crate::application::StatusReport) {
    println!("target: {}", report.target);
    println!("lineage:");
    for pipe in &report.lineage {
        let marker = if report.stale.contains(pipe) { "stale" } else { "fresh" };
        println!("  {pipe} [{marker}]");
    }
    match report.last_build_time {
        Some(ts) => println!("last build: {ts}"),
        None => println!("last build: never"),
    }
    match &report.git_commit_hash {
        Some(hash) => println!("commit: {hash}"),
        None => println!("commit: (none)"),
    }
    match report.time_elapsed_secs {
        Some(secs) => println!("elapsed: {secs:.3}s"),
        None => println!("elapsed: n/a"),
    }
    println!("parameters:");
    for (key, value) in &report.parameters {
        println!("  {key} = {value:?}");
    }
    println!("products:");
    for (relative, resolved) in &report.products {
        println!("  {} -> {}", relative.display(), resolved.display());
    }
}
