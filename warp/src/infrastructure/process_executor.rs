// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Subprocess Executor
//!
//! Runs a `backfill` trajectory by spawning one fresh child process per
//! pipe, re-invoking the current binary with the hidden `__run-child`
//! subcommand. Isolation is deliberate: a pipe action may import
//! unrelated modules, allocate large intermediates, or leak process-wide
//! state, and a crashed child cannot corrupt a sibling's build.

use std::collections::BTreeMap;
use std::process::Command;

use warp_domain::value_objects::ParameterValue;
use warp_domain::WarpError;

/// Spawns `current_exe() __run-child --session-id <id> --target <name>`,
/// forwarding `overrides` as repeated `--override key=value` flags, and
/// blocks until it exits. Non-zero exit becomes a [`WarpError::Subprocess`].
pub fn run_child(session_id: &str, target: &str, overrides: &BTreeMap<String, ParameterValue>) -> Result<(), WarpError> {
    let exe = std::env::current_exe().map_err(|e| WarpError::Subprocess(format!("could not locate current executable: {e}")))?;

    let mut cmd = Command::new(exe);
    cmd.arg("__run-child").arg("--session-id").arg(session_id).arg("--target").arg(target);

    for (key, value) in overrides {
        cmd.arg("--override").arg(format!("{key}={}", render_override(value)));
    }

    let status = cmd.status().map_err(|e| WarpError::Subprocess(format!("failed to spawn child build for {target}: {e}")))?;

    if !status.success() {
        return Err(WarpError::Subprocess(format!(
            "child build of {target} exited with status {}",
            status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
        )));
    }
    Ok(())
}

fn render_override(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Null => String::new(),
        ParameterValue::Bool(b) => b.to_string(),
        ParameterValue::Integer(i) => i.to_string(),
        ParameterValue::Real(r) => r.to_string(),
        ParameterValue::String(s) => s.clone(),
        ParameterValue::Timestamp(t) => t.to_string(),
        ParameterValue::ByteString(b) => hex::encode(b),
        ParameterValue::Complex(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_override_formats_each_scalar_kind() {
        assert_eq!(render_override(&ParameterValue::Integer(7)), "7");
        assert_eq!(render_override(&ParameterValue::Bool(true)), "true");
        assert_eq!(render_override(&ParameterValue::String("x".into())), "x");
    }
}
