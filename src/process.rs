//! Debugger process spawner.
//!
//! Starts the debugger with:
//! - its configured machine-interface flags,
//! - `--tty <path>` pointing the debuggee at the pty secondary side,
//! - `--args <target>` naming the program to debug,
//! - piped stdin/stdout owned by the session, stderr inherited,
//! - `kill_on_drop(true)` so an abandoned session does not leak a debugger.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::config::DebuggerConfig;
use crate::{AppError, Result};

/// Stdio handles of a running debugger.
#[derive(Debug)]
pub struct DebuggerProcess {
    /// Child handle, kept alive so `kill_on_drop` applies.
    pub child: Child,
    /// Command input.
    pub stdin: ChildStdin,
    /// Protocol output.
    pub stdout: ChildStdout,
}

/// Build the full argument vector passed to the debugger.
#[must_use]
pub fn debugger_args(config: &DebuggerConfig, tty: &Path, target: &Path) -> Vec<String> {
    let mut args = config.args.clone();
    args.push("--tty".to_owned());
    args.push(tty.to_string_lossy().into_owned());
    args.push("--args".to_owned());
    args.push(target.to_string_lossy().into_owned());
    args
}

/// Spawn the debugger for `target` with its debuggee attached to `tty`.
///
/// # Errors
///
/// - [`AppError::Spawn`] if the OS cannot start the program.
/// - [`AppError::Spawn`] if stdin or stdout could not be captured.
pub fn spawn_debugger(
    config: &DebuggerConfig,
    tty: &Path,
    target: &Path,
) -> Result<DebuggerProcess> {
    let args = debugger_args(config, tty, target);

    let mut child = Command::new(&config.program)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| AppError::Spawn(format!("failed to spawn {}: {err}", config.program)))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture debugger stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture debugger stdout".into()))?;

    info!(
        program = config.program.as_str(),
        pid = ?child.id(),
        target = %target.display(),
        "debugger spawned"
    );

    Ok(DebuggerProcess {
        child,
        stdin,
        stdout,
    })
}
