//! Native compiler invocation for building a debuggee.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::CompilerConfig;
use crate::{AppError, Result};

/// Compile `source` into the executable `output`.
///
/// Runs `<program> <source> -o <output> <args...>`; the default arguments
/// request debug symbols and no optimization.
///
/// # Errors
///
/// - [`AppError::Spawn`] if the compiler cannot be started.
/// - [`AppError::Compile`] with the captured standard error if the compiler
///   exits unsuccessfully.
pub async fn compile(
    config: &CompilerConfig,
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<()> {
    let source = source.as_ref();
    let output = output.as_ref();
    debug!(program = config.program.as_str(), source = %source.display(), "compiling");

    let result = Command::new(&config.program)
        .arg(source)
        .arg("-o")
        .arg(output)
        .args(&config.args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|err| AppError::Spawn(format!("failed to run {}: {err}", config.program)))?;

    if !result.status.success() {
        return Err(AppError::Compile(
            String::from_utf8_lossy(&result.stderr).trim().to_owned(),
        ));
    }

    info!(output = %output.display(), "compiled debuggee");
    Ok(())
}
