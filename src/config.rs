//! Configuration parsing and validation.
//!
//! Every section is optional; an empty document yields
//! [`GlobalConfig::default`].
//!
//! ```toml
//! max_line_bytes = 1048576
//!
//! [debugger]
//! program = "gdb"
//! args = ["--interpreter=mi4", "--quiet", "-nx", "-nh"]
//!
//! [compiler]
//! program = "gcc"
//! args = ["-ggdb", "-O0"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::mi::codec::MAX_LINE_BYTES;
use crate::{AppError, Result};

/// How to launch the debugger.
///
/// The session appends `--tty <pty> --args <target>` after [`args`](Self::args).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DebuggerConfig {
    /// Debugger executable.
    #[serde(default = "default_debugger_program")]
    pub program: String,
    /// Flags selecting the machine interface and batch behaviour.
    #[serde(default = "default_debugger_args")]
    pub args: Vec<String>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            program: default_debugger_program(),
            args: default_debugger_args(),
        }
    }
}

fn default_debugger_program() -> String {
    "gdb".into()
}

fn default_debugger_args() -> Vec<String> {
    ["--interpreter=mi4", "--quiet", "-nx", "-nh"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// How to build a debuggee from source.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CompilerConfig {
    /// Compiler executable.
    #[serde(default = "default_compiler_program")]
    pub program: String,
    /// Flags added after `<source> -o <output>`.
    #[serde(default = "default_compiler_args")]
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler_program(),
            args: default_compiler_args(),
        }
    }
}

fn default_compiler_program() -> String {
    "gcc".into()
}

fn default_compiler_args() -> Vec<String> {
    vec!["-ggdb".into(), "-O0".into()]
}

fn default_max_line_bytes() -> usize {
    MAX_LINE_BYTES
}

/// Top-level configuration parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Debugger launch settings.
    #[serde(default)]
    pub debugger: DebuggerConfig,
    /// Compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Longest protocol line accepted from the debugger.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debugger: DebuggerConfig::default(),
            compiler: CompilerConfig::default(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, is not valid
    /// TOML, or fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.debugger.program.trim().is_empty() {
            return Err(AppError::Config("debugger.program must not be empty".into()));
        }
        if self.compiler.program.trim().is_empty() {
            return Err(AppError::Config("compiler.program must not be empty".into()));
        }
        if self.max_line_bytes == 0 {
            return Err(AppError::Config("max_line_bytes must be positive".into()));
        }
        Ok(())
    }
}
