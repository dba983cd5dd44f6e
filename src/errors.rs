//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure modes of a debugger session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// File-system, pipe, or pty operation failure.
    Io(String),
    /// The debugger process could not be started.
    Spawn(String),
    /// The debugger emitted a line this implementation cannot classify.
    Protocol(String),
    /// A command completed with a result class outside the recognized set.
    UnexpectedResult {
        /// Command text as issued.
        command: String,
        /// Result class the debugger answered with.
        class: String,
    },
    /// The command/response channel was shut down and drained.
    ChannelClosed,
    /// A record payload could not be decoded.
    Decode(String),
    /// The native compiler exited unsuccessfully; carries its stderr.
    Compile(String),
    /// Operation not valid in the session's current lifecycle state.
    State(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::UnexpectedResult { command, class } => write!(
                f,
                "command '{command}' returned unexpected status {class}"
            ),
            Self::ChannelClosed => write!(f, "result channel closed"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::Compile(msg) => write!(f, "failed to compile source code: {msg}"),
            Self::State(msg) => write!(f, "state: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<nix::Error> for AppError {
    fn from(err: nix::Error) -> Self {
        Self::Io(err.to_string())
    }
}
