#![forbid(unsafe_code)]

//! Drive a command-line debugger through its line-oriented machine
//! interface.
//!
//! A [`Session`] spawns the debugger with piped stdio and a pseudo-terminal
//! for the program being debugged, then exposes:
//!
//! - [`Session::command`] / [`Session::execute`]: write one command, wait
//!   for its result record;
//! - [`Session::on_event`]: async notifications and stream output;
//! - [`Session::on_inferior`]: raw output of the debugged program.

pub mod callback;
pub mod channel;
pub mod compile;
pub mod config;
pub mod errors;
pub mod events;
pub mod mi;
pub mod process;
pub mod pty;
pub mod reader;
pub mod session;

pub use callback::EventCallback;
pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use events::{AsyncRecord, DebuggerEvent, ResultRecord, StreamRecord};
pub use session::{Session, SessionState};
