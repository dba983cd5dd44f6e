//! Session façade: lifecycle and the command API.
//!
//! ```text
//! Uninitialized --init--> Running --deinit--> Terminated
//! ```
//!
//! [`Session::init`] allocates the pty, spawns the debugger and starts both
//! read loops. [`Session::execute`] writes one command line and waits for
//! the next result record. [`Session::deinit`] tears everything down in an
//! order that never closes a descriptor a reader still uses:
//!
//! 1. close the debugger's stdin (end of input makes it exit),
//! 2. wait for the debugger to exit and the output reader to reach EOF,
//! 3. shut down the result channel and discard anything still queued,
//! 4. close the pty secondary side, which ends the primary-side read,
//! 5. wait for the debuggee-output loop to report completion.
//!
//! Responses are matched to commands by arrival order only. `execute` takes
//! `&mut self`, so a second command cannot be issued while one is waiting.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::callback::{CallbackSlot, EventCallback};
use crate::channel::{result_channel, ResultReceiver, ResultSender};
use crate::config::GlobalConfig;
use crate::events::{DebuggerEvent, ResultRecord};
use crate::mi::value::{MiDecoder, PayloadDecoder};
use crate::process::spawn_debugger;
use crate::pty::Pty;
use crate::reader::{run_output_reader, spawn_inferior_reader, OutputRoutes};
use crate::{AppError, Result};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet started.
    Uninitialized,
    /// Debugger running; commands accepted.
    Running,
    /// Torn down. Cannot be restarted.
    Terminated,
}

struct Running {
    child: Child,
    stdin: Option<ChildStdin>,
    output_task: JoinHandle<Result<()>>,
    inferior_task: JoinHandle<()>,
    pty_secondary: Option<File>,
    pty_path: PathBuf,
}

/// One debugger instance driven over its machine interface.
pub struct Session {
    config: GlobalConfig,
    decoder: Arc<dyn PayloadDecoder>,
    results_tx: Option<ResultSender<ResultRecord>>,
    results: ResultReceiver<ResultRecord>,
    events: Arc<CallbackSlot<DebuggerEvent>>,
    inferior_output: Arc<CallbackSlot<String>>,
    inferior_done_tx: Option<watch::Sender<bool>>,
    inferior_done: watch::Receiver<bool>,
    running: Option<Running>,
    state: SessionState,
}

impl Session {
    /// Create an uninitialized session using the default payload decoder.
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        let (inferior_done_tx, inferior_done) = watch::channel(true);
        let (results_tx, results) = result_channel();
        Self {
            config,
            decoder: Arc::new(MiDecoder),
            results_tx: Some(results_tx),
            results,
            events: Arc::new(CallbackSlot::new()),
            inferior_output: Arc::new(CallbackSlot::new()),
            inferior_done_tx: Some(inferior_done_tx),
            inferior_done,
            running: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Replace the payload decoder. Takes effect at [`init`](Self::init).
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl PayloadDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Set the handler for async notifications and stream output.
    pub fn on_event(&self, callback: EventCallback<DebuggerEvent>) {
        self.events.set(callback);
    }

    /// Set the handler for raw debuggee terminal output.
    pub fn on_inferior(&self, callback: EventCallback<String>) {
        self.inferior_output.set(callback);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Path of the pty secondary side while running.
    #[must_use]
    pub fn pty_path(&self) -> Option<&Path> {
        self.running.as_ref().map(|r| r.pty_path.as_path())
    }

    /// Whether the debuggee-output loop is not running.
    #[must_use]
    pub fn inferior_finished(&self) -> bool {
        *self.inferior_done.borrow()
    }

    /// Start the debugger on `target` and both read loops.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`AppError::State`] if the session was already started.
    /// - [`AppError::Io`] if no pty could be allocated.
    /// - [`AppError::Spawn`] if the debugger could not be started.
    pub fn init(&mut self, target: impl AsRef<Path>) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Err(AppError::State(format!(
                "init called on a {:?} session",
                self.state
            )));
        }
        let target = target.as_ref();
        let pty = Pty::open()?;
        let process = spawn_debugger(&self.config.debugger, pty.secondary_path(), target)?;
        let (Some(results_tx), Some(inferior_done_tx)) =
            (self.results_tx.take(), self.inferior_done_tx.take())
        else {
            return Err(AppError::State("read loops already started".into()));
        };

        let routes = OutputRoutes {
            decoder: Arc::clone(&self.decoder),
            results: results_tx,
            events: Arc::clone(&self.events),
        };
        let output_task = tokio::spawn(run_output_reader(
            process.stdout,
            self.config.max_line_bytes,
            routes,
        ));

        let Pty {
            primary,
            secondary,
            secondary_path,
        } = pty;
        let inferior_task =
            spawn_inferior_reader(primary, Arc::clone(&self.inferior_output), inferior_done_tx);

        self.running = Some(Running {
            child: process.child,
            stdin: Some(process.stdin),
            output_task,
            inferior_task,
            pty_secondary: Some(secondary),
            pty_path: secondary_path,
        });
        self.state = SessionState::Running;
        info!(target = %target.display(), "session initialized");
        Ok(())
    }

    /// Issue `command` and return the payload of its result record.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn command(&mut self, command: &str) -> Result<Value> {
        self.execute(command).await.map(|record| record.payload)
    }

    /// Issue `command` and return its full result record.
    ///
    /// Waits indefinitely for the response; wrap the call in
    /// [`tokio::time::timeout`] if a bound is needed.
    ///
    /// # Errors
    ///
    /// - [`AppError::State`] if the session is not running.
    /// - [`AppError::Protocol`] if `command` spans more than one line.
    /// - [`AppError::Io`] if writing to the debugger fails.
    /// - [`AppError::ChannelClosed`] if the output reader has stopped.
    /// - [`AppError::UnexpectedResult`] if the result class is not one of
    ///   [`RESULT_CLASSES`](crate::mi::classify::RESULT_CLASSES).
    pub async fn execute(&mut self, command: &str) -> Result<ResultRecord> {
        if command.contains('\n') {
            return Err(AppError::Protocol(format!(
                "command must be a single line: {command:?}"
            )));
        }
        let stdin = self
            .running
            .as_mut()
            .and_then(|running| running.stdin.as_mut())
            .ok_or_else(|| AppError::State("session is not running".into()))?;

        debug!(command, "sending command");
        stdin.write_all(format!("{command}\n").as_bytes()).await?;
        stdin.flush().await?;

        let record = self.results.get().await?;
        if !record.is_recognized() {
            return Err(AppError::UnexpectedResult {
                command: command.to_owned(),
                class: record.class,
            });
        }
        debug!(command, class = record.class.as_str(), "command completed");
        Ok(record)
    }

    /// Stop the debugger and release every resource.
    ///
    /// A no-op on a session that is not running.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if waiting for the debugger process fails.
    /// Every other teardown step still runs before the error is returned.
    pub async fn deinit(&mut self) -> Result<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };
        self.state = SessionState::Terminated;

        drop(running.stdin.take());
        let exit = match running.child.wait().await {
            Ok(status) => {
                info!(%status, "debugger exited");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "waiting for the debugger failed; killing it");
                if let Err(kill_err) = running.child.kill().await {
                    debug!(%kill_err, "kill after failed wait");
                }
                Err(AppError::from(err))
            }
        };

        match running.output_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(%err, "output reader had stopped with an error"),
            Err(err) => warn!(%err, "output reader task failed"),
        }

        self.results.shutdown();
        for stranded in self.results.join().await {
            warn!(class = stranded.class.as_str(), "discarding unclaimed result");
        }

        drop(running.pty_secondary.take());
        let mut done = self.inferior_done.clone();
        if done.wait_for(|finished| *finished).await.is_err() {
            warn!("debuggee-output loop exited without reporting completion");
        }
        if let Err(err) = running.inferior_task.await {
            warn!(%err, "debuggee-output task failed");
        }

        info!("session terminated");
        exit
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("pty_path", &self.pty_path())
            .field("pending_results", &self.results.len())
            .finish_non_exhaustive()
    }
}
