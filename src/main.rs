#![forbid(unsafe_code)]

//! `mi-session`: host a debugger session from the terminal.
//!
//! Compiles a source file (or takes a ready executable), starts a session
//! on it, and forwards each line typed on stdin as a debugger command.
//! Result payloads and debugger events are printed as JSON lines; output
//! of the debugged program is echoed verbatim.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mi_session::compile::compile;
use mi_session::{AppError, DebuggerEvent, EventCallback, GlobalConfig, Result, Session};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "mi-session", about = "Drive a debugger over its machine interface", version, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["source", "target"])))]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// C source file to compile with debug symbols before debugging.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Where to write the compiled executable (defaults to the source path
    /// without its extension).
    #[arg(long, requires = "source")]
    output: Option<PathBuf>,

    /// Existing executable to debug.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };

    let target = match (&args.source, &args.target) {
        (Some(source), _) => {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| default_output(source));
            compile(&config.compiler, source, &output).await?;
            output
        }
        (None, Some(target)) => target.clone(),
        (None, None) => return Err(AppError::Config("no source or target given".into())),
    };

    let mut session = Session::new(config);
    session.on_event(EventCallback::blocking(|event: DebuggerEvent| {
        print_event(&event);
    }));
    session.on_inferior(EventCallback::blocking(|text: String| {
        if let Err(err) = write_through(&mut std::io::stdout().lock(), &text) {
            warn!(%err, "failed to write debuggee output");
        }
    }));
    session.init(&target)?;

    let outcome = repl(&mut session).await;

    session.deinit().await?;
    info!("mi-session shut down");
    outcome
}

async fn repl(session: &mut Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = shutdown_signal() => {
                info!("shutdown signal received");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        match session.command(command).await {
            Ok(payload) => println!("{payload}"),
            Err(AppError::ChannelClosed) => {
                error!("debugger stopped answering");
                return Err(AppError::ChannelClosed);
            }
            Err(err) => warn!(%err, command, "command failed"),
        }
    }
}

/// Write `text` and flush so partial lines from the debuggee show up at once.
fn write_through(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

fn print_event(event: &DebuggerEvent) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(err) => warn!(%err, "failed to serialise debugger event"),
    }
}

fn default_output(source: &Path) -> PathBuf {
    source.with_extension("")
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(err) => {
            warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
            let _ = ctrl_c.await;
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
