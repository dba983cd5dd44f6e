//! Background read loops of a session.
//!
//! - [`run_output_reader`] owns the debugger's stdout. It classifies each
//!   line and routes it: result records to the [`ResultSender`], async and
//!   stream records to the debugger-event [`CallbackSlot`]. The idle prompt
//!   is dropped. An unknown tag aborts the loop with [`AppError::Protocol`].
//! - [`spawn_inferior_reader`] owns the pty primary side. Blocking reads run
//!   on tokio's blocking pool and hand chunks back over an mpsc channel to
//!   an async task that dispatches them to the debuggee-output slot.
//!
//! Both loops end quietly when their stream ends. When the output reader
//! stops for any reason it drops its result sender, which closes the
//! channel, so a waiting command fails with [`AppError::ChannelClosed`]
//! instead of hanging.

use std::io::{ErrorKind, Read};
use std::sync::Arc;

use futures_util::StreamExt;
use nix::pty::PtyMaster;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, warn};

use crate::callback::CallbackSlot;
use crate::channel::ResultSender;
use crate::events::{AsyncRecord, DebuggerEvent, ResultRecord, StreamRecord};
use crate::mi::classify::{classify, is_prompt, Category};
use crate::mi::codec::MiCodec;
use crate::mi::value::PayloadDecoder;
use crate::{AppError, Result};

/// Size of each blocking read from the pty primary side.
pub const PTY_CHUNK_BYTES: usize = 512;

/// Shared state the output reader routes into.
///
/// Owns the only sender of the result channel while the reader runs.
pub struct OutputRoutes {
    /// Payload decoder for result and async records.
    pub decoder: Arc<dyn PayloadDecoder>,
    /// Destination of result records.
    pub results: ResultSender<ResultRecord>,
    /// Destination of async and stream records.
    pub events: Arc<CallbackSlot<DebuggerEvent>>,
}

/// Route a single protocol line.
///
/// Surrounding whitespace is ignored, so `(gdb) ` counts as the prompt.
///
/// # Errors
///
/// - [`AppError::Protocol`] for a line with an unknown tag (including an
///   empty line).
/// - [`AppError::Decode`] if a result or async payload is malformed.
/// - [`AppError::ChannelClosed`] if a result arrives after shutdown.
pub async fn dispatch_line(line: &str, routes: &OutputRoutes) -> Result<()> {
    let line = line.trim();
    if is_prompt(line) {
        return Ok(());
    }

    let classified = classify(line);
    match classified.category {
        Category::Result => {
            let payload = routes.decoder.decode(classified.payload)?;
            debug!(class = classified.sub_label, "result record");
            routes.results.put(ResultRecord {
                class: classified.sub_label.to_owned(),
                payload,
            })?;
        }
        Category::Async(kind) => {
            let payload = routes.decoder.decode(classified.payload)?;
            debug!(tag = %kind.tag(), class = classified.sub_label, "async record");
            routes
                .events
                .dispatch(DebuggerEvent::Notification(AsyncRecord {
                    kind,
                    class: classified.sub_label.to_owned(),
                    payload,
                }))
                .await;
        }
        Category::Stream(kind) => {
            debug!(tag = %kind.tag(), "stream record");
            routes
                .events
                .dispatch(DebuggerEvent::Stream(StreamRecord {
                    kind,
                    raw: classified.payload.to_owned(),
                }))
                .await;
        }
        Category::Unknown(tag) => {
            return Err(AppError::Protocol(format!(
                "received unknown message from debugger: tag {tag:?} in {line:?}"
            )));
        }
    }

    Ok(())
}

/// Read and route protocol lines from `stdout` until EOF.
///
/// Lines are handled strictly in arrival order; a suspending event callback
/// delays every later line until it completes.
///
/// # Errors
///
/// Returns the first error from [`dispatch_line`] or from line framing;
/// the loop does not continue past it. Clean EOF returns `Ok(())`.
pub async fn run_output_reader<R>(
    stdout: R,
    max_line_bytes: usize,
    routes: OutputRoutes,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, MiCodec::with_max_length(max_line_bytes));

    let outcome = loop {
        match framed.next().await {
            None => {
                debug!("output reader: EOF");
                break Ok(());
            }
            Some(Err(err)) => break Err(err),
            Some(Ok(line)) => {
                if let Err(err) = dispatch_line(&line, &routes).await {
                    break Err(err);
                }
            }
        }
    };

    if let Err(ref err) = outcome {
        error!(%err, "output reader aborted");
    }
    drop(routes);
    outcome
}

/// Start the debuggee-output loop over `primary`.
///
/// `finished` is set to `false` when the loop starts and back to `true`
/// once the last chunk has been dispatched and the primary descriptor is
/// closed. The read ends when the OS reports an error, which happens once
/// every secondary descriptor has been closed.
#[must_use]
pub fn spawn_inferior_reader(
    primary: PtyMaster,
    output: Arc<CallbackSlot<String>>,
    finished: watch::Sender<bool>,
) -> JoinHandle<()> {
    finished.send_replace(false);
    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let blocking = tokio::task::spawn_blocking(move || read_pty(primary, &chunk_tx));

    tokio::spawn(async move {
        let mut carry = Utf8Carry::default();
        while let Some(chunk) = chunk_rx.recv().await {
            let text = carry.push(&chunk);
            if !text.is_empty() {
                output.dispatch(text).await;
            }
        }
        let tail = carry.finish();
        if !tail.is_empty() {
            output.dispatch(tail).await;
        }

        if let Err(err) = blocking.await {
            warn!(%err, "pty read worker failed");
        }
        debug!("inferior reader finished");
        finished.send_replace(true);
    })
}

fn read_pty(mut primary: PtyMaster, chunk_tx: &mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; PTY_CHUNK_BYTES];
    loop {
        match primary.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if chunk_tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                debug!(%err, "pty read ended");
                break;
            }
        }
    }
    // Closes the primary descriptor.
    drop(primary);
}

/// Decodes a byte stream as UTF-8 across chunk boundaries.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// one. Invalid bytes are replaced with U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let complete = match std::str::from_utf8(&self.pending) {
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            _ => self.pending.len(),
        };
        let rest = self.pending.split_off(complete);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = rest;
        text
    }

    pub(crate) fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}
