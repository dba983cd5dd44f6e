//! Line framing for the debugger's standard output.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum line length so a
//! runaway record cannot grow the read buffer without bound. Lines come out
//! without their `\n` (and without a preceding `\r`, which `LinesCodec`
//! already strips).
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use mi_session::mi::codec::MiCodec;
//!
//! let lines = FramedRead::new(child_stdout, MiCodec::new());
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::{AppError, Result};

/// Default maximum accepted line length: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited UTF-8 decoder for protocol output.
///
/// Lines longer than the configured limit yield
/// [`AppError::Protocol`]`("line too long: …")`; I/O failures map to
/// [`AppError::Io`].
#[derive(Debug)]
pub struct MiCodec {
    inner: LinesCodec,
    max_length: usize,
}

impl MiCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a codec with a custom line length limit.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }

    /// Configured line length limit.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn map_error(&self, e: LinesCodecError) -> AppError {
        match e {
            LinesCodecError::MaxLineLengthExceeded => AppError::Protocol(format!(
                "line too long: exceeded {} bytes",
                self.max_length
            )),
            LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
        }
    }
}

impl Default for MiCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MiCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner.decode(src).map_err(|e| self.map_error(e))
    }

    /// A final line without a trailing newline is still delivered at EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.inner.decode_eof(src).map_err(|e| self.map_error(e))
    }
}
