//! Decoded records handed to `command` callers and event callbacks.

use serde::Serialize;
use serde_json::Value;

use crate::mi::classify::{is_result_class, AsyncKind, StreamKind};
use crate::mi::value::unescape_c_string;
use crate::Result;

/// A decoded result record: the unit carried by the result channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Completion class (`done`, `running`, `error`, ...).
    pub class: String,
    /// Decoded payload; an empty object when the record had none.
    pub payload: Value,
}

impl ResultRecord {
    /// Whether [`class`](Self::class) is a recognized result class.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        is_result_class(&self.class)
    }
}

/// A decoded out-of-band notification such as `*stopped`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsyncRecord {
    /// Which async family the tag selected.
    pub kind: AsyncKind,
    /// Async class (`stopped`, `running`, `thread-created`, ...).
    pub class: String,
    /// Decoded payload.
    pub payload: Value,
}

/// A stream record, passed through without decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRecord {
    /// Which stream the tag selected.
    pub kind: StreamKind,
    /// Everything after the tag, still quoted and escaped.
    pub raw: String,
}

impl StreamRecord {
    /// The stream text with its quotes and escapes removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`](crate::AppError::Decode) if the raw
    /// payload is not a single c-string.
    pub fn text(&self) -> Result<String> {
        unescape_c_string(&self.raw)
    }
}

/// Everything the output reader dispatches to the debugger-event callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebuggerEvent {
    /// An async notification with its decoded payload.
    Notification(AsyncRecord),
    /// Raw console, target, or log output.
    Stream(StreamRecord),
}
