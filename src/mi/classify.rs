//! Line classifier for the debugger's machine-interface output.
//!
//! Every line the debugger writes to its standard output starts with a
//! single tag character that selects one of three record families:
//!
//! | Tag | Category                         |
//! |-----|----------------------------------|
//! | `^` | [`Category::Result`]             |
//! | `*` | [`Category::Async`] (exec)       |
//! | `+` | [`Category::Async`] (status)     |
//! | `=` | [`Category::Async`] (notify)     |
//! | `~` | [`Category::Stream`] (console)   |
//! | `@` | [`Category::Stream`] (target)    |
//! | `&` | [`Category::Stream`] (log)       |
//!
//! Anything else is [`Category::Unknown`]. The idle prompt is filtered out
//! before classification by [`is_prompt`].

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// The idle prompt printed after every batch of output.
pub const PROMPT: &str = "(gdb)";

/// Tag of a result record.
pub const RESULT_TAG: char = '^';

/// Completion classes a result record may carry.
pub const RESULT_CLASSES: &[&str] = &["done", "running", "connected", "error", "exit"];

/// Out-of-band asynchronous record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncKind {
    /// `*`: execution state changed (running, stopped).
    Exec,
    /// `+`: progress of a long-running operation.
    Status,
    /// `=`: supplementary notification (thread created, library loaded, ...).
    Notify,
}

impl AsyncKind {
    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '*' => Some(Self::Exec),
            '+' => Some(Self::Status),
            '=' => Some(Self::Notify),
            _ => None,
        }
    }

    /// Tag character on the wire.
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            Self::Exec => '*',
            Self::Status => '+',
            Self::Notify => '=',
        }
    }
}

/// Free-text stream record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// `~`: text meant for the debugger console.
    Console,
    /// `@`: output produced by the target program (remote targets only).
    Target,
    /// `&`: the debugger's internal log.
    Log,
}

impl StreamKind {
    fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '~' => Some(Self::Console),
            '@' => Some(Self::Target),
            '&' => Some(Self::Log),
            _ => None,
        }
    }

    /// Tag character on the wire.
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            Self::Console => '~',
            Self::Target => '@',
            Self::Log => '&',
        }
    }
}

/// Record family selected by a line's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Completion of the most recently issued command.
    Result,
    /// Spontaneous debugger state change.
    Async(AsyncKind),
    /// Free-text output multiplexed onto the protocol stream.
    Stream(StreamKind),
    /// A tag this implementation does not know. Fatal to the reader.
    Unknown(char),
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Result => write!(f, "result"),
            Self::Async(kind) => write!(f, "async({})", kind.tag()),
            Self::Stream(kind) => write!(f, "stream({})", kind.tag()),
            Self::Unknown(tag) => write!(f, "unknown({tag:?})"),
        }
    }
}

/// One classified protocol line, borrowing from the input.
///
/// For result and async records `sub_label` is the text before the first
/// comma and `payload` everything after it. Stream records are not split:
/// `sub_label` is empty and `payload` is the whole remainder after the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    /// Record family.
    pub category: Category,
    /// Result class or async class, empty for streams.
    pub sub_label: &'a str,
    /// Unparsed payload text.
    pub payload: &'a str,
}

/// Whether `line` is the idle prompt and must produce no dispatch.
#[must_use]
pub fn is_prompt(line: &str) -> bool {
    line.trim() == PROMPT
}

/// Whether `class` is one of the recognized [`RESULT_CLASSES`].
#[must_use]
pub fn is_result_class(class: &str) -> bool {
    RESULT_CLASSES.contains(&class)
}

/// Classify a single line (trailing newline already stripped).
///
/// An empty line classifies as [`Category::Unknown`] with a NUL tag.
#[must_use]
pub fn classify(line: &str) -> Classified<'_> {
    let mut chars = line.chars();
    let Some(tag) = chars.next() else {
        return Classified {
            category: Category::Unknown('\0'),
            sub_label: "",
            payload: "",
        };
    };
    let rest = chars.as_str();

    let category = if tag == RESULT_TAG {
        Category::Result
    } else if let Some(kind) = AsyncKind::from_tag(tag) {
        Category::Async(kind)
    } else if let Some(kind) = StreamKind::from_tag(tag) {
        Category::Stream(kind)
    } else {
        Category::Unknown(tag)
    };

    match category {
        Category::Result | Category::Async(_) => {
            let (sub_label, payload) = split_sub_label(rest);
            Classified {
                category,
                sub_label,
                payload,
            }
        }
        Category::Stream(_) | Category::Unknown(_) => Classified {
            category,
            sub_label: "",
            payload: rest,
        },
    }
}

/// Split `text` at its first comma.
///
/// Without a comma the whole text is the label and the payload is empty.
/// Later commas stay in the payload.
#[must_use]
pub fn split_sub_label(text: &str) -> (&str, &str) {
    text.split_once(',').unwrap_or((text, ""))
}
