//! Machine-interface protocol handling: line framing, classification, and
//! payload decoding.

pub mod classify;
pub mod codec;
pub mod value;

pub use classify::{classify, AsyncKind, Category, Classified, StreamKind};
pub use value::{MiDecoder, PayloadDecoder};
