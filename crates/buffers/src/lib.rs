//! Byte buffers for the kvpack wire format.
//!
//! All multi-byte quantities are big-endian. Text is framed as a `u32` byte
//! length followed by UTF-8; the length [`NULL_LENGTH`] marks a null string.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Length prefix reserved for a null string.
pub const NULL_LENGTH: u32 = u32::MAX;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid UTF-8")]
    InvalidUtf8,
}
