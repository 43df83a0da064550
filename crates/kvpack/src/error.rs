//! Error types for map serialization.

use kvpack_buffers::BufferError;
use thiserror::Error;

use crate::kind::{KeyKind, Tag};

/// Malformed or truncated binary input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid tag byte: 0x{0:02x}")]
    InvalidTag(u8),
    #[error("array of {count} elements cannot fit in {remaining} remaining bytes")]
    ArrayLength { count: usize, remaining: usize },
    #[error("invalid reference marker: 0x{0:02x}")]
    InvalidMarker(u8),
    #[error("null in value position")]
    NullValue,
    #[error("reference decode failed: {0}")]
    Reference(String),
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => DecodeError::UnexpectedEof,
            BufferError::InvalidUtf8 => DecodeError::InvalidUtf8,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("values of type {0} are not supported")]
    UnsupportedKind(String),
    /// The binary format only supports maps whose entries share one tag.
    #[error("entry kind {found} does not match map kind {expected}")]
    TypeMismatch { expected: Tag, found: Tag },
    #[error("JSON keys must be text, found {0} key")]
    UnsupportedKeyType(KeyKind),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("decoding a JSON fragment into a map is not implemented")]
    Unimplemented,
}

impl From<BufferError> for MapError {
    fn from(err: BufferError) -> Self {
        MapError::Decode(err.into())
    }
}
