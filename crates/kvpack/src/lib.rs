//! Tagged binary and JSON-fragment serialization for key-value maps that
//! other threads may be mutating.
//!
//! A map is written as one tag byte describing the key kind, value kind and
//! array flag shared by all its entries, followed by key/value pairs and a
//! null key. The tag comes from a single probe entry, so the binary form only
//! supports homogeneous maps; the JSON fragment has no such limit.
//!
//! # Wire format
//!
//! Big-endian throughout.
//!
//! | field | encoding |
//! |---|---|
//! | tag | 1 byte, `0xFF` for an empty map (nothing follows) |
//! | text | `u32` byte length + UTF-8, length `0xFFFF_FFFF` is null |
//! | reference | `1` + the reference's own encoding, or `0` for null |
//! | boolean | 1 byte |
//! | int32 / float32 | 4 bytes |
//! | int64 / float64 | 8 bytes |
//! | array | `u32` count + elements |
//!
//! # Concurrent maps
//!
//! Encoders take no lock on the map. The emptiness check and the key snapshot
//! are separate observations: a map may report entries and then yield none
//! (the output is an empty map), or report none while a writer is inserting
//! (the output is also an empty map). Entries removed mid-pass are skipped and
//! a value replaced mid-pass is written as either version. An entry whose kind
//! changes mid-pass, the probe included, fails with
//! [`MapError::TypeMismatch`] rather than producing mislabelled bytes.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod host;
pub mod json;
pub mod kind;
pub mod value;

pub use config::CodecConfig;
pub use decoder::{deserialize, MapDecoder};
pub use encoder::{serialize, MapEncoder};
pub use error::{DecodeError, MapError};
pub use host::{ConcurrentMap, HostMap, OrderedMap};
pub use json::{from_json_fragment, to_json_fragment, to_json_object, MapJsonEncoder};
pub use kind::{classify_any, classify_key, classify_value, decode_tag, encode_tag};
pub use kind::{KeyKind, Tag, ValueKind};
pub use value::{Key, Reference, Value};

pub use kvpack_buffers::{Reader, Writer};
