//! Kind registry: classifies keys and values and packs the tag byte.
//!
//! Tag layout, one byte per serialized map:
//!
//! ```text
//!   bit 7-6   bit 5      bits 4-1         bit 0
//!   reserved  key kind   value kind 0..6  array flag
//! ```
//!
//! `0xFF` is not a valid tag; it marks an empty map.

use std::any::Any;
use std::fmt;

use crate::error::{DecodeError, MapError};
use crate::value::{unsupported, Key, Reference, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Text = 0,
    Reference = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text = 0,
    Reference = 1,
    Boolean = 2,
    Int32 = 3,
    Int64 = 4,
    Float32 = 5,
    Float64 = 6,
}

impl KeyKind {
    fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(KeyKind::Text),
            1 => Some(KeyKind::Reference),
            _ => None,
        }
    }
}

impl ValueKind {
    fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(ValueKind::Text),
            1 => Some(ValueKind::Reference),
            2 => Some(ValueKind::Boolean),
            3 => Some(ValueKind::Int32),
            4 => Some(ValueKind::Int64),
            5 => Some(ValueKind::Float32),
            6 => Some(ValueKind::Float64),
            _ => None,
        }
    }

    /// Smallest number of bytes one element of this kind occupies on the wire.
    pub(crate) fn min_wire_size(self) -> usize {
        match self {
            ValueKind::Text | ValueKind::Int32 | ValueKind::Float32 => 4,
            ValueKind::Reference | ValueKind::Boolean => 1,
            ValueKind::Int64 | ValueKind::Float64 => 8,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Text => f.write_str("text"),
            KeyKind::Reference => f.write_str("reference"),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Reference => "reference",
            ValueKind::Boolean => "boolean",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// Key kind, value kind and array flag shared by every entry of one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: KeyKind,
    pub value: ValueKind,
    pub array: bool,
}

impl Tag {
    /// Tag byte of an empty map.
    pub const EMPTY: u8 = 0xFF;

    const RESERVED: u8 = 0b1100_0000;

    pub fn new(key: KeyKind, value: ValueKind, array: bool) -> Self {
        Self { key, value, array }
    }

    /// Classifies one entry.
    pub fn of<R>(key: &Key<R>, value: &Value<R>) -> Self {
        let (value_kind, array) = classify_value(value);
        Self::new(classify_key(key), value_kind, array)
    }

    pub fn encode(self) -> u8 {
        encode_tag(self.key, self.value, self.array)
    }

    pub fn decode(byte: u8) -> Result<Self, DecodeError> {
        decode_tag(byte).map(|(key, value, array)| Self::new(key, value, array))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.key, self.value)?;
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

pub fn classify_key<R>(key: &Key<R>) -> KeyKind {
    match key {
        Key::Text(_) => KeyKind::Text,
        Key::Ref(_) => KeyKind::Reference,
    }
}

/// Returns the scalar kind of a value and whether it is an array of it.
pub fn classify_value<R>(value: &Value<R>) -> (ValueKind, bool) {
    match value {
        Value::Text(_) => (ValueKind::Text, false),
        Value::Ref(_) => (ValueKind::Reference, false),
        Value::Bool(_) => (ValueKind::Boolean, false),
        Value::I32(_) => (ValueKind::Int32, false),
        Value::I64(_) => (ValueKind::Int64, false),
        Value::F32(_) => (ValueKind::Float32, false),
        Value::F64(_) => (ValueKind::Float64, false),
        Value::TextArray(_) => (ValueKind::Text, true),
        Value::RefArray(_) => (ValueKind::Reference, true),
        Value::BoolArray(_) => (ValueKind::Boolean, true),
        Value::I32Array(_) => (ValueKind::Int32, true),
        Value::I64Array(_) => (ValueKind::Int64, true),
        Value::F32Array(_) => (ValueKind::Float32, true),
        Value::F64Array(_) => (ValueKind::Float64, true),
    }
}

/// Classifies a type-erased value without converting it.
pub fn classify_any<R: Reference>(value: &dyn Any) -> Result<(ValueKind, bool), MapError> {
    macro_rules! probe {
        ($($ty:ty => $kind:ident, $array:expr);* $(;)?) => {
            $(
                if value.is::<$ty>() {
                    return Ok((ValueKind::$kind, $array));
                }
            )*
        };
    }
    probe! {
        String => Text, false;
        &'static str => Text, false;
        R => Reference, false;
        bool => Boolean, false;
        i32 => Int32, false;
        i64 => Int64, false;
        f32 => Float32, false;
        f64 => Float64, false;
        Vec<String> => Text, true;
        Vec<R> => Reference, true;
        Vec<bool> => Boolean, true;
        Vec<i32> => Int32, true;
        Vec<i64> => Int64, true;
        Vec<f32> => Float32, true;
        Vec<f64> => Float64, true;
    }
    Err(unsupported(value))
}

pub fn encode_tag(key: KeyKind, value: ValueKind, array: bool) -> u8 {
    ((key as u8) << 5) | ((value as u8) << 1) | (array as u8)
}

pub fn decode_tag(byte: u8) -> Result<(KeyKind, ValueKind, bool), DecodeError> {
    if byte & Tag::RESERVED != 0 {
        return Err(DecodeError::InvalidTag(byte));
    }
    let key = KeyKind::from_ordinal((byte >> 5) & 1).ok_or(DecodeError::InvalidTag(byte))?;
    let value = ValueKind::from_ordinal((byte >> 1) & 0xF).ok_or(DecodeError::InvalidTag(byte))?;
    Ok((key, value, byte & 1 == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const VALUE_KINDS: [ValueKind; 7] = [
        ValueKind::Text,
        ValueKind::Reference,
        ValueKind::Boolean,
        ValueKind::Int32,
        ValueKind::Int64,
        ValueKind::Float32,
        ValueKind::Float64,
    ];

    #[test]
    fn tag_bit_layout() {
        assert_eq!(encode_tag(KeyKind::Text, ValueKind::Text, false), 0b0000_0000);
        assert_eq!(encode_tag(KeyKind::Text, ValueKind::Int32, true), 0b0000_0111);
        assert_eq!(
            encode_tag(KeyKind::Reference, ValueKind::Float64, false),
            0b0010_1100
        );
        assert_eq!(
            encode_tag(KeyKind::Reference, ValueKind::Float64, true),
            0b0010_1101
        );
    }

    #[test]
    fn every_tag_decodes_to_itself() {
        for key in [KeyKind::Text, KeyKind::Reference] {
            for value in VALUE_KINDS {
                for array in [false, true] {
                    let tag = Tag::new(key, value, array);
                    assert_eq!(Tag::decode(tag.encode()), Ok(tag));
                }
            }
        }
    }

    #[test]
    fn undefined_tags_are_rejected() {
        // value ordinal 7
        assert_eq!(decode_tag(0b0000_1110), Err(DecodeError::InvalidTag(0x0e)));
        // reserved bits
        assert_eq!(decode_tag(0b0100_0000), Err(DecodeError::InvalidTag(0x40)));
        assert_eq!(decode_tag(Tag::EMPTY), Err(DecodeError::InvalidTag(0xff)));
    }

    #[test]
    fn classify_entries() {
        let key: Key<Infallible> = Key::from("k");
        assert_eq!(classify_key(&key), KeyKind::Text);
        assert_eq!(
            classify_value::<Infallible>(&Value::F32Array(vec![1.0])),
            (ValueKind::Float32, true)
        );
        assert_eq!(
            Tag::of(&key, &Value::I64(3)),
            Tag::new(KeyKind::Text, ValueKind::Int64, false)
        );
    }

    #[test]
    fn classify_any_matches_value_conversion() {
        assert_eq!(
            classify_any::<Infallible>(&vec![1i64, 2]),
            Ok((ValueKind::Int64, true))
        );
        assert_eq!(
            classify_any::<Infallible>(&"text"),
            Ok((ValueKind::Text, false))
        );
        assert!(matches!(
            classify_any::<Infallible>(&1u16),
            Err(MapError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn tag_display() {
        let tag = Tag::new(KeyKind::Text, ValueKind::Boolean, true);
        assert_eq!(tag.to_string(), "text -> boolean[]");
    }
}
