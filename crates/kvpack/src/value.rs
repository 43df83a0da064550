//! Keys, values and the reference-identity capability.

use std::any::Any;
use std::convert::Infallible;

use kvpack_buffers::{Reader, Writer};

use crate::error::{DecodeError, MapError};

/// A domain object that owns its binary and JSON encodings.
///
/// Maps delegate to these methods for [`Key::Ref`], [`Value::Ref`] and
/// [`Value::RefArray`] entries. `decode` must consume exactly what `encode`
/// wrote.
pub trait Reference: Clone + Send + Sync + 'static {
    fn encode(&self, writer: &mut Writer);

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError>;

    /// Writes a complete JSON value (object, array or scalar).
    fn write_json(&self, writer: &mut Writer);
}

/// Stands in for `R` in maps that never hold references.
impl Reference for Infallible {
    fn encode(&self, _writer: &mut Writer) {
        match *self {}
    }

    fn decode(_reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Err(DecodeError::Reference("map has no reference type".to_string()))
    }

    fn write_json(&self, _writer: &mut Writer) {
        match *self {}
    }
}

// `dyn Any` carries no type name, only its id.
pub(crate) fn unsupported(value: &dyn Any) -> MapError {
    MapError::UnsupportedKind(format!("{:?}", value.type_id()))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key<R> {
    Text(String),
    Ref(R),
}

impl<R> From<&str> for Key<R> {
    fn from(s: &str) -> Self {
        Key::Text(s.to_owned())
    }
}

impl<R> From<String> for Key<R> {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl<R: Reference> Key<R> {
    /// Builds a key from a type-erased value.
    pub fn try_from_any(key: &dyn Any) -> Result<Self, MapError> {
        if let Some(s) = key.downcast_ref::<String>() {
            Ok(Key::Text(s.clone()))
        } else if let Some(s) = key.downcast_ref::<&'static str>() {
            Ok(Key::Text((*s).to_owned()))
        } else if let Some(r) = key.downcast_ref::<R>() {
            Ok(Key::Ref(r.clone()))
        } else {
            Err(unsupported(key))
        }
    }
}

/// A map value. Arrays are homogeneous and never hold nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<R> {
    Text(String),
    Ref(R),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    TextArray(Vec<String>),
    RefArray(Vec<R>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<R> From<$ty> for Value<R> {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    String => Text,
    bool => Bool,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Vec<String> => TextArray,
    Vec<bool> => BoolArray,
    Vec<i32> => I32Array,
    Vec<i64> => I64Array,
    Vec<f32> => F32Array,
    Vec<f64> => F64Array,
}

impl<R> From<&str> for Value<R> {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl<R: Reference> Value<R> {
    /// Builds a value from a type-erased one, for hosts that store `dyn Any`.
    ///
    /// Only the closed set of kinds is accepted; anything else (`u8`,
    /// nested vectors, options) is [`MapError::UnsupportedKind`].
    pub fn try_from_any(value: &dyn Any) -> Result<Self, MapError> {
        macro_rules! try_cast {
            ($($ty:ty => $variant:ident),* $(,)?) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Ok(Value::$variant(v.clone()));
                    }
                )*
            };
        }
        if let Some(s) = value.downcast_ref::<&'static str>() {
            return Ok(Value::Text((*s).to_owned()));
        }
        try_cast! {
            String => Text,
            R => Ref,
            bool => Bool,
            i32 => I32,
            i64 => I64,
            f32 => F32,
            f64 => F64,
            Vec<String> => TextArray,
            Vec<R> => RefArray,
            Vec<bool> => BoolArray,
            Vec<i32> => I32Array,
            Vec<i64> => I64Array,
            Vec<f32> => F32Array,
            Vec<f64> => F64Array,
        }
        Err(unsupported(value))
    }
}
