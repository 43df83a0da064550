//! Binary map decoder.

use kvpack_buffers::Reader;
use tracing::{debug, warn};

use crate::encoder::{REF_NULL, REF_PRESENT};
use crate::error::{DecodeError, MapError};
use crate::host::{HostMap, OrderedMap};
use crate::kind::{KeyKind, Tag, ValueKind};
use crate::value::{Key, Reference, Value};

/// Reads a map written by [`crate::encoder::MapEncoder`].
///
/// After the tag, the decoder alternates between expecting a key and reading
/// its value until it meets the null key. A key that appears twice keeps its
/// later value. Bytes after the null key are not read.
pub struct MapDecoder<'a> {
    pub reader: Reader<'a>,
}

impl<'a> MapDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
        }
    }

    /// Decodes into a fresh `M`; no map is returned if decoding fails midway.
    pub fn decode<R, M>(&mut self) -> Result<M, MapError>
    where
        R: Reference,
        M: HostMap<R> + Default,
    {
        let map = M::default();
        match self.read_into(&map) {
            Ok(count) => {
                debug!("deserialized {} entries ({} bytes)", count, self.reader.x);
                Ok(map)
            }
            Err(err) => {
                warn!(
                    "map deserialization failed at byte {}: {}",
                    self.reader.x, err
                );
                Err(err.into())
            }
        }
    }

    /// Reads entries into `map`, returning how many were read.
    pub fn read_into<R, M>(&mut self, map: &M) -> Result<usize, DecodeError>
    where
        R: Reference,
        M: HostMap<R> + ?Sized,
    {
        let byte = self.reader.u8()?;
        if byte == Tag::EMPTY {
            return Ok(0);
        }
        let tag = Tag::decode(byte)?;
        let mut count = 0usize;
        while let Some(key) = self.read_key(tag.key)? {
            let value = self.read_value(tag.value, tag.array)?;
            map.put(key, value);
            count += 1;
        }
        Ok(count)
    }

    /// Reads one key; `None` is the end of the entries.
    pub fn read_key<R: Reference>(
        &mut self,
        kind: KeyKind,
    ) -> Result<Option<Key<R>>, DecodeError> {
        match kind {
            KeyKind::Text => Ok(self.reader.str()?.map(|s| Key::Text(s.to_owned()))),
            KeyKind::Reference => Ok(self.read_ref_opt()?.map(Key::Ref)),
        }
    }

    pub fn read_value<R: Reference>(
        &mut self,
        kind: ValueKind,
        array: bool,
    ) -> Result<Value<R>, DecodeError> {
        if array {
            return self.read_array(kind);
        }
        let r = &mut self.reader;
        let value = match kind {
            ValueKind::Text => Value::Text(self.read_text()?),
            ValueKind::Reference => Value::Ref(self.read_ref()?),
            ValueKind::Boolean => Value::Bool(r.u8()? == 1),
            ValueKind::Int32 => Value::I32(r.i32()?),
            ValueKind::Int64 => Value::I64(r.i64()?),
            ValueKind::Float32 => Value::F32(r.f32()?),
            ValueKind::Float64 => Value::F64(r.f64()?),
        };
        Ok(value)
    }

    fn read_array<R: Reference>(&mut self, kind: ValueKind) -> Result<Value<R>, DecodeError> {
        let count = self.read_count(kind)?;
        let value = match kind {
            ValueKind::Text => Value::TextArray(
                (0..count)
                    .map(|_| self.read_text())
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Reference => Value::RefArray(
                (0..count)
                    .map(|_| self.read_ref())
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Boolean => Value::BoolArray(
                (0..count)
                    .map(|_| self.reader.u8().map(|b| b == 1))
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Int32 => Value::I32Array(
                (0..count)
                    .map(|_| self.reader.i32())
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Int64 => Value::I64Array(
                (0..count)
                    .map(|_| self.reader.i64())
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Float32 => Value::F32Array(
                (0..count)
                    .map(|_| self.reader.f32())
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Float64 => Value::F64Array(
                (0..count)
                    .map(|_| self.reader.f64())
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(value)
    }

    /// Reads an element count and checks the elements can fit in what is left.
    fn read_count(&mut self, kind: ValueKind) -> Result<usize, DecodeError> {
        let count = self.reader.count()?;
        let remaining = self.reader.size();
        match count.checked_mul(kind.min_wire_size()) {
            Some(needed) if needed <= remaining => Ok(count),
            _ => Err(DecodeError::ArrayLength { count, remaining }),
        }
    }

    fn read_text(&mut self) -> Result<String, DecodeError> {
        match self.reader.str()? {
            Some(s) => Ok(s.to_owned()),
            None => Err(DecodeError::NullValue),
        }
    }

    fn read_ref<R: Reference>(&mut self) -> Result<R, DecodeError> {
        self.read_ref_opt()?.ok_or(DecodeError::NullValue)
    }

    fn read_ref_opt<R: Reference>(&mut self) -> Result<Option<R>, DecodeError> {
        match self.reader.u8()? {
            REF_NULL => Ok(None),
            REF_PRESENT => R::decode(&mut self.reader).map(Some),
            marker => Err(DecodeError::InvalidMarker(marker)),
        }
    }
}

/// Rebuilds a map from the tagged binary form.
///
/// Fails with [`MapError::Decode`] on truncated input, an undefined tag or an
/// array count larger than the rest of the input.
pub fn deserialize<R: Reference + Ord>(data: &[u8]) -> Result<OrderedMap<R>, MapError> {
    MapDecoder::new(data).decode::<R, OrderedMap<R>>()
}
