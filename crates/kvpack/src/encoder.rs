//! Binary map encoder.

use kvpack_buffers::Writer;
use tracing::{debug, trace, warn};

use crate::config::CodecConfig;
use crate::error::MapError;
use crate::host::HostMap;
use crate::kind::{KeyKind, Tag};
use crate::value::{Key, Reference, Value};

/// Reference presence markers.
pub(crate) const REF_NULL: u8 = 0;
pub(crate) const REF_PRESENT: u8 = 1;

/// Writes a [`HostMap`] as one tag byte followed by key/value pairs and a
/// null key.
///
/// The map is read in a single pass without locking it. With concurrent
/// writers, entries present when the pass starts are written, entries removed
/// during the pass may or may not be, and a value replaced mid-pass is written
/// as either version.
pub struct MapEncoder {
    pub writer: Writer,
}

impl Default for MapEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEncoder {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            writer: Writer::with_alloc_size(config.initial_capacity),
        }
    }

    /// Encodes `map` and returns the bytes. Nothing is returned on error.
    pub fn encode<R, M>(&mut self, map: &M) -> Result<Vec<u8>, MapError>
    where
        R: Reference,
        M: HostMap<R> + ?Sized,
    {
        self.writer.reset();
        match self.write_map(map) {
            Ok(()) => Ok(self.writer.flush()),
            Err(err) => {
                self.writer.reset();
                warn!("map serialization failed: {}", err);
                Err(err)
            }
        }
    }

    pub fn write_map<R, M>(&mut self, map: &M) -> Result<(), MapError>
    where
        R: Reference,
        M: HostMap<R> + ?Sized,
    {
        if map.is_empty() {
            self.writer.u8(Tag::EMPTY);
            return Ok(());
        }
        let keys = map.keys();
        // The first live entry decides the tag for the whole map.
        let probe = keys
            .iter()
            .find_map(|key| map.get(key).map(|value| Tag::of(key, &value)));
        let Some(tag) = probe else {
            trace!(
                "map reported {} entries but none were live, writing empty map",
                map.size()
            );
            self.writer.u8(Tag::EMPTY);
            return Ok(());
        };
        self.writer.u8(tag.encode());

        let mut written = 0usize;
        for key in &keys {
            let Some(value) = map.get(key) else {
                trace!("entry removed during serialization, skipping");
                continue;
            };
            let found = Tag::of(key, &value);
            if found != tag {
                return Err(MapError::TypeMismatch {
                    expected: tag,
                    found,
                });
            }
            self.write_key(key);
            self.write_value(&value);
            written += 1;
        }
        self.write_end(tag.key);
        debug!(
            "serialized {} entries as {} ({} bytes)",
            written,
            tag,
            self.writer.x()
        );
        Ok(())
    }

    pub fn write_key<R: Reference>(&mut self, key: &Key<R>) {
        match key {
            Key::Text(s) => self.writer.str(Some(s)),
            Key::Ref(r) => self.write_ref(r),
        }
    }

    /// Writes the null key that terminates the entry sequence.
    pub fn write_end(&mut self, kind: KeyKind) {
        match kind {
            KeyKind::Text => self.writer.str(None),
            KeyKind::Reference => self.writer.u8(REF_NULL),
        }
    }

    pub fn write_value<R: Reference>(&mut self, value: &Value<R>) {
        let w = &mut self.writer;
        match value {
            Value::Text(s) => w.str(Some(s)),
            Value::Ref(r) => self.write_ref(r),
            Value::Bool(b) => w.u8(*b as u8),
            Value::I32(n) => w.i32(*n),
            Value::I64(n) => w.i64(*n),
            Value::F32(f) => w.f32(*f),
            Value::F64(f) => w.f64(*f),
            Value::TextArray(arr) => {
                w.count(arr.len());
                for s in arr {
                    w.str(Some(s));
                }
            }
            Value::RefArray(arr) => {
                w.count(arr.len());
                for r in arr {
                    self.write_ref(r);
                }
            }
            Value::BoolArray(arr) => {
                w.count(arr.len());
                for b in arr {
                    w.u8(*b as u8);
                }
            }
            Value::I32Array(arr) => {
                w.count(arr.len());
                arr.iter().for_each(|n| w.i32(*n));
            }
            Value::I64Array(arr) => {
                w.count(arr.len());
                arr.iter().for_each(|n| w.i64(*n));
            }
            Value::F32Array(arr) => {
                w.count(arr.len());
                arr.iter().for_each(|f| w.f32(*f));
            }
            Value::F64Array(arr) => {
                w.count(arr.len());
                arr.iter().for_each(|f| w.f64(*f));
            }
        }
    }

    fn write_ref<R: Reference>(&mut self, r: &R) {
        self.writer.u8(REF_PRESENT);
        r.encode(&mut self.writer);
    }
}

/// Serializes `map` into the tagged binary form.
///
/// An empty map is the single byte [`Tag::EMPTY`]. Fails with
/// [`MapError::TypeMismatch`] when entries do not all share the tag of the
/// first live entry.
pub fn serialize<R, M>(map: &M) -> Result<Vec<u8>, MapError>
where
    R: Reference,
    M: HostMap<R> + ?Sized,
{
    MapEncoder::with_config(&CodecConfig {
        initial_capacity: 1024,
        ..CodecConfig::default()
    })
    .encode(map)
}
