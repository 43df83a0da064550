//! JSON fragment writer.
//!
//! Produces `"k1": v1, "k2": v2` with no surrounding braces, for embedding in
//! a larger JSON object. Entries are inspected one by one, so a map mixing
//! value kinds is fine here even though the binary form rejects it.

use kvpack_buffers::Writer;
use tracing::warn;

use crate::config::CodecConfig;
use crate::error::MapError;
use crate::host::{HostMap, OrderedMap};
use crate::kind::classify_key;
use crate::value::{Key, Reference, Value};

pub struct MapJsonEncoder {
    pub writer: Writer,
    float_decimals: usize,
}

impl Default for MapJsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapJsonEncoder {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            writer: Writer::with_alloc_size(config.initial_capacity),
            float_decimals: config.float_decimals,
        }
    }

    pub fn encode<R, M>(&mut self, map: &M) -> Result<String, MapError>
    where
        R: Reference,
        M: HostMap<R> + ?Sized,
    {
        self.writer.reset();
        if let Err(err) = self.write_entries(map) {
            self.writer.reset();
            warn!("map JSON rendering failed: {}", err);
            return Err(err);
        }
        // Text is escaped by serde_json; only a misbehaving Reference can
        // produce invalid UTF-8.
        Ok(String::from_utf8_lossy(&self.writer.flush()).into_owned())
    }

    pub fn write_entries<R, M>(&mut self, map: &M) -> Result<(), MapError>
    where
        R: Reference,
        M: HostMap<R> + ?Sized,
    {
        let mut first = true;
        for (key, value) in map.iterate() {
            let Key::Text(name) = &key else {
                return Err(MapError::UnsupportedKeyType(classify_key(&key)));
            };
            if first {
                first = false;
            } else {
                self.writer.utf8(", ");
            }
            self.write_str(name);
            self.writer.utf8(": ");
            self.write_value(&value);
        }
        Ok(())
    }

    pub fn write_value<R: Reference>(&mut self, value: &Value<R>) {
        match value {
            Value::Text(s) => self.write_str(s),
            Value::Ref(r) => r.write_json(&mut self.writer),
            Value::Bool(b) => self.write_boolean(*b),
            Value::I32(n) => {
                self.writer.utf8(&n.to_string());
            }
            Value::I64(n) => {
                self.writer.utf8(&n.to_string());
            }
            Value::F32(f) => self.write_f32(*f),
            Value::F64(f) => self.write_f64(*f),
            Value::TextArray(arr) => self.write_list(arr, |e, s| e.write_str(s)),
            Value::RefArray(arr) => self.write_list(arr, |e, r| r.write_json(&mut e.writer)),
            // Boolean arrays go through the generic slice stringifier, which
            // separates elements with ", " unlike every other array kind.
            Value::BoolArray(arr) => {
                self.writer.utf8(&format!("{:?}", arr));
            }
            Value::I32Array(arr) => self.write_list(arr, |e, n| {
                e.writer.utf8(&n.to_string());
            }),
            Value::I64Array(arr) => self.write_list(arr, |e, n| {
                e.writer.utf8(&n.to_string());
            }),
            Value::F32Array(arr) => self.write_list(arr, |e, f| e.write_f32(*f)),
            Value::F64Array(arr) => self.write_list(arr, |e, f| e.write_f64(*f)),
        }
    }

    /// Writes a quoted, escaped JSON string.
    pub fn write_str(&mut self, s: &str) {
        let json_str = serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
        self.writer.utf8(&json_str);
    }

    pub fn write_boolean(&mut self, b: bool) {
        self.writer.utf8(if b { "true" } else { "false" });
    }

    pub fn write_f32(&mut self, f: f32) {
        if f.is_finite() {
            let s = format!("{:.*}", self.float_decimals, f);
            self.writer.utf8(&s);
        } else {
            self.write_non_finite(f.is_nan(), f.is_sign_positive());
        }
    }

    pub fn write_f64(&mut self, f: f64) {
        if f.is_finite() {
            let s = format!("{:.*}", self.float_decimals, f);
            self.writer.utf8(&s);
        } else {
            self.write_non_finite(f.is_nan(), f.is_sign_positive());
        }
    }

    // JSON has no literal for these; they are written as strings.
    fn write_non_finite(&mut self, nan: bool, positive: bool) {
        let s = match (nan, positive) {
            (true, _) => "\"NaN\"",
            (false, true) => "\"Infinity\"",
            (false, false) => "\"-Infinity\"",
        };
        self.writer.utf8(s);
    }

    fn write_list<T>(&mut self, items: &[T], mut write: impl FnMut(&mut Self, &T)) {
        self.writer.u8(b'[');
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            write(&mut *self, item);
            if i < last {
                self.writer.u8(b',');
            }
        }
        self.writer.u8(b']');
    }
}

/// Renders the entries of `map` as a comma-separated JSON fragment.
///
/// Fails with [`MapError::UnsupportedKeyType`] when a key is not text.
pub fn to_json_fragment<R, M>(map: &M) -> Result<String, MapError>
where
    R: Reference,
    M: HostMap<R> + ?Sized,
{
    MapJsonEncoder::with_config(&CodecConfig {
        initial_capacity: 1024,
        ..CodecConfig::default()
    })
    .encode(map)
}

/// [`to_json_fragment`] wrapped in braces.
pub fn to_json_object<R, M>(map: &M) -> Result<String, MapError>
where
    R: Reference,
    M: HostMap<R> + ?Sized,
{
    to_json_fragment(map).map(|fragment| format!("{{{}}}", fragment))
}

/// Maps cannot be rebuilt from JSON; this always fails.
pub fn from_json_fragment<R: Reference + Ord>(_json: &str) -> Result<OrderedMap<R>, MapError> {
    Err(MapError::Unimplemented)
}
