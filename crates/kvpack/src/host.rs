//! Host mappings the codecs read from and decode into.

use std::collections::BTreeMap;
use std::hash::Hash;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::error::MapError;
use crate::value::{Key, Reference, Value};

/// Map capability consumed by the encoders and filled by the decoder.
///
/// All methods take `&self`; implementations are expected to tolerate
/// concurrent writers. [`HostMap::keys`] only needs to be weakly consistent:
/// it must include keys present before the call started and may or may not
/// include keys inserted or removed while it runs. [`HostMap::size`] is an
/// independent observation and may disagree with `keys`.
pub trait HostMap<R: Reference> {
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn get(&self, key: &Key<R>) -> Option<Value<R>>;

    fn contains_key(&self, key: &Key<R>) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites, returning the previous value.
    fn put(&self, key: Key<R>, value: Value<R>) -> Option<Value<R>>;

    fn remove(&self, key: &Key<R>) -> Option<Value<R>>;

    fn clear(&self);

    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (Key<R>, Value<R>)>,
        Self: Sized,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Weakly-consistent snapshot of the keys.
    fn keys(&self) -> Vec<Key<R>>;

    /// Pairs each key of a [`HostMap::keys`] snapshot with its current value.
    ///
    /// Values are read lazily, one entry at a time; entries removed after the
    /// snapshot are skipped.
    fn iterate(&self) -> Box<dyn Iterator<Item = (Key<R>, Value<R>)> + '_> {
        Box::new(
            self.keys()
                .into_iter()
                .filter_map(move |key| self.get(&key).map(|value| (key, value))),
        )
    }

    /// Binary form of this map, see [`crate::serialize`].
    fn serialize(&self) -> Result<Vec<u8>, MapError> {
        crate::encoder::MapEncoder::new().encode::<R, Self>(self)
    }

    /// JSON fragment of this map, see [`crate::to_json_fragment`].
    fn to_json_fragment(&self) -> Result<String, MapError> {
        crate::json::MapJsonEncoder::new().encode::<R, Self>(self)
    }

    /// Rebuilds a map from its binary form.
    fn from_bytes(data: &[u8]) -> Result<Self, MapError>
    where
        Self: Sized + Default,
    {
        crate::decoder::MapDecoder::new(data).decode::<R, Self>()
    }
}

/// Sharded concurrent map backed by [`DashMap`].
#[derive(Debug)]
pub struct ConcurrentMap<R: Hash + Eq> {
    inner: DashMap<Key<R>, Value<R>>,
}

impl<R: Hash + Eq> Default for ConcurrentMap<R> {
    fn default() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

impl<R: Hash + Eq> ConcurrentMap<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Reference + Hash + Eq> FromIterator<(Key<R>, Value<R>)> for ConcurrentMap<R> {
    fn from_iter<I: IntoIterator<Item = (Key<R>, Value<R>)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<R: Reference + Hash + Eq> HostMap<R> for ConcurrentMap<R> {
    fn size(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, key: &Key<R>) -> Option<Value<R>> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: Key<R>, value: Value<R>) -> Option<Value<R>> {
        self.inner.insert(key, value)
    }

    fn remove(&self, key: &Key<R>) -> Option<Value<R>> {
        self.inner.remove(key).map(|(_, value)| value)
    }

    fn clear(&self) {
        self.inner.clear();
    }

    fn keys(&self) -> Vec<Key<R>> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Deterministic map with sorted iteration, for tests and decoded output.
#[derive(Debug)]
pub struct OrderedMap<R: Ord> {
    inner: RwLock<BTreeMap<Key<R>, Value<R>>>,
}

impl<R: Ord> Default for OrderedMap<R> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<R: Ord + Clone> OrderedMap<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current contents out.
    pub fn snapshot(&self) -> BTreeMap<Key<R>, Value<R>> {
        self.inner.read().clone()
    }
}

impl<R: Ord + PartialEq> PartialEq for OrderedMap<R> {
    fn eq(&self, other: &Self) -> bool {
        *self.inner.read() == *other.inner.read()
    }
}

impl<R: Ord> FromIterator<(Key<R>, Value<R>)> for OrderedMap<R> {
    fn from_iter<I: IntoIterator<Item = (Key<R>, Value<R>)>>(iter: I) -> Self {
        Self {
            inner: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl<R: Reference + Ord> HostMap<R> for OrderedMap<R> {
    fn size(&self) -> usize {
        self.inner.read().len()
    }

    fn get(&self, key: &Key<R>) -> Option<Value<R>> {
        self.inner.read().get(key).cloned()
    }

    fn put(&self, key: Key<R>, value: Value<R>) -> Option<Value<R>> {
        self.inner.write().insert(key, value)
    }

    fn remove(&self, key: &Key<R>) -> Option<Value<R>> {
        self.inner.write().remove(key)
    }

    fn clear(&self) {
        self.inner.write().clear();
    }

    fn keys(&self) -> Vec<Key<R>> {
        self.inner.read().keys().cloned().collect()
    }
}
