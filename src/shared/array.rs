/*!
 * Shared Immutable Array
 * Process-wide, atomically reference-counted, read-only key/value table
 */

use crate::core::errors::{ArrayError, ArrayResult};
use crate::core::types::{Key, Pos};
use crate::value::FlatValue;
use ahash::HashMap;
use std::sync::Arc;

/// Encoded form of one shared entry's value
///
/// Safe to read from any thread. Nested arrays are themselves shared
/// immutable arrays under independent atomic reference counting.
#[derive(Debug, Clone)]
pub enum SharedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Array(Arc<SharedArray>),
}

impl SharedValue {
    /// Encode a flat value tree into shared form
    ///
    /// Fails only if a nested array carries duplicate keys.
    pub fn encode(flat: &FlatValue) -> ArrayResult<SharedValue> {
        Ok(match flat {
            FlatValue::Null => SharedValue::Null,
            FlatValue::Bool(b) => SharedValue::Bool(*b),
            FlatValue::Int(n) => SharedValue::Int(*n),
            FlatValue::Float(f) => SharedValue::Float(*f),
            FlatValue::Str(s) => SharedValue::Str(Arc::from(s.as_str())),
            FlatValue::Array(entries) => SharedValue::Array(SharedArray::from_flat(entries)?),
        })
    }
}

/// Immutable, ordered key/value table shared across requests
///
/// Entries keep insertion order; a hash index resolves keys to slot
/// positions in O(1). There is no write path: after construction the only
/// mutable state is the `Arc` reference count, so unboundedly many requests
/// read concurrently with no locking.
///
/// Owned jointly by the store and by every request-local wrapper that
/// references it; `Arc::strong_count` is the observable reference count.
#[derive(Debug)]
pub struct SharedArray {
    entries: Vec<(Key, SharedValue)>,
    index: HashMap<Key, Pos>,
    vector_like: bool,
}

impl SharedArray {
    /// Build from ordered (key, encoded value) entries
    ///
    /// Keys must be unique; order is preserved for the array's lifetime.
    pub fn from_entries(entries: Vec<(Key, SharedValue)>) -> ArrayResult<Arc<Self>> {
        let mut index = HashMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (pos, (key, _)) in entries.iter().enumerate() {
            if index.insert(key.clone(), pos).is_some() {
                return Err(ArrayError::DuplicateKey(key.clone()));
            }
        }
        let vector_like = entries
            .iter()
            .enumerate()
            .all(|(i, (key, _))| key.as_int() == Some(i as i64));
        Ok(Arc::new(Self {
            entries,
            index,
            vector_like,
        }))
    }

    /// Build from a flat (key, value) sequence, encoding values recursively
    pub fn from_flat(entries: &[(Key, FlatValue)]) -> ArrayResult<Arc<Self>> {
        let encoded = entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), SharedValue::encode(v)?)))
            .collect::<ArrayResult<Vec<_>>>()?;
        Self::from_entries(encoded)
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key at a position, if in range
    #[inline]
    pub fn key_at(&self, pos: Pos) -> Option<&Key> {
        self.entries.get(pos).map(|(k, _)| k)
    }

    /// Encoded value at a position, if in range
    #[inline]
    pub fn value_at(&self, pos: Pos) -> Option<&SharedValue> {
        self.entries.get(pos).map(|(_, v)| v)
    }

    /// Resolve a key to its slot position
    ///
    /// A miss is "absent", never a fault.
    #[inline]
    pub fn find_slot(&self, key: &Key) -> Option<Pos> {
        self.index.get(key).copied()
    }

    /// True if keys are exactly the sequence 0..len
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.vector_like
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(Key, SharedValue)> {
        self.entries.iter()
    }
}
