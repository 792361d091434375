/*!
 * Full Local Array
 * Ordinary mutable ordered array; escalation's output and mutation delegate
 */

use crate::core::types::{Key, Pos};
use crate::value::Value;
use ahash::HashMap;
use std::cmp::Ordering;

/// Mutable, insertion-ordered key/value array owned by one request
///
/// Entries keep order; a hash index resolves keys in O(1). Integer append
/// keys come from a high-water mark that never decreases on removal.
#[derive(Debug, Clone, Default)]
pub struct FullLocalArray {
    entries: Vec<(Key, Value)>,
    index: HashMap<Key, Pos>,
    next_int: i64,
}

impl FullLocalArray {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with reserved capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_int: 0,
        }
    }

    /// Build from ordered entries with unique keys
    ///
    /// The escalation path: keys and order are taken as-is.
    pub fn from_ordered_entries(entries: Vec<(Key, Value)>) -> Self {
        let mut array = Self::with_capacity(entries.len());
        for (key, value) in entries {
            array.set(key, value);
        }
        array
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

    /// True if keys are exactly the sequence 0..len
    pub fn is_vector(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (key, _))| key.as_int() == Some(i as i64))
    }

    /// Check key presence
    #[inline]
    pub fn exists(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Value for a key
    #[inline]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Key at a position
    #[inline]
    pub fn key_at(&self, pos: Pos) -> Option<&Key> {
        self.entries.get(pos).map(|(k, _)| k)
    }

    /// Value at a position
    #[inline]
    pub fn value_at(&self, pos: Pos) -> Option<&Value> {
        self.entries.get(pos).map(|(_, v)| v)
    }

    /// Insert or update; new keys append in order
    pub fn set(&mut self, key: Key, value: Value) {
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos].1 = value;
            return;
        }
        if let Key::Int(n) = key {
            if n >= self.next_int {
                self.next_int = n.saturating_add(1);
            }
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    /// Remove a key, returning its value
    ///
    /// The integer high-water mark is not lowered: appending after removing
    /// the highest key does not reuse it.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for (_, p) in self.index.iter_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        Some(value)
    }

    /// Append with the next integer key, returning the key used
    pub fn append(&mut self, value: Value) -> Key {
        let key = Key::Int(self.next_int);
        self.set(key.clone(), value);
        key
    }

    /// Insert at the front; integer keys are renumbered, string keys kept
    pub fn prepend(&mut self, value: Value) {
        self.entries.insert(0, (Key::Int(-1), value));
        self.renumber();
    }

    /// Merge another entry sequence into this array
    ///
    /// String keys overwrite; integer keys are discarded and the values
    /// appended under fresh integer keys.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = (Key, Value)>) {
        for (key, value) in entries {
            match key {
                Key::Str(_) => self.set(key, value),
                Key::Int(_) => {
                    self.append(value);
                }
            }
        }
    }

    /// Renumber integer keys sequentially from 0, preserving order
    ///
    /// String keys are untouched.
    pub fn renumber(&mut self) {
        let mut next = 0i64;
        for (key, _) in self.entries.iter_mut() {
            if key.is_int() {
                *key = Key::Int(next);
                next += 1;
            }
        }
        self.next_int = next;
        self.rebuild_index();
    }

    /// Sort by key
    pub fn ksort(&mut self, descending: bool) {
        self.entries.sort_by(|(a, _), (b, _)| {
            let ord = a.cmp(b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        self.rebuild_index();
    }

    /// Sort by value, discarding keys (entries re-keyed 0..len)
    pub fn sort(&mut self, descending: bool) {
        self.entries.sort_by(|(_, a), (_, b)| {
            let ord = Value::cmp_values(a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        self.rekey_sequential();
    }

    /// Sort by value, preserving key association
    pub fn asort(&mut self, descending: bool) {
        self.entries.sort_by(|(_, a), (_, b)| {
            let ord = Value::cmp_values(a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        self.rebuild_index();
    }

    /// Sort by value with a user comparator, discarding keys
    pub fn usort(&mut self, mut cmp: impl FnMut(&Value, &Value) -> Ordering) {
        self.entries.sort_by(|(_, a), (_, b)| cmp(a, b));
        self.rekey_sequential();
    }

    /// Sort by value with a user comparator, preserving key association
    pub fn uasort(&mut self, mut cmp: impl FnMut(&Value, &Value) -> Ordering) {
        self.entries.sort_by(|(_, a), (_, b)| cmp(a, b));
        self.rebuild_index();
    }

    /// Sort by key with a user comparator
    pub fn uksort(&mut self, mut cmp: impl FnMut(&Key, &Key) -> Ordering) {
        self.entries.sort_by(|(a, _), (b, _)| cmp(a, b));
        self.rebuild_index();
    }

    /// Iterate entries in order
    pub fn iter(&self) -> impl Iterator<Item = &(Key, Value)> {
        self.entries.iter()
    }

    fn rekey_sequential(&mut self) {
        for (i, (key, _)) in self.entries.iter_mut().enumerate() {
            *key = Key::Int(i as i64);
        }
        self.next_int = self.entries.len() as i64;
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), pos);
        }
    }
}
