/*!
 * Local Cache
 * Per-wrapper slot sequence mirroring the shared backing one-to-one
 */

use crate::value::Value;

/// State of one cache slot
#[derive(Debug, Clone, Default)]
pub enum Slot {
    #[default]
    Uninitialized,
    Materialized(Value),
}

/// Lazily populated per-request cache over a shared backing
///
/// Always the same length as the backing; slot *i* corresponds to backing
/// entry *i*. A materialized slot never changes for the cache's lifetime,
/// which is what makes repeated lookups return the identical value.
#[derive(Debug)]
pub struct LocalCache {
    slots: Vec<Slot>,
}

impl LocalCache {
    /// Create with every slot uninitialized
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::Uninitialized; len],
        }
    }

    /// Number of slots (equals the backing length)
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Materialized value at a slot, if present
    #[inline]
    pub fn get(&self, pos: usize) -> Option<&Value> {
        match self.slots.get(pos) {
            Some(Slot::Materialized(v)) => Some(v),
            _ => None,
        }
    }

    /// Fill a slot, returning a reference to the stored value
    ///
    /// A slot is filled at most once.
    pub fn set(&mut self, pos: usize, value: Value) -> &Value {
        debug_assert!(pos < self.slots.len(), "slot out of range");
        debug_assert!(
            matches!(self.slots[pos], Slot::Uninitialized),
            "slot {} materialized twice",
            pos
        );
        self.slots[pos] = Slot::Materialized(value);
        match &self.slots[pos] {
            Slot::Materialized(v) => v,
            Slot::Uninitialized => unreachable!(),
        }
    }

    /// Count of materialized slots
    pub fn materialized_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Materialized(_)))
            .count()
    }

    /// Visit every materialized value in slot order
    pub fn for_each_materialized(&self, mut f: impl FnMut(&Value)) {
        for slot in &self.slots {
            if let Slot::Materialized(v) = slot {
                f(v);
            }
        }
    }

    /// Release every materialized value, returning how many were dropped
    pub fn drain_materialized(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.slots {
            if matches!(slot, Slot::Materialized(_)) {
                *slot = Slot::Uninitialized;
                released += 1;
            }
        }
        released
    }
}
