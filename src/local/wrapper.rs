/*!
 * Local Wrapper
 * Per-request stand-in for a shared immutable array
 *
 * Reads resolve through a lazily populated local cache and never touch the
 * backing's structure; the first mutation escalates the whole thing into a
 * FullLocalArray (see the handle module). Everything here runs on the
 * request's own thread with no locking.
 */

use super::cache::LocalCache;
use super::full::FullLocalArray;
use super::handle::ArrayHandle;
use crate::core::types::{Key, Pos};
use crate::gc::{RequestArena, Scanner, SweepToken};
use crate::shared::{SharedArray, SharedValue};
use crate::value::Value;
use log::trace;
use std::rc::Rc;
use std::sync::Arc;

/// Request-local wrapper over a shared immutable array
///
/// Holds one reference-counted link to the backing, a size cached at
/// construction, the local cache, and its sweep-registry token. Destroyed
/// either by ordinary reference counting or by the arena's end-of-request
/// `reap()`, whichever comes first; the two invalidate each other.
pub struct LocalWrapper {
    /// None once reaped; the Arc is released exactly once
    source: Option<Arc<SharedArray>>,
    size: usize,
    cache: LocalCache,
    arena: Rc<RequestArena>,
    token: Option<SweepToken>,
}

impl LocalWrapper {
    pub(crate) fn new(source: Arc<SharedArray>, arena: Rc<RequestArena>) -> Self {
        let size = source.len();
        Self {
            source: Some(source),
            size,
            cache: LocalCache::new(size),
            arena,
            token: None,
        }
    }

    pub(crate) fn set_token(&mut self, token: SweepToken) {
        debug_assert!(self.token.is_none(), "wrapper registered twice");
        self.token = Some(token);
    }

    pub(crate) fn backing_arc(&self) -> &Arc<SharedArray> {
        self.source.as_ref().expect("local wrapper used after reap")
    }

    pub(crate) fn arena(&self) -> &Rc<RequestArena> {
        &self.arena
    }

    fn backing(&self) -> &SharedArray {
        self.backing_arc()
    }

    /// Size cached at construction (the backing never changes)
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Resolve a key to its slot position; a miss is "absent"
    #[inline]
    pub fn find_slot(&self, key: &Key) -> Option<Pos> {
        self.backing().find_slot(key)
    }

    /// Key presence; never materializes
    #[inline]
    pub fn exists(&self, key: &Key) -> bool {
        self.find_slot(key).is_some()
    }

    /// Key at a position
    #[inline]
    pub fn key_at(&self, pos: Pos) -> Option<Key> {
        self.backing().key_at(pos).cloned()
    }

    /// True if keys are exactly 0..len
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.backing().is_vector()
    }

    /// Lookup by key, materializing the slot on first access
    ///
    /// Repeated lookups of the same key return the identical value: the
    /// slot is decoded once and cached for the wrapper's lifetime.
    pub fn get(&mut self, key: &Key) -> Option<Value> {
        let pos = self.find_slot(key)?;
        Some(self.materialize(pos))
    }

    /// Value at a position, materializing on first access
    pub fn value_at(&mut self, pos: Pos) -> Option<Value> {
        if pos >= self.size {
            return None;
        }
        Some(self.materialize(pos))
    }

    /// Count of materialized cache slots
    pub fn materialized_count(&self) -> usize {
        self.cache.materialized_count()
    }

    fn materialize(&mut self, pos: Pos) -> Value {
        debug_assert_eq!(
            self.cache.len(),
            self.backing().len(),
            "cache/backing length mismatch"
        );
        if let Some(cached) = self.cache.get(pos) {
            return cached.clone();
        }
        let raw = self
            .backing()
            .value_at(pos)
            .expect("slot within cached size")
            .clone();
        let live = decode(&raw, &self.arena);
        trace!("materialized slot {} of shared array", pos);
        self.cache.set(pos, live).clone()
    }

    /// Materialize everything into a full local array, preserving keys
    /// and order
    ///
    /// The escalation step: O(n), with decode cost only for slots not
    /// already materialized. The result is value-equivalent to everything
    /// visible through this wrapper, whatever subset was read before.
    pub fn load_full(&mut self) -> FullLocalArray {
        let mut entries = Vec::with_capacity(self.size);
        for pos in 0..self.size {
            let key = self.key_at(pos).expect("position within cached size");
            let value = self.materialize(pos);
            entries.push((key, value));
        }
        FullLocalArray::from_ordered_entries(entries)
    }

    /// Report owned outgoing references to the tracing collector
    ///
    /// Visits only materialized slots. The shared backing is never
    /// reported: it is owned by the global cache under independent atomic
    /// reference counting, outside the request heap the collector traces.
    pub fn scan(&self, scanner: &mut dyn Scanner) {
        self.cache.for_each_materialized(|v| scanner.accept(v));
    }

    /// Forced end-of-request teardown
    ///
    /// Releases every materialized value and drops the backing reference
    /// exactly once. The sweep drained this wrapper's registry slot, so the
    /// token is discarded and the eventual `Drop` is a no-op.
    pub fn reap(&mut self) -> usize {
        debug_assert!(self.source.is_some(), "wrapper reaped twice");
        let released = self.cache.drain_materialized();
        self.source = None;
        self.token = None;
        released
    }
}

impl std::fmt::Debug for LocalWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWrapper")
            .field("len", &self.size)
            .field("materialized", &self.cache.materialized_count())
            .field("reaped", &self.source.is_none())
            .finish()
    }
}

impl Drop for LocalWrapper {
    fn drop(&mut self) {
        // Ordinary destruction first: pull our registration so the sweep
        // never sees a dangling wrapper. After reap() the token is gone
        // and this is a no-op.
        if let Some(token) = self.token.take() {
            self.arena.unregister(token);
        }
    }
}

/// Decode one shared entry into a live, request-owned value
///
/// Nested shared arrays become independent request-local wrappers
/// registered with the same arena; their lifetime is detached from the
/// store's.
fn decode(raw: &SharedValue, arena: &Rc<RequestArena>) -> Value {
    match raw {
        SharedValue::Null => Value::Null,
        SharedValue::Bool(b) => Value::Bool(*b),
        SharedValue::Int(n) => Value::Int(*n),
        SharedValue::Float(f) => Value::Float(*f),
        SharedValue::Str(s) => Value::str(s),
        SharedValue::Array(shared) => {
            Value::Array(ArrayHandle::from_shared(Arc::clone(shared), arena))
        }
    }
}
