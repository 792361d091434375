/*!
 * Array Handle
 * Opaque handle over the two array representations, with one-way escalation
 *
 * Callers (and live iterators) hold the handle, not a concrete
 * representation, so when a mutation escalates the shared wrapper into a
 * full local array every holder observes the replacement in place.
 */

use super::full::FullLocalArray;
use super::wrapper::LocalWrapper;
use crate::core::types::{Key, Pos};
use crate::gc::{Reap, RequestArena, Scanner, Trace};
use crate::shared::SharedArray;
use crate::value::{FlatValue, Value};
use log::debug;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// The two representations behind a handle
///
/// `Shared` reads through the shared backing; `Full` owns its entries. The
/// transition is one-way: once escalated, the wrapper is gone.
#[derive(Debug)]
pub(crate) enum Repr {
    Shared(LocalWrapper),
    Full(FullLocalArray),
}

impl Reap for Repr {
    fn reap(&mut self) -> Option<usize> {
        match self {
            Repr::Shared(wrapper) => Some(wrapper.reap()),
            // An escalated array is ordinary request memory; the bulk
            // reclamation that follows the sweep takes care of it.
            Repr::Full(_) => None,
        }
    }
}

/// Request-local array value with full mutable-array semantics
///
/// Cloning the handle is aliasing (both clones see the same array);
/// [`ArrayHandle::copy`] is the value-semantics copy.
///
/// Confined to one request's thread; no operation blocks or locks.
#[derive(Clone)]
pub struct ArrayHandle {
    inner: Rc<RefCell<Repr>>,
}

impl ArrayHandle {
    /// Wrap a shared array for this request, registering with its arena
    ///
    /// Takes one reference on the backing; allocates nothing else until a
    /// slot is first read.
    pub fn from_shared(source: Arc<SharedArray>, arena: &Rc<RequestArena>) -> Self {
        let wrapper = LocalWrapper::new(source, Rc::clone(arena));
        let inner = Rc::new(RefCell::new(Repr::Shared(wrapper)));
        let token = arena.register(&inner);
        if let Repr::Shared(wrapper) = &mut *inner.borrow_mut() {
            wrapper.set_token(token);
        }
        Self { inner }
    }

    /// Wrap an already-escalated full array
    pub fn from_full(full: FullLocalArray) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Repr::Full(full))),
        }
    }

    /// Build a fresh fully-mutable array from ordered entries
    pub fn from_entries(entries: Vec<(Key, Value)>) -> Self {
        Self::from_full(FullLocalArray::from_ordered_entries(entries))
    }

    /// Handle identity (two clones of one handle are the same array)
    #[inline]
    pub fn ptr_eq(a: &ArrayHandle, b: &ArrayHandle) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// True once a mutation has escalated this array
    pub fn is_escalated(&self) -> bool {
        matches!(&*self.inner.borrow(), Repr::Full(_))
    }

    // ---- read path: never escalates ----

    /// Number of entries
    pub fn len(&self) -> usize {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.len(),
            Repr::Full(f) => f.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key presence; never materializes or escalates
    pub fn exists(&self, key: &Key) -> bool {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.exists(key),
            Repr::Full(f) => f.exists(key),
        }
    }

    /// Key presence by integer key
    #[inline]
    pub fn exists_int(&self, key: i64) -> bool {
        self.exists(&Key::Int(key))
    }

    /// Key presence by string key (canonical integer strings fold)
    #[inline]
    pub fn exists_str(&self, key: &str) -> bool {
        self.exists(&Key::canonical(key))
    }

    /// Lookup by key; absent is `None`, never a fault
    ///
    /// On the shared representation this materializes the slot on first
    /// access; repeated lookups return the identical value.
    pub fn get(&self, key: &Key) -> Option<Value> {
        match &mut *self.inner.borrow_mut() {
            Repr::Shared(w) => w.get(key),
            Repr::Full(f) => f.get(key).cloned(),
        }
    }

    /// Lookup by integer key
    #[inline]
    pub fn get_int(&self, key: i64) -> Option<Value> {
        self.get(&Key::Int(key))
    }

    /// Lookup by string key (canonical integer strings fold)
    #[inline]
    pub fn get_str(&self, key: &str) -> Option<Value> {
        self.get(&Key::canonical(key))
    }

    /// Key at a position in `[0, len)`
    pub fn key_at(&self, pos: Pos) -> Option<Key> {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.key_at(pos),
            Repr::Full(f) => f.key_at(pos).cloned(),
        }
    }

    /// Value at a position, materializing on the shared representation
    pub fn value_at(&self, pos: Pos) -> Option<Value> {
        match &mut *self.inner.borrow_mut() {
            Repr::Shared(w) => w.value_at(pos),
            Repr::Full(f) => f.value_at(pos).cloned(),
        }
    }

    /// True if keys are exactly the sequence 0..len
    pub fn is_vector(&self) -> bool {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.is_vector(),
            Repr::Full(f) => f.is_vector(),
        }
    }

    /// Count of request-owned values currently held
    ///
    /// Shared representation: materialized cache slots. Escalated: every
    /// entry (they are all owned).
    pub fn materialized_count(&self) -> usize {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.materialized_count(),
            Repr::Full(f) => f.len(),
        }
    }

    /// Iterate entries in insertion order
    ///
    /// The iterator holds the handle, not a representation: an escalation
    /// between two steps is observed on the next step, with order and
    /// positions preserved.
    pub fn iter(&self) -> ArrayIter {
        ArrayIter {
            handle: self.clone(),
            pos: 0,
        }
    }

    // ---- mutation path: escalates first ----

    /// One-way transition to the fully mutable representation
    ///
    /// Idempotent in effect: the result is value-equivalent to everything
    /// visible through the handle, whatever subset of slots was cached.
    /// Dropping the wrapper releases the backing reference and pulls the
    /// sweep registration.
    fn escalate(&self) {
        let mut repr = self.inner.borrow_mut();
        if let Repr::Shared(wrapper) = &mut *repr {
            debug!("escalating shared array wrapper ({} entries)", wrapper.len());
            let full = wrapper.load_full();
            *repr = Repr::Full(full);
        }
    }

    fn with_full<R>(&self, f: impl FnOnce(&mut FullLocalArray) -> R) -> R {
        self.escalate();
        match &mut *self.inner.borrow_mut() {
            Repr::Full(full) => f(full),
            Repr::Shared(_) => unreachable!("escalated above"),
        }
    }

    /// Insert or update a key
    pub fn set(&self, key: Key, value: Value) {
        self.with_full(|f| f.set(key, value))
    }

    /// Remove a key, returning its value
    pub fn remove(&self, key: &Key) -> Option<Value> {
        self.with_full(|f| f.remove(key))
    }

    /// Append under the next integer key, returning the key used
    ///
    /// An append that breaks strict sequential keying renumbers exactly as
    /// the delegate array does: the high-water key rule applies.
    pub fn append(&self, value: Value) -> Key {
        self.with_full(|f| f.append(value))
    }

    /// Insert at the front; integer keys renumber, string keys stay
    pub fn prepend(&self, value: Value) {
        self.with_full(|f| f.prepend(value))
    }

    /// Bulk merge: string keys overwrite, integer keys append re-keyed
    pub fn merge(&self, other: &ArrayHandle) {
        // Snapshot first: `other` may alias `self`.
        let entries = other.entries_snapshot();
        self.with_full(|f| f.merge(entries))
    }

    /// Sort by value, re-keying 0..len. Ordering is undefined against the
    /// immutable backing, so this escalates unconditionally.
    pub fn sort(&self, descending: bool) {
        self.with_full(|f| f.sort(descending))
    }

    /// Sort by key
    pub fn ksort(&self, descending: bool) {
        self.with_full(|f| f.ksort(descending))
    }

    /// Sort by value, preserving keys
    pub fn asort(&self, descending: bool) {
        self.with_full(|f| f.asort(descending))
    }

    /// Sort by value with a user comparator, re-keying 0..len
    pub fn usort(&self, cmp: impl FnMut(&Value, &Value) -> Ordering) {
        self.with_full(|f| f.usort(cmp))
    }

    /// Sort by value with a user comparator, preserving keys
    pub fn uasort(&self, cmp: impl FnMut(&Value, &Value) -> Ordering) {
        self.with_full(|f| f.uasort(cmp))
    }

    /// Sort by key with a user comparator
    pub fn uksort(&self, cmp: impl FnMut(&Key, &Key) -> Ordering) {
        self.with_full(|f| f.uksort(cmp))
    }

    /// Renumber integer keys sequentially, preserving order
    pub fn renumber(&self) {
        self.with_full(|f| f.renumber())
    }

    // ---- copies and teardown ----

    /// Value-semantics copy
    ///
    /// On the shared representation this is the cheap path the design
    /// exists for: one more reference on the backing and a fresh, empty
    /// cache — no escalation, no pre-population. Escalated arrays clone
    /// their entries (values are shallow clones).
    pub fn copy(&self) -> ArrayHandle {
        match &*self.inner.borrow() {
            Repr::Shared(w) => {
                ArrayHandle::from_shared(Arc::clone(w.backing_arc()), w.arena())
            }
            Repr::Full(f) => ArrayHandle::from_full(f.clone()),
        }
    }

    /// Copy for serialization: forces escalation, then flattens into a
    /// fully-owned tree (nested arrays recursively escalate too)
    pub fn copy_for_serialization(&self) -> FlatValue {
        self.escalate();
        let repr = self.inner.borrow();
        match &*repr {
            Repr::Full(full) => FlatValue::Array(
                full.iter()
                    .map(|(k, v)| (k.clone(), v.to_flat()))
                    .collect(),
            ),
            Repr::Shared(_) => unreachable!("escalated above"),
        }
    }

    /// Explicitly release this handle's reference
    ///
    /// Equivalent to dropping it; the last reference tears the array down
    /// (and, on the shared representation, releases the backing).
    pub fn release(self) {
        drop(self);
    }

    fn entries_snapshot(&self) -> Vec<(Key, Value)> {
        let len = self.len();
        let mut entries = Vec::with_capacity(len);
        for pos in 0..len {
            let key = self.key_at(pos).expect("position within length");
            let value = self.value_at(pos).expect("position within length");
            entries.push((key, value));
        }
        entries
    }
}

impl Trace for ArrayHandle {
    /// Report owned outgoing references
    ///
    /// Shared representation: materialized slots only, never the backing.
    /// Escalated: every entry value.
    fn trace(&self, scanner: &mut dyn Scanner) {
        match &*self.inner.borrow() {
            Repr::Shared(w) => w.scan(scanner),
            Repr::Full(f) => {
                for (_, value) in f.iter() {
                    scanner.accept(value);
                }
            }
        }
    }
}

impl fmt::Debug for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(repr) => match &*repr {
                Repr::Shared(w) => f
                    .debug_struct("ArrayHandle")
                    .field("repr", &"shared")
                    .field("len", &w.len())
                    .field("materialized", &w.materialized_count())
                    .finish(),
                Repr::Full(full) => f
                    .debug_struct("ArrayHandle")
                    .field("repr", &"full")
                    .field("len", &full.len())
                    .finish(),
            },
            Err(_) => write!(f, "ArrayHandle(<in use>)"),
        }
    }
}

/// Position-based iterator over an array handle
///
/// Positions run `[0, len)`; advancing is a plain increment (the backing
/// has no tombstones). Remains valid across an escalation happening
/// mid-traversal: it re-resolves the representation through the handle on
/// every step.
pub struct ArrayIter {
    handle: ArrayHandle,
    pos: Pos,
}

impl ArrayIter {
    /// Current position
    #[inline]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// True once the position has passed the last entry
    pub fn is_end(&self) -> bool {
        self.pos >= self.handle.len()
    }

    /// Reset to the first position
    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for ArrayIter {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.handle.key_at(self.pos)?;
        let value = self.handle.value_at(self.pos)?;
        self.pos += 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.handle.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}
