/*!
 * Shared Store
 * Minimal process-wide table of shared arrays
 *
 * Just enough store for requests to obtain wrappers: no eviction,
 * no expiration, no durable encoding.
 */

use super::array::SharedArray;
use crate::core::data_structures::InlineString;
use crate::core::errors::{ArrayError, ArrayResult};
use crate::gc::RequestArena;
use crate::local::ArrayHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::rc::Rc;
use std::sync::Arc;

/// Process-wide name → shared array table
pub struct SharedStore {
    map: DashMap<InlineString, Arc<SharedArray>>,
}

impl SharedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Insert, overwriting any existing entry
    pub fn insert(&self, name: impl Into<InlineString>, array: Arc<SharedArray>) {
        let name = name.into();
        debug!("store insert: {} ({} entries)", name, array.len());
        self.map.insert(name, array);
    }

    /// Insert only if absent
    pub fn add(&self, name: impl Into<InlineString>, array: Arc<SharedArray>) -> ArrayResult<()> {
        let name = name.into();
        match self.map.entry(name.clone()) {
            Entry::Occupied(_) => Err(ArrayError::AlreadyStored(name)),
            Entry::Vacant(slot) => {
                debug!("store add: {} ({} entries)", name, array.len());
                slot.insert(array);
                Ok(())
            }
        }
    }

    /// Fetch the raw shared array (refcount +1)
    pub fn fetch(&self, name: &str) -> Option<Arc<SharedArray>> {
        self.map.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Fetch as a request-local wrapper registered with the given arena
    ///
    /// This is the normal request path: the returned handle reads through
    /// the shared backing without copying it.
    pub fn fetch_local(&self, name: &str, arena: &Rc<RequestArena>) -> Option<ArrayHandle> {
        self.fetch(name)
            .map(|array| ArrayHandle::from_shared(array, arena))
    }

    /// Remove an entry; in-flight wrappers keep their reference
    pub fn remove(&self, name: &str) -> Option<Arc<SharedArray>> {
        self.map.remove(name).map(|(_, array)| array)
    }

    /// Number of stored arrays
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}
