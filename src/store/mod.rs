//! Keyed container of type-erased owned values.
//!
//! Every value is stored next to the function that knows how to release it, so the
//! store can hold heterogeneous records and tear them down without knowing their
//! concrete types. Typed access goes through `Any` downcasts.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque owned handle to a stored value.
pub type Handle = Box<dyn Any + Send + Sync>;

/// Erased destructor: consumes a handle previously produced for the matching type.
pub type FreeFn = fn(Handle);

/// Types that can be stored in an [`ErasedStore`] and released through a [`FreeFn`].
pub trait Release: Any + Send + Sync + Sized {
    /// Release a handle holding `Self`.
    ///
    /// Passing a handle of another type is a caller bug; implementations panic
    /// rather than leak or misinterpret it.
    fn release(handle: Handle);

    /// Box `self` into a handle paired with its destructor.
    fn into_erased(self) -> (Handle, FreeFn) {
        let handle: Handle = Box::new(self);
        (handle, Self::release)
    }
}

struct Slot {
    value: Option<Handle>,
    free: FreeFn,
}

impl Slot {
    fn release(&mut self) {
        if let Some(handle) = self.value.take() {
            (self.free)(handle);
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Map from key to erased value + destructor.
pub struct ErasedStore<K: Ord> {
    slots: BTreeMap<K, Slot>,
}

impl<K: Ord> Default for ErasedStore<K> {
    fn default() -> Self {
        Self { slots: BTreeMap::new() }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for ErasedStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedStore")
            .field("keys", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Ord> ErasedStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `key`. Any value already under `key` is released first.
    pub fn insert(&mut self, key: K, handle: Handle, free: FreeFn) {
        let slot = Slot {
            value: Some(handle),
            free,
        };
        // The replaced slot releases its value when dropped here.
        drop(self.slots.insert(key, slot));
    }

    pub fn insert_owned<T: Release>(&mut self, key: K, value: T) {
        let (handle, free) = value.into_erased();
        self.insert(key, handle, free);
    }

    /// Typed shared access. `None` if the key is missing or holds another type.
    pub fn get<T: Any>(&self, key: &K) -> Option<&T> {
        self.slots
            .get(key)
            .and_then(|slot| slot.value.as_ref())
            .and_then(|handle| handle.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &K) -> Option<&mut T> {
        self.slots
            .get_mut(key)
            .and_then(|slot| slot.value.as_mut())
            .and_then(|handle| handle.downcast_mut::<T>())
    }

    /// Release and remove the value under `key`. Returns whether a value was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }
}
