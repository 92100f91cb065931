//! Resource storage and management
//!
//! Provides centralized storage for shared resources with name-based lookup.
//! Stores own the only strong handles; everything else in the engine holds
//! weak handles and re-validates before use. Evicting a name drops the
//! store's strong handle, which expires every weak handle out in the wild.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use super::handle::{ResourceHandle, WeakResourceHandle};

/// Centralized storage for all resources of a specific type, keyed by name.
pub struct ResourceStore<T> {
    /// Resources indexed by their registered name
    entries: FxHashMap<String, ResourceHandle<T>>,
}

impl<T> ResourceStore<T> {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Insert a resource under a name and return a strong handle to it.
    ///
    /// Inserting under an existing name replaces the previous resource;
    /// weak handles to the old one expire once outstanding strong handles
    /// are dropped.
    pub fn insert(&mut self, name: impl Into<String>, resource: T) -> ResourceHandle<T> {
        let handle = ResourceHandle::new(resource);
        self.entries.insert(name.into(), handle.clone());
        handle
    }

    /// Get a strong handle by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ResourceHandle<T>> {
        self.entries.get(name).cloned()
    }

    /// Get a weak handle by name.
    ///
    /// This is what components should hold on to.
    #[must_use]
    pub fn get_weak(&self, name: &str) -> Option<WeakResourceHandle<T>> {
        self.entries.get(name).map(ResourceHandle::downgrade)
    }

    /// Check if a resource exists under a name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Evict a resource by name.
    ///
    /// Returns true if a resource was evicted. Weak handles held by
    /// components expire once the last strong handle drops.
    pub fn evict(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Get the number of stored resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all resources
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over names and handles
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceHandle<T>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource manager holding one store per resource type.
pub struct Resources {
    /// Type-erased storage for each resource type
    stores: FxHashMap<TypeId, Box<dyn Any>>,
}

impl Resources {
    /// Create a new resource manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: FxHashMap::default(),
        }
    }

    /// Get or create the store for a specific resource type
    pub fn store_mut<T: 'static>(&mut self) -> &mut ResourceStore<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ResourceStore::<T>::new()))
            .downcast_mut::<ResourceStore<T>>()
            .expect("type mismatch in resource storage")
    }

    /// Get the store for a resource type, if any resources of it exist
    #[must_use]
    pub fn store<T: 'static>(&self) -> Option<&ResourceStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|s| s.downcast_ref::<ResourceStore<T>>())
    }

    /// Insert a resource and return a strong handle
    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, resource: T) -> ResourceHandle<T> {
        self.store_mut::<T>().insert(name, resource)
    }

    /// Look up a resource by name
    #[must_use]
    pub fn get<T: 'static>(&self, name: &str) -> Option<ResourceHandle<T>> {
        self.store::<T>().and_then(|s| s.get(name))
    }

    /// Look up a weak handle by name
    #[must_use]
    pub fn get_weak<T: 'static>(&self, name: &str) -> Option<WeakResourceHandle<T>> {
        self.store::<T>().and_then(|s| s.get_weak(name))
    }

    /// Evict a resource by name
    pub fn evict<T: 'static>(&mut self, name: &str) -> bool {
        self.store_mut::<T>().evict(name)
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}
