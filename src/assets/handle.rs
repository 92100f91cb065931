//! Shared-resource handles
//!
//! Provides type-safe handles for referencing shared resources (meshes,
//! materials, models) without owning them.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Global counter for generating unique resource IDs
static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique resource ID
fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A strong handle to a shared resource of type `T`.
///
/// The resource stays alive as long as at least one `ResourceHandle` exists;
/// its lifetime is that of the longest holder. Components must never hold
/// strong handles across frames - they hold [`WeakResourceHandle`]s and
/// re-validate before every use, since a resource may be evicted from its
/// store between frames.
#[derive(Debug)]
pub struct ResourceHandle<T> {
    /// Unique identifier for this resource
    id: u64,
    /// Reference-counted pointer to the resource
    inner: Arc<T>,
}

impl<T> ResourceHandle<T> {
    /// Create a new handle wrapping the given value
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            id: next_id(),
            inner: Arc::new(value),
        }
    }

    /// Get the unique ID of this resource
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Get a reference to the underlying resource
    #[must_use]
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Create a weak handle that doesn't keep the resource alive
    #[must_use]
    pub fn downgrade(&self) -> WeakResourceHandle<T> {
        WeakResourceHandle {
            id: self.id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for ResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ResourceHandle<T> {}

impl<T> Hash for ResourceHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> std::ops::Deref for ResourceHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A weak handle to a shared resource.
///
/// Reports "expired" instead of dangling when the resource is dropped.
/// Use `upgrade()` to attempt to get a strong handle for the duration of
/// one use.
#[derive(Debug)]
pub struct WeakResourceHandle<T> {
    /// Unique identifier for this resource
    id: u64,
    /// Weak reference to the resource
    inner: Weak<T>,
}

impl<T> WeakResourceHandle<T> {
    /// Create a handle that is expired from the start.
    ///
    /// Useful as a placeholder for components constructed without a
    /// backing resource; they stay constructible but report invalid.
    #[must_use]
    pub fn expired() -> Self {
        Self {
            id: 0,
            inner: Weak::new(),
        }
    }

    /// Get the unique ID of this resource
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Attempt to upgrade to a strong handle.
    ///
    /// Returns `None` if the resource has been dropped or evicted.
    #[must_use]
    pub fn upgrade(&self) -> Option<ResourceHandle<T>> {
        self.inner
            .upgrade()
            .map(|inner| ResourceHandle { id: self.id, inner })
    }

    /// Check if the resource is still alive
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for WeakResourceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for WeakResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for WeakResourceHandle<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_creation() {
        let handle = ResourceHandle::new(42_i32);
        assert_eq!(*handle.get(), 42);
    }

    #[test]
    fn test_handle_clone_shares_id() {
        let handle1 = ResourceHandle::new("test".to_string());
        let handle2 = handle1.clone();
        assert_eq!(handle1.id(), handle2.id());
        assert_eq!(handle1, handle2);
    }

    #[test]
    fn test_weak_upgrade() {
        let strong = ResourceHandle::new(100_u32);
        let weak = strong.downgrade();

        assert!(weak.is_alive());
        let upgraded = weak.upgrade();
        assert!(upgraded.is_some());

        drop(strong);
        drop(upgraded);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_expired_placeholder() {
        let weak = WeakResourceHandle::<u32>::expired();
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }
}
