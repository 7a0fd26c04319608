//! Atomically swapped snapshot cache.
//!
//! Roster and tyre caches are refreshed by overwrite from one task and read
//! from others. Readers clone the current `Arc` and keep using it even if a
//! refresh lands mid-read.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

// ============================================================================
// SharedCache
// ============================================================================

/// Shared, wholesale-replaced snapshot of `T`.
pub struct SharedCache<T> {
    current: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for SharedCache<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: Default> Default for SharedCache<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for SharedCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCache").finish_non_exhaustive()
    }
}

impl<T> SharedCache<T> {
    /// Creates a cache holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(value))),
        }
    }

    /// Returns the current snapshot.
    #[inline]
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&*self.current.read())
    }

    /// Replaces the snapshot.
    #[inline]
    pub fn store(&self, value: T) {
        *self.current.write() = Arc::new(value);
    }

    /// Replaces the snapshot with one derived from the current one.
    ///
    /// The write lock is held for the whole update, so concurrent updates do
    /// not lose each other's changes.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let mut guard = self.current.write();
        let next = f(&**guard);
        *guard = Arc::new(next);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_store() {
        let cache = SharedCache::new(vec![1, 2]);
        let before = cache.load();
        cache.store(vec![3]);
        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*cache.load(), vec![3]);
    }

    #[test]
    fn test_update_derives_from_current() {
        let cache: SharedCache<Vec<u32>> = SharedCache::default();
        cache.update(|v| {
            let mut next = v.clone();
            next.push(7);
            next
        });
        assert_eq!(*cache.load(), vec![7]);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SharedCache::new(1u8);
        let other = cache.clone();
        other.store(2);
        assert_eq!(*cache.load(), 2);
    }
}
