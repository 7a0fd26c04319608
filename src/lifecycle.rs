//! Cancellation generations for ingestion tasks.
//!
//! Every started ingestion run holds the generation it was started under.
//! Cancelling advances the generation while holding the same lock that
//! guards publishing, so once [`Generation::advance`] returns no task of an
//! older run can publish again, even one that is mid-tick on another worker.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

// ============================================================================
// Generation
// ============================================================================

/// Shared generation counter.
#[derive(Debug, Clone, Default)]
pub(crate) struct Generation {
    current: Arc<Mutex<u64>>,
}

impl Generation {
    /// Invalidates every outstanding token and returns a fresh one.
    pub fn advance(&self) -> u64 {
        let mut current = self.current.lock();
        *current += 1;
        *current
    }

    /// Returns `true` while `token` has not been invalidated.
    #[inline]
    pub fn is_current(&self, token: u64) -> bool {
        *self.current.lock() == token
    }

    /// Runs `f` only if `token` is still current, holding the lock throughout.
    pub fn run_if_current<R>(&self, token: u64, f: impl FnOnce() -> R) -> Option<R> {
        let current = self.current.lock();
        (*current == token).then(f)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_old_tokens() {
        let generation = Generation::default();
        let first = generation.advance();
        assert!(generation.is_current(first));
        assert_eq!(generation.run_if_current(first, || 5), Some(5));

        let second = generation.advance();
        assert!(!generation.is_current(first));
        assert_eq!(generation.run_if_current(first, || 5), None);
        assert!(generation.is_current(second));
    }

    #[test]
    fn test_clones_share_counter() {
        let generation = Generation::default();
        let token = generation.advance();
        generation.clone().advance();
        assert!(!generation.is_current(token));
    }
}
