// ABOUTME: Per-target mutual exclusion for in-flight operations
// ABOUTME: Shared between the batch runner and manual single-check paths

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks which target ids currently have an operation in flight.
///
/// Cloning shares the underlying busy set, so a batch run and a manual
/// check contend on the same state. There is no queueing: a caller that
/// loses `try_acquire` must skip or decline the operation, not wait.
#[derive(Debug, Clone, Default)]
pub struct SingleFlightGuard {
    busy: Arc<Mutex<HashSet<String>>>,
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` busy and returns true, unless an earlier acquire is
    /// still outstanding. Does not verify the key names a real target.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    /// Clears the busy mark unconditionally.
    pub fn release(&self, key: &str) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_busy_key_fails() {
        let guard = SingleFlightGuard::new();
        assert!(guard.try_acquire("m1"));
        assert!(!guard.try_acquire("m1"));
        guard.release("m1");
        assert!(guard.try_acquire("m1"));
    }

    #[test]
    fn keys_are_independent() {
        let guard = SingleFlightGuard::new();
        assert!(guard.try_acquire("m1"));
        assert!(guard.try_acquire("m2"));
    }

    #[test]
    fn release_without_acquire_is_harmless() {
        let guard = SingleFlightGuard::new();
        guard.release("m1");
        assert!(guard.try_acquire("m1"));
    }

    #[test]
    fn clones_share_the_busy_set() {
        let guard = SingleFlightGuard::new();
        let other = guard.clone();
        assert!(guard.try_acquire("m1"));
        assert!(!other.try_acquire("m1"));
        other.release("m1");
        assert!(guard.try_acquire("m1"));
    }

    #[test]
    fn concurrent_acquires_admit_at_most_one() {
        let guard = SingleFlightGuard::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let guard = guard.clone();
            handles.push(std::thread::spawn(move || guard.try_acquire("m1")));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join())
            .filter(|r| matches!(r, Ok(true)))
            .count();
        assert_eq!(wins, 1);
    }
}
