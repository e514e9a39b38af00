// ABOUTME: Monotonic batch progress counter
// ABOUTME: Single writer advances, observers read consistent snapshots

use std::sync::atomic::{AtomicU64, Ordering};

/// A `(current, total)` counter for one batch run.
///
/// `total` is fixed at construction; only the owning batch runner calls
/// `advance`, while any number of observers may call `snapshot`.
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            current: AtomicU64::new(0),
            total,
        }
    }

    /// Counts one attempted target, saturating at `total`. Returns the
    /// snapshot after the increment.
    pub fn advance(&self) -> (u64, u64) {
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < self.total).then_some(current + 1)
            });
        self.snapshot()
    }

    pub fn snapshot(&self) -> (u64, u64) {
        (self.current.load(Ordering::SeqCst), self.total)
    }

    pub fn is_complete(&self) -> bool {
        let (current, total) = self.snapshot();
        current >= total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_up_to_total() {
        let tracker = ProgressTracker::new(3);
        assert_eq!(tracker.snapshot(), (0, 3));
        assert_eq!(tracker.advance(), (1, 3));
        assert_eq!(tracker.advance(), (2, 3));
        assert_eq!(tracker.advance(), (3, 3));
        assert!(tracker.is_complete());
    }

    #[test]
    fn advance_saturates_at_total() {
        let tracker = ProgressTracker::new(1);
        tracker.advance();
        assert_eq!(tracker.advance(), (1, 1));
    }

    #[test]
    fn zero_total_is_immediately_complete() {
        let tracker = ProgressTracker::new(0);
        assert!(tracker.is_complete());
        assert_eq!(tracker.advance(), (0, 0));
    }
}
