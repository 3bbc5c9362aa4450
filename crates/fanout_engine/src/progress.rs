use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use crate::{ProgressSink, ProgressSnapshot};

/// Counts executed tasks and publishes the percentage after each one.
///
/// The increment and the emit happen under one lock, so the sink observes a
/// non-decreasing sequence even when workers finish concurrently.
pub struct ProgressAggregator<'a> {
    total: NonZeroUsize,
    completed: Mutex<usize>,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressAggregator<'a> {
    pub fn new(total: NonZeroUsize, sink: &'a dyn ProgressSink) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            sink,
        }
    }

    /// Call exactly once per task that actually executed.
    pub fn record_completion(&self) -> ProgressSnapshot {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        let total = self.total.get();
        debug_assert!(*completed < total, "progress recorded more than once per task");
        *completed += 1;
        let snapshot = ProgressSnapshot {
            completed: *completed,
            total,
            percent: percent(*completed, total),
        };
        self.sink.progress(snapshot);
        snapshot
    }

    pub fn completed(&self) -> usize {
        *self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn total(&self) -> usize {
        self.total.get()
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    // `completed <= total`, so the quotient is at most 100.
    (completed * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_floors() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 7), 0);
    }
}
