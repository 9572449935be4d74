//! Engine statistics: aggregate counters recomputed from a full free-list
//! walk at the end of each mutating operation, so they never drift from
//! the arena's actual state.

use crate::config::NUM_SIZE_CLASSES;

#[cfg(feature = "std")]
use std::time::Duration;

/// Snapshot of allocator-wide statistics.
#[derive(Debug, Clone, Copy)]
pub struct AllocatorStats {
    pub live_bytes: usize,
    pub live_blocks: usize,
    pub free_bytes: usize,
    pub free_blocks: usize,
    pub total_allocations: u64,
    pub total_frees: u64,
    pub failed_allocations: u64,
    pub requested_bytes: usize,
    pub overhead_bytes: usize,
    pub largest_free_block: usize,
    pub smallest_free_block: usize,
    pub live_bytes_per_class: [usize; NUM_SIZE_CLASSES],
    #[cfg(feature = "std")]
    pub time_in_allocate: Duration,
    #[cfg(feature = "std")]
    pub time_in_free: Duration,
}

impl AllocatorStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            live_bytes: 0,
            live_blocks: 0,
            free_bytes: 0,
            free_blocks: 0,
            total_allocations: 0,
            total_frees: 0,
            failed_allocations: 0,
            requested_bytes: 0,
            overhead_bytes: 0,
            largest_free_block: 0,
            smallest_free_block: 0,
            live_bytes_per_class: [0; NUM_SIZE_CLASSES],
            #[cfg(feature = "std")]
            time_in_allocate: Duration::ZERO,
            #[cfg(feature = "std")]
            time_in_free: Duration::ZERO,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Overhead as a fraction of total live bytes (header/footer/guard cost
    /// vs. what the caller actually asked for).
    #[must_use]
    pub fn overhead_ratio(&self) -> f64 {
        let total = self.requested_bytes + self.overhead_bytes;
        if total == 0 {
            0.0
        } else {
            self.overhead_bytes as f64 / total as f64
        }
    }

    /// Failure rate across every allocation attempt, successful or not.
    #[must_use]
    pub fn allocation_failure_rate(&self) -> f64 {
        let attempts = self.total_allocations + self.failed_allocations;
        if attempts == 0 {
            0.0
        } else {
            self.failed_allocations as f64 / attempts as f64
        }
    }
}

impl Default for AllocatorStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_ratio_is_zero_with_no_activity() {
        let stats = AllocatorStats::new();
        assert_eq!(stats.overhead_ratio(), 0.0);
        assert_eq!(stats.allocation_failure_rate(), 0.0);
    }

    #[test]
    fn overhead_ratio_reflects_recorded_bytes() {
        let mut stats = AllocatorStats::new();
        stats.requested_bytes = 100;
        stats.overhead_bytes = 25;
        assert!((stats.overhead_ratio() - 0.2).abs() < 1e-9);
    }
}
