//! Thin read-only traits external dumpers (heap maps, stats printers) use
//! to query the engine without depending on its internal layout.

use crate::allocator::stats::AllocatorStats;

/// Coarse memory-usage view: current load without the full statistics
/// snapshot.
pub trait MemoryUsage {
    /// Bytes currently live (allocated and not yet freed).
    fn used_memory(&self) -> usize;

    /// Bytes still available for allocation, or `None` if unbounded.
    fn available_memory(&self) -> Option<usize>;

    /// Sum of used and available, or `None` if unbounded.
    fn total_memory(&self) -> Option<usize> {
        self.available_memory().map(|available| self.used_memory() + available)
    }

    /// Fraction of total capacity currently in use, 0.0 to 100.0.
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().and_then(|total| {
            if total == 0 {
                Some(0.0)
            } else {
                Some((self.used_memory() as f32 / total as f32) * 100.0)
            }
        })
    }
}

/// Full statistics snapshot, recomputed from a free-list/used-list walk.
pub trait StatisticsProvider {
    fn stats(&self) -> AllocatorStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture;
    impl MemoryUsage for Fixture {
        fn used_memory(&self) -> usize {
            40
        }
        fn available_memory(&self) -> Option<usize> {
            Some(60)
        }
    }

    #[test]
    fn total_and_percent_derive_from_used_and_available() {
        let f = Fixture;
        assert_eq!(f.total_memory(), Some(100));
        assert_eq!(f.memory_usage_percent(), Some(40.0));
    }
}
