//! The allocator engine and its supporting registries: layout, free/used
//! lists, search and split, coalescing, tracking, statistics, and the
//! process-wide singleton.

mod coalesce;
pub mod engine;
mod freelist;
mod manager;
mod search;
pub mod stats;
#[cfg(feature = "leak-detection")]
pub mod tracking;
pub mod traits;
mod usedlist;

pub use engine::{BlockInfo, SegFitAllocator};
pub use manager::GlobalAllocator;
pub use stats::AllocatorStats;
#[cfg(feature = "leak-detection")]
pub use tracking::AllocationRecord;
pub use traits::{MemoryUsage, StatisticsProvider};

impl traits::StatisticsProvider for SegFitAllocator {
    fn stats(&self) -> AllocatorStats {
        SegFitAllocator::stats(self)
    }
}

impl traits::MemoryUsage for SegFitAllocator {
    fn used_memory(&self) -> usize {
        SegFitAllocator::stats(self).live_bytes
    }

    fn available_memory(&self) -> Option<usize> {
        Some(SegFitAllocator::stats(self).free_bytes)
    }
}
