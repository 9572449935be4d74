//! # segfit
//!
//! A segregated free-list allocator over a single fixed-size arena.
//! Eight size classes, best-fit-within-class search with class fallback,
//! boundary-tag coalescing, optional red-zone guards and leak tracking.
//!
//! ```
//! use segfit::SegFitAllocator;
//! use segfit::config::AllocatorConfig;
//!
//! let engine = SegFitAllocator::new(AllocatorConfig::new(64 * 1024));
//! let ptr = engine.allocate(128);
//! assert!(!ptr.is_null());
//! unsafe { engine.free(ptr) };
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allocator;
pub mod block;
pub mod config;
pub mod error;
pub mod utils;

pub use allocator::{AllocatorStats, SegFitAllocator};
pub use config::AllocatorConfig;
pub use error::{AllocError, AllocErrorKind, AllocResult};

/// Initializes the process-wide default allocator instance.
pub fn initialize() {
    allocator::GlobalAllocator::get().initialize();
}

/// Tears down the process-wide default allocator instance, if one was
/// ever built.
pub fn teardown() {
    if let Some(engine) = allocator::GlobalAllocator::try_get() {
        engine.teardown();
    }
}

/// Allocates from the process-wide default allocator.
#[track_caller]
#[must_use]
pub fn allocate(size: usize) -> *mut u8 {
    allocator::GlobalAllocator::get().allocate(size)
}

/// Frees a pointer previously returned by [`allocate`]/[`resize`]/
/// [`count_init`] on the process-wide default allocator.
///
/// # Safety
/// See [`SegFitAllocator::free`].
pub unsafe fn free(ptr: *mut u8) {
    unsafe { allocator::GlobalAllocator::get().free(ptr) };
}

/// Resizes a pointer previously returned by the process-wide default
/// allocator.
#[track_caller]
#[must_use]
pub fn resize(ptr: *mut u8, new_size: usize) -> *mut u8 {
    allocator::GlobalAllocator::get().resize(ptr, new_size)
}

/// Zero-initialized array allocation from the process-wide default
/// allocator.
#[track_caller]
#[must_use]
pub fn count_init(n: usize, element_size: usize) -> *mut u8 {
    allocator::GlobalAllocator::get().count_init(n, element_size)
}

/// Returns the user-visible size of a live allocation from the
/// process-wide default allocator.
#[must_use]
pub fn size_of(ptr: *mut u8) -> usize {
    allocator::GlobalAllocator::get().size_of(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_function_surface_round_trips() {
        initialize();
        let ptr = allocate(64);
        assert!(!ptr.is_null());
        assert_eq!(size_of(ptr), 64);
        unsafe { free(ptr) };
    }
}
