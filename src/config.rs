//! Construction-time configuration for a [`crate::SegFitAllocator`].
//!
//! Mirrors the Cargo feature set (`guards`, `boundary-tags`,
//! `leak-detection`, `stats`, `cache-locality`): a feature compiled out
//! forces the matching [`AllocatorConfig`] field to its disabled value,
//! since the code paths it would enable are not compiled in. `debug_level`
//! and `thread_safe` have no Cargo-feature counterpart — they are runtime
//! choices the base spec documents as orthogonal to the compile-time
//! toggles.

/// Header/footer sentinel written at a block's low and high header edges.
pub const SENTINEL_VALUE: u32 = 0xCAFE_BABE;

/// Footer sentinel, distinct from the header sentinel so a corrupted
/// footer cannot be mistaken for a valid header.
pub const FOOTER_SENTINEL: u32 = 0xDEAD_BEEF;

/// Fill byte for red-zone guard bands.
pub const GUARD_VALUE: u8 = 0xFE;

/// All payload sizes and user pointers are multiples of this.
pub const ALIGNMENT: usize = 16;

/// Upper bound (inclusive) of each of the eight size classes. The eighth
/// class is a catch-all with no upper bound.
pub const SIZE_CLASS_BOUNDS: [usize; 7] = [32, 64, 128, 256, 512, 1024, 2048];

/// Number of segregated free-list size classes.
pub const NUM_SIZE_CLASSES: usize = SIZE_CLASS_BOUNDS.len() + 1;

/// Returns the size-class index for a payload size: the lowest index whose
/// bound is `>= size`, or the catch-all class `NUM_SIZE_CLASSES - 1`.
#[inline]
#[must_use]
pub fn class_of(size: usize) -> usize {
    SIZE_CLASS_BOUNDS
        .iter()
        .position(|&bound| size <= bound)
        .unwrap_or(NUM_SIZE_CLASSES - 1)
}

/// Verbosity of internal self-checking, independent of the Cargo feature
/// set: higher levels call [`crate::allocator::engine::SegFitAllocator::validate_block`]
/// and the full `walk_arena` more often, at a runtime cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DebugLevel {
    /// No extra validation beyond what correctness requires.
    #[default]
    Off,
    /// Validate the block touched by each operation.
    Basic,
    /// Additionally walk the whole arena and cross-check statistics after
    /// every mutating operation. Expensive; intended for test builds.
    Full,
}

/// Construction-time engine configuration.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Total size of the pre-reserved arena, in bytes.
    pub heap_size: usize,
    /// Runtime verbosity of self-checking.
    pub debug_level: DebugLevel,
    /// Whether the mutex guarding engine state is taken as a genuine lock
    /// (`true`) or the caller is asserting single-threaded use (`false`).
    /// Either way the same lock type protects the state; see the base
    /// spec's concurrency model for why no unlocked fast path exists.
    pub thread_safe: bool,
    /// Collect and expose [`crate::allocator::stats::AllocatorStats`].
    pub enable_stats: bool,
    /// Reserve and stamp red-zone guard bands around every payload.
    pub memory_guards: bool,
    /// Maintain footers and attempt backward coalescing.
    pub boundary_tags: bool,
    /// Maintain address-ascending order within a free list's low classes.
    pub cache_locality: bool,
    /// Record an [`crate::allocator::tracking::AllocationRecord`] per live
    /// allocation for leak reporting.
    pub leak_detection: bool,
}

impl AllocatorConfig {
    /// A configuration with every optional feature enabled that this build
    /// was compiled with support for.
    #[must_use]
    pub fn new(heap_size: usize) -> Self {
        Self {
            heap_size,
            debug_level: DebugLevel::Off,
            thread_safe: true,
            enable_stats: cfg!(feature = "stats"),
            memory_guards: cfg!(feature = "guards"),
            boundary_tags: cfg!(feature = "boundary-tags"),
            cache_locality: cfg!(feature = "cache-locality"),
            leak_detection: cfg!(feature = "leak-detection"),
        }
    }

    #[must_use]
    pub fn with_debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    #[must_use]
    pub fn with_thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    /// Enables statistics collection. No-op, with a debug-time assertion,
    /// if the crate was built without the `stats` feature.
    #[must_use]
    pub fn with_stats(mut self, enable: bool) -> Self {
        debug_assert!(!enable || cfg!(feature = "stats"), "stats feature not compiled in");
        self.enable_stats = enable && cfg!(feature = "stats");
        self
    }

    #[must_use]
    pub fn with_guards(mut self, enable: bool) -> Self {
        debug_assert!(!enable || cfg!(feature = "guards"), "guards feature not compiled in");
        self.memory_guards = enable && cfg!(feature = "guards");
        self
    }

    #[must_use]
    pub fn with_boundary_tags(mut self, enable: bool) -> Self {
        debug_assert!(
            !enable || cfg!(feature = "boundary-tags"),
            "boundary-tags feature not compiled in"
        );
        self.boundary_tags = enable && cfg!(feature = "boundary-tags");
        self
    }

    #[must_use]
    pub fn with_cache_locality(mut self, enable: bool) -> Self {
        debug_assert!(
            !enable || cfg!(feature = "cache-locality"),
            "cache-locality feature not compiled in"
        );
        self.cache_locality = enable && cfg!(feature = "cache-locality");
        self
    }

    #[must_use]
    pub fn with_leak_detection(mut self, enable: bool) -> Self {
        debug_assert!(
            !enable || cfg!(feature = "leak-detection"),
            "leak-detection feature not compiled in"
        );
        self.leak_detection = enable && cfg!(feature = "leak-detection");
        self
    }
}
