//! Process-wide default instance of [`SegFitAllocator`], wrapping a
//! `OnceLock`/`spin::Once` singleton the way the teacher crate's
//! `GlobalAllocatorManager` wraps its allocator registry. Unlike that
//! registry, this crate manages exactly one engine: the base spec's
//! `initialize()`/`teardown()` free functions are just this singleton's
//! construction and reset.

use crate::allocator::engine::SegFitAllocator;
use crate::config::AllocatorConfig;

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        static GLOBAL: std::sync::OnceLock<SegFitAllocator> = std::sync::OnceLock::new();
    } else {
        static GLOBAL: spin::Once<SegFitAllocator> = spin::Once::new();
    }
}

/// Default heap size for the process-wide instance when no configuration
/// is supplied before first use.
const DEFAULT_HEAP_SIZE: usize = 1 << 20;

/// Handle to the process-wide [`SegFitAllocator`].
///
/// Most callers never touch this directly; the crate-level `initialize`/
/// `teardown`/`allocate`/... free functions delegate here. Constructing a
/// [`SegFitAllocator`] directly (bypassing this singleton) remains
/// available for tests or callers that want several independent arenas.
pub struct GlobalAllocator;

impl GlobalAllocator {
    /// Returns the process-wide instance, building it with a default
    /// configuration on first access.
    #[must_use]
    pub fn get() -> &'static SegFitAllocator {
        #[cfg(feature = "std")]
        {
            GLOBAL.get_or_init(|| SegFitAllocator::new(AllocatorConfig::new(DEFAULT_HEAP_SIZE)))
        }
        #[cfg(not(feature = "std"))]
        {
            GLOBAL.call_once(|| SegFitAllocator::new(AllocatorConfig::new(DEFAULT_HEAP_SIZE)));
            GLOBAL.get().expect("initialized by call_once above")
        }
    }

    /// Returns the process-wide instance if one has already been built,
    /// without constructing it.
    #[must_use]
    pub fn try_get() -> Option<&'static SegFitAllocator> {
        GLOBAL.get()
    }

    /// Builds the process-wide instance with an explicit configuration.
    /// Only takes effect on the first call across the process; later calls
    /// return the already-built instance, matching the teacher crate's
    /// `GlobalAllocatorManager::init` idempotency.
    pub fn init_with(config: AllocatorConfig) -> &'static SegFitAllocator {
        #[cfg(feature = "std")]
        {
            GLOBAL.get_or_init(|| SegFitAllocator::new(config))
        }
        #[cfg(not(feature = "std"))]
        {
            GLOBAL.call_once(|| SegFitAllocator::new(config));
            GLOBAL.get().expect("initialized by call_once above")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_idempotent() {
        let a = GlobalAllocator::get() as *const SegFitAllocator;
        let b = GlobalAllocator::get() as *const SegFitAllocator;
        assert_eq!(a, b);
    }
}
