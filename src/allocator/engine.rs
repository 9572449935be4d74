//! The allocator engine: owns the arena and every registry, and
//! implements the lifecycle API (`allocate`/`free`/`resize`/`count_init`/
//! `size_of`/`initialize`/`teardown`) behind a single mutex.
//!
//! Call-site capture uses `#[track_caller]` rather than explicit `file`/
//! `line` parameters threaded by the caller — idiomatic Rust already gives
//! us the call site for free, so the tracking record's `source_file`/
//! `source_line` are populated from `core::panic::Location::caller()`
//! instead of asking every call site to pass them by hand.

use core::panic::Location;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use alloc::vec::Vec;

#[cfg(feature = "std")]
use std::time::Instant;

use crate::allocator::coalesce::coalesce;
use crate::allocator::freelist::FreeListRegistry;
use crate::allocator::search::split;
use crate::allocator::stats::AllocatorStats;
#[cfg(feature = "leak-detection")]
use crate::allocator::tracking::{AllocationRecord, TrackingList};
use crate::allocator::usedlist::UsedListRegistry;
use crate::block::{footer_at, footer_offset, header_at, write_footer, BlockHeader, FOOTER_SIZE, HEADER_SIZE};
use crate::config::{AllocatorConfig, DebugLevel};
use crate::error::{report, AllocError, CorruptionKind, Site};
use crate::utils::{all_bytes_equal, fill_pattern, secure_zero};

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        type EngineMutex<T> = parking_lot::Mutex<T>;
    } else {
        type EngineMutex<T> = spin::Mutex<T>;
    }
}

/// Description of one block, for external dumpers. Read-only: walking the
/// arena never mutates it.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub offset: usize,
    pub payload_size: usize,
    pub free: bool,
    pub alloc_id: u64,
}

struct EngineState {
    arena: Vec<u8>,
    free_list: FreeListRegistry,
    used_list: UsedListRegistry,
    #[cfg(feature = "leak-detection")]
    tracking: TrackingList,
    stats: AllocatorStats,
}

impl EngineState {
    fn empty() -> Self {
        Self {
            arena: Vec::new(),
            free_list: FreeListRegistry::new(),
            used_list: UsedListRegistry::new(),
            #[cfg(feature = "leak-detection")]
            tracking: TrackingList::new(),
            stats: AllocatorStats::new(),
        }
    }

    fn base(&mut self) -> *mut u8 {
        self.arena.as_mut_ptr()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }
}

/// A segregated free-list allocator over one fixed-size arena.
pub struct SegFitAllocator {
    config: AllocatorConfig,
    inner: EngineMutex<EngineState>,
    next_alloc_id: AtomicU64,
    initialized: AtomicBool,
    /// Arena base address and length, mirrored out of the mutex so `size_of`
    /// can resolve a pointer without contending with `allocate`/`free`. The
    /// arena's backing `Vec` is never resized after `initialize`, so the
    /// address stored here stays valid until `teardown`.
    base_addr: AtomicUsize,
    arena_len: AtomicUsize,
}

impl SegFitAllocator {
    /// Builds an allocator with the given configuration. The arena is not
    /// reserved until the first call that needs it (`allocate`, or an
    /// explicit `initialize`).
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            inner: EngineMutex::new(EngineState::empty()),
            next_alloc_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            base_addr: AtomicUsize::new(0),
            arena_len: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Reserves the arena, zero-fills it, and links one Free block spanning
    /// its whole length. Idempotent: a second call is a no-op.
    pub fn initialize(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        let mut state = self.inner.lock();
        if self.initialized.load(Ordering::Acquire) {
            return;
        }
        state.arena = alloc::vec![0u8; self.config.heap_size];
        let base = state.base();
        unsafe {
            *base.cast::<BlockHeader>() = BlockHeader::new_free(self.usable_payload(self.config.heap_size));
            write_footer(base, 0, self.usable_payload(self.config.heap_size), true);
            state.free_list.insert(base, 0, self.config.cache_locality);
        }
        self.base_addr.store(base as usize, Ordering::Release);
        self.arena_len.store(state.len(), Ordering::Release);
        self.initialized.store(true, Ordering::Release);
    }

    /// Frees the tracking list and the arena, clears every registry, and
    /// marks the engine uninitialized. Further operations are undefined
    /// until `initialize` runs again.
    pub fn teardown(&self) {
        let mut state = self.inner.lock();
        self.initialized.store(false, Ordering::Release);
        self.base_addr.store(0, Ordering::Release);
        self.arena_len.store(0, Ordering::Release);
        state.arena = Vec::new();
        state.free_list = FreeListRegistry::new();
        state.used_list = UsedListRegistry::new();
        #[cfg(feature = "leak-detection")]
        {
            state.tracking.clear();
        }
        state.stats.reset();
    }

    fn ensure_initialized(&self) {
        if !self.initialized.load(Ordering::Acquire) {
            self.initialize();
        }
    }

    /// `HEAP_SIZE` minus one header and one footer: the payload of the
    /// single block spanning a freshly initialized arena.
    fn usable_payload(&self, heap_size: usize) -> usize {
        heap_size.saturating_sub(HEADER_SIZE + FOOTER_SIZE)
    }

    /// Allocates `requested` bytes, returning a zeroed, `ALIGNMENT`-aligned
    /// pointer, or null if no block is large enough.
    #[track_caller]
    #[must_use]
    pub fn allocate(&self, requested: usize) -> *mut u8 {
        let location = Location::caller();
        self.allocate_at(requested, location.file(), location.line())
    }

    /// # Parameters
    /// `file`/`line` are recorded in the tracking record for leak
    /// reporting; callers that do not need a specific call site can use
    /// [`Self::allocate`], which captures it automatically.
    #[must_use]
    pub fn allocate_at(&self, requested: usize, file: &'static str, line: u32) -> *mut u8 {
        #[cfg(feature = "std")]
        let started = self.config.enable_stats.then(Instant::now);

        let result = self.allocate_at_timed(requested, file, line);

        #[cfg(feature = "std")]
        if let Some(started) = started {
            self.inner.lock().stats.time_in_allocate += started.elapsed();
        }

        result
    }

    fn allocate_at_timed(&self, requested: usize, file: &'static str, line: u32) -> *mut u8 {
        self.ensure_initialized();
        if requested == 0 {
            report(AllocError::invalid_argument(Site::Allocate));
            return ptr::null_mut();
        }

        let guards = self.config.memory_guards;
        let aligned_request = crate::utils::align_up(requested, crate::config::ALIGNMENT);
        let aligned_size = if guards {
            aligned_request + 2 * crate::config::ALIGNMENT
        } else {
            aligned_request
        };

        let mut state = self.inner.lock();
        let base = state.base();

        let offset = match unsafe { state.free_list.find(base, aligned_size) } {
            Some(offset) => offset,
            None => {
                state.stats.failed_allocations += 1;
                report(AllocError::out_of_memory(requested));
                return ptr::null_mut();
            }
        };

        unsafe { state.free_list.unlink(base, offset) };
        if let Some(suffix) = unsafe { split(base, offset, aligned_size, guards) } {
            unsafe { state.free_list.insert(base, suffix, self.config.cache_locality) };
        }

        let alloc_id = self.next_alloc_id.fetch_add(1, Ordering::Relaxed);
        let payload_size = {
            let header = unsafe { header_at(base, offset) };
            header.mark_used(requested, alloc_id);
            header.payload_size
        };
        unsafe { write_footer(base, offset, payload_size, false) };
        unsafe { state.used_list.insert(base, offset) };

        let payload_offset = offset + HEADER_SIZE;
        let user_offset = if guards { payload_offset + crate::config::ALIGNMENT } else { payload_offset };

        unsafe {
            if guards {
                fill_pattern(base.add(payload_offset), crate::config::ALIGNMENT, crate::config::GUARD_VALUE);
                fill_pattern(
                    base.add(payload_offset + crate::config::ALIGNMENT + aligned_request),
                    crate::config::ALIGNMENT,
                    crate::config::GUARD_VALUE,
                );
            }
            secure_zero(base.add(user_offset), aligned_request);
        }

        #[cfg(feature = "leak-detection")]
        if self.config.leak_detection {
            state.tracking.push(AllocationRecord {
                user_ptr: base as usize + user_offset,
                user_size: requested,
                alloc_id,
                source_file: file,
                source_line: line,
            });
        }
        #[cfg(not(feature = "leak-detection"))]
        let _ = (file, line);

        if self.config.enable_stats {
            state.stats.total_allocations += 1;
            state.stats.requested_bytes += requested;
            state.stats.overhead_bytes += HEADER_SIZE + FOOTER_SIZE + payload_size.saturating_sub(requested);
            state.stats.live_bytes_per_class[crate::config::class_of(payload_size)] += payload_size;
        }

        let user_ptr = unsafe { base.add(user_offset) };
        if self.config.debug_level != DebugLevel::Off {
            let _ = self.validate_block_locked(&mut state, user_ptr, Site::Allocate);
        }
        self.debug_walk_if_enabled(&mut state, Site::Allocate);

        user_ptr
    }

    /// Resolves a user pointer to a block offset against explicit base/length
    /// values, or `None` if it falls outside the arena or its header fails a
    /// sentinel check. Shared by the locked (`resolve`) and lock-free
    /// (`resolve_unlocked`) entry points so the two never drift apart.
    ///
    /// # Safety
    /// `base_addr` must be zero or the address of a live arena of at least
    /// `arena_len` bytes.
    unsafe fn resolve_offset(base_addr: usize, arena_len: usize, guards: bool, user_ptr: *mut u8) -> Option<usize> {
        if base_addr == 0 {
            return None;
        }
        let user_addr = user_ptr as usize;
        if user_addr < base_addr {
            return None;
        }
        let user_offset = user_addr - base_addr;
        let header_offset = if guards { user_offset.checked_sub(crate::config::ALIGNMENT)? } else { user_offset };
        let block_offset = header_offset.checked_sub(HEADER_SIZE)?;
        if block_offset >= arena_len {
            return None;
        }
        let header = unsafe { header_at(base_addr as *mut u8, block_offset) };
        if !header.sentinels_valid() {
            return None;
        }
        if footer_offset(block_offset, header.payload_size) + FOOTER_SIZE > arena_len {
            return None;
        }
        Some(block_offset)
    }

    /// Resolves a user pointer to its block offset under the engine mutex,
    /// for callers that already hold `state` to mutate it.
    fn resolve(&self, state: &mut EngineState, user_ptr: *mut u8) -> Option<usize> {
        let base_addr = state.base() as usize;
        let arena_len = state.len();
        unsafe { Self::resolve_offset(base_addr, arena_len, self.config.memory_guards, user_ptr) }
    }

    /// Resolves a user pointer without taking the engine mutex, reading the
    /// arena's address/length out of atomics set once at `initialize`. Used
    /// by `size_of`, which the base spec documents as never contending with
    /// the allocation counter or the free-list lock — only the read of a
    /// presumed-live block's header fields, which is racy with a concurrent
    /// `free` by construction and accepted as such.
    fn resolve_unlocked(&self, user_ptr: *mut u8) -> Option<usize> {
        let base_addr = self.base_addr.load(Ordering::Acquire);
        let arena_len = self.arena_len.load(Ordering::Acquire);
        unsafe { Self::resolve_offset(base_addr, arena_len, self.config.memory_guards, user_ptr) }
    }

    /// Frees the block at `user_ptr`. Null is a no-op. A double free or a
    /// foreign/corrupted pointer is reported and otherwise ignored.
    ///
    /// # Safety
    /// `user_ptr` must either be null or a pointer previously returned by
    /// `allocate`/`resize`/`count_init` on this same allocator, not yet
    /// freed.
    pub unsafe fn free(&self, user_ptr: *mut u8) {
        #[cfg(feature = "std")]
        let started = self.config.enable_stats.then(Instant::now);

        unsafe { self.free_timed(user_ptr) };

        #[cfg(feature = "std")]
        if let Some(started) = started {
            self.inner.lock().stats.time_in_free += started.elapsed();
        }
    }

    unsafe fn free_timed(&self, user_ptr: *mut u8) {
        self.ensure_initialized();
        if user_ptr.is_null() {
            return;
        }

        let mut state = self.inner.lock();
        let Some(offset) = self.resolve(&mut state, user_ptr) else {
            report(AllocError::invalid_pointer(Site::Free, user_ptr as usize));
            return;
        };
        if self.config.debug_level != DebugLevel::Off
            && self.validate_block_locked(&mut state, user_ptr, Site::Free).is_err()
        {
            return;
        }
        let base = state.base();
        let arena_len = state.len();

        let (already_free, alloc_id, payload_size, request_size) = {
            let header = unsafe { header_at(base, offset) };
            (header.free, header.alloc_id, header.payload_size, header.request_size)
        };
        if already_free {
            report(AllocError::double_free(user_ptr as usize, alloc_id));
            return;
        }

        if self.config.memory_guards {
            let payload_offset = offset + HEADER_SIZE;
            let request_size = unsafe { header_at(base, offset) }.request_size;
            let aligned_request = crate::utils::align_up(request_size, crate::config::ALIGNMENT);
            let leading_ok = unsafe {
                all_bytes_equal(base.add(payload_offset), crate::config::ALIGNMENT, crate::config::GUARD_VALUE)
            };
            let trailing_ok = unsafe {
                all_bytes_equal(
                    base.add(payload_offset + crate::config::ALIGNMENT + aligned_request),
                    crate::config::ALIGNMENT,
                    crate::config::GUARD_VALUE,
                )
            };
            if !leading_ok || !trailing_ok {
                report(AllocError::buffer_overrun(user_ptr as usize, alloc_id));
            }
        }

        unsafe { state.used_list.unlink(base, offset) };
        {
            let header = unsafe { header_at(base, offset) };
            header.mark_free();
        }
        unsafe { write_footer(base, offset, payload_size, true) };
        unsafe {
            coalesce(
                &mut state.free_list,
                base,
                offset,
                arena_len,
                self.config.boundary_tags,
                self.config.cache_locality,
            )
        };

        #[cfg(feature = "leak-detection")]
        if self.config.leak_detection {
            state.tracking.remove(user_ptr as usize);
        }

        if self.config.enable_stats {
            state.stats.total_frees += 1;
            state.stats.overhead_bytes =
                state.stats.overhead_bytes.saturating_sub(HEADER_SIZE + FOOTER_SIZE + payload_size.saturating_sub(request_size));
            let class = crate::config::class_of(payload_size);
            state.stats.live_bytes_per_class[class] = state.stats.live_bytes_per_class[class].saturating_sub(payload_size);
        }

        self.debug_walk_if_enabled(&mut state, Site::Free);
    }

    /// Returns the user-visible size of a live block, or 0 if `user_ptr`
    /// does not resolve to one. Does not take the engine mutex: reads stable
    /// fields of a presumed-live block through the arena address/length
    /// atomics set at `initialize`.
    #[must_use]
    pub fn size_of(&self, user_ptr: *mut u8) -> usize {
        if user_ptr.is_null() {
            return 0;
        }
        match self.resolve_unlocked(user_ptr) {
            Some(offset) => {
                let base = self.base_addr.load(Ordering::Acquire) as *mut u8;
                let header = unsafe { header_at(base, offset) };
                if header.is_live() {
                    header.request_size
                } else {
                    0
                }
            }
            None => 0,
        }
    }

    /// Resizes the block at `user_ptr` to `new_size` bytes, preserving
    /// contents up to `min(old_size, new_size)`. Null `user_ptr` behaves
    /// like `allocate`; `new_size == 0` behaves like `free`.
    #[track_caller]
    #[must_use]
    pub fn resize(&self, user_ptr: *mut u8, new_size: usize) -> *mut u8 {
        let location = Location::caller();
        self.resize_at(user_ptr, new_size, location.file(), location.line())
    }

    #[must_use]
    pub fn resize_at(&self, user_ptr: *mut u8, new_size: usize, file: &'static str, line: u32) -> *mut u8 {
        if user_ptr.is_null() {
            return self.allocate_at(new_size, file, line);
        }
        if new_size == 0 {
            unsafe { self.free(user_ptr) };
            return ptr::null_mut();
        }

        let cur = self.size_of(user_ptr);
        if cur == 0 {
            return ptr::null_mut();
        }

        let guards = self.config.memory_guards;
        let aligned_request = crate::utils::align_up(new_size, crate::config::ALIGNMENT);
        let required = if guards { aligned_request + 2 * crate::config::ALIGNMENT } else { aligned_request };

        {
            let mut state = self.inner.lock();
            if let Some(offset) = self.resolve(&mut state, user_ptr) {
                let base = state.base();
                let payload_size = unsafe { header_at(base, offset) }.payload_size;
                if required <= payload_size {
                    if let Some(suffix) = unsafe { split(base, offset, required, guards) } {
                        unsafe { state.free_list.insert(base, suffix, self.config.cache_locality) };
                    }
                    let header = unsafe { header_at(base, offset) };
                    header.request_size = new_size;
                    unsafe { write_footer(base, offset, header.payload_size, false) };
                    if guards {
                        let payload_offset = offset + HEADER_SIZE;
                        unsafe {
                            fill_pattern(
                                base.add(payload_offset + crate::config::ALIGNMENT + aligned_request),
                                crate::config::ALIGNMENT,
                                crate::config::GUARD_VALUE,
                            );
                        }
                    }
                    return user_ptr;
                }
            } else {
                return ptr::null_mut();
            }
        }

        // Grow path: the mutex is non-recursive, so it is released here and
        // reacquired inside `allocate_at`/`free`. A concurrent allocator may
        // claim the freed space before this call returns; `resize` does not
        // promise atomicity.
        crate::utils::memory_barrier_ex(crate::utils::BarrierType::Release);
        let new_ptr = self.allocate_at(new_size, file, line);
        if new_ptr.is_null() {
            return ptr::null_mut();
        }
        unsafe {
            ptr::copy_nonoverlapping(user_ptr, new_ptr, core::cmp::min(cur, new_size));
            self.free(user_ptr);
        }
        crate::utils::memory_barrier_ex(crate::utils::BarrierType::Acquire);
        new_ptr
    }

    /// Zero-initialized array allocation: `n * element_size` bytes, with an
    /// overflow guard rather than a silently wrapped product.
    #[track_caller]
    #[must_use]
    pub fn count_init(&self, n: usize, element_size: usize) -> *mut u8 {
        if n > 0 && element_size > usize::MAX / n {
            report(AllocError::invalid_argument(Site::CountInit));
            return ptr::null_mut();
        }
        self.allocate(n * element_size)
    }

    /// A statistics snapshot, recomputed from a free-list walk.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        let mut state = self.inner.lock();
        self.recompute_fragmentation_stats(&mut state);
        state.stats
    }

    fn recompute_fragmentation_stats(&self, state: &mut EngineState) {
        let base = state.base();
        let mut largest = 0;
        let mut smallest = usize::MAX;
        let mut free_bytes = 0;
        let mut free_blocks = 0;
        for class in 0..crate::config::NUM_SIZE_CLASSES {
            for offset in unsafe { state.free_list.iter_class(base, class) } {
                let payload = unsafe { header_at(base, offset) }.payload_size;
                largest = largest.max(payload);
                smallest = smallest.min(payload);
                free_bytes += payload;
                free_blocks += 1;
            }
        }
        state.stats.largest_free_block = largest;
        state.stats.smallest_free_block = if free_blocks == 0 { 0 } else { smallest };
        state.stats.free_bytes = free_bytes;
        state.stats.free_blocks = free_blocks;

        let mut live_bytes = 0;
        let mut live_blocks = 0;
        for offset in unsafe { state.used_list.iter(base) } {
            live_bytes += unsafe { header_at(base, offset) }.payload_size;
            live_blocks += 1;
        }
        state.stats.live_bytes = live_bytes;
        state.stats.live_blocks = live_blocks;
    }

    /// Validates the block at `user_ptr`: bounds-checks it against the
    /// arena, then checks its header's start/end sentinels and its
    /// footer's sentinel independently, so the diagnostic names exactly
    /// which one failed. Reports through [`crate::error::report`] and
    /// returns the error rather than panicking; never mutates state.
    pub fn validate_block(&self, user_ptr: *mut u8, site: Site) -> crate::error::AllocResult<()> {
        let mut state = self.inner.lock();
        self.validate_block_locked(&mut state, user_ptr, site)
    }

    fn validate_block_locked(
        &self,
        state: &mut EngineState,
        user_ptr: *mut u8,
        site: Site,
    ) -> crate::error::AllocResult<()> {
        let base_addr = state.base() as usize;
        let arena_len = state.len();
        let address = user_ptr as usize;
        let Some(offset) =
            (unsafe { Self::resolve_offset(base_addr, arena_len, self.config.memory_guards, user_ptr) })
        else {
            return Err(report(AllocError::invalid_pointer(site, address)));
        };

        let base = state.base();
        let header = unsafe { header_at(base, offset) };
        if header.start_sentinel != crate::config::SENTINEL_VALUE {
            return Err(report(AllocError::corruption(site, base_addr + offset, CorruptionKind::Start)));
        }
        if header.end_sentinel != crate::config::SENTINEL_VALUE {
            return Err(report(AllocError::corruption(site, base_addr + offset, CorruptionKind::End)));
        }
        let footer = unsafe { footer_at(base, offset, header.payload_size) };
        if !footer.sentinel_valid() {
            return Err(report(AllocError::corruption(site, base_addr + offset, CorruptionKind::Footer)));
        }
        Ok(())
    }

    /// Walks every free list and the used list, checking that each member's
    /// `free` flag agrees with the registry it is linked into.
    fn validate_heap_consistency(&self, state: &mut EngineState, site: Site) -> crate::error::AllocResult<()> {
        let base = state.base();
        for class in 0..crate::config::NUM_SIZE_CLASSES {
            for offset in unsafe { state.free_list.iter_class(base, class) } {
                if !unsafe { header_at(base, offset) }.free {
                    return Err(report(AllocError::corruption(
                        site,
                        base as usize + offset,
                        CorruptionKind::FreeListMarkedUsed,
                    )));
                }
            }
        }
        for offset in unsafe { state.used_list.iter(base) } {
            if unsafe { header_at(base, offset) }.free {
                return Err(report(AllocError::corruption(
                    site,
                    base as usize + offset,
                    CorruptionKind::UsedListMarkedFree,
                )));
            }
        }
        Ok(())
    }

    /// At `DebugLevel::Full`, checks free/used-list flag consistency and
    /// cross-checks an independent physical arena walk against the
    /// registry-derived statistics. A no-op at `Off`/`Basic`: this is the
    /// expensive self-check the base spec reserves for elevated debug
    /// builds, not the always-available `walk_arena` dumper.
    fn debug_walk_if_enabled(&self, state: &mut EngineState, site: Site) {
        if self.config.debug_level != DebugLevel::Full {
            return;
        }
        if self.validate_heap_consistency(state, site).is_err() {
            return;
        }
        if !self.config.enable_stats {
            return;
        }

        let base = state.base();
        let arena_len = state.len();
        let mut offset = 0;
        let mut free_bytes = 0;
        let mut free_blocks = 0;
        let mut live_bytes = 0;
        let mut live_blocks = 0;
        while offset < arena_len {
            let header = unsafe { header_at(base, offset) };
            if header.free {
                free_bytes += header.payload_size;
                free_blocks += 1;
            } else {
                live_bytes += header.payload_size;
                live_blocks += 1;
            }
            offset = match unsafe { crate::block::next_physical(offset, header.payload_size, arena_len) } {
                Some(next) => next,
                None => break,
            };
        }

        self.recompute_fragmentation_stats(state);
        let diverged = free_bytes != state.stats.free_bytes
            || free_blocks != state.stats.free_blocks
            || live_bytes != state.stats.live_bytes
            || live_blocks != state.stats.live_blocks;
        if diverged {
            report(AllocError::corruption(site, base as usize, CorruptionKind::StatsMismatch));
        }
    }

    /// Every block in the arena, in physical order, for external dumpers.
    #[must_use]
    pub fn walk_arena(&self) -> Vec<BlockInfo> {
        let mut state = self.inner.lock();
        let base = state.base();
        let arena_len = state.len();
        let mut blocks = Vec::new();
        let mut offset = 0;
        while offset < arena_len {
            let header = unsafe { header_at(base, offset) };
            blocks.push(BlockInfo {
                offset,
                payload_size: header.payload_size,
                free: header.free,
                alloc_id: header.alloc_id,
            });
            offset = match unsafe { crate::block::next_physical(offset, header.payload_size, arena_len) } {
                Some(next) => next,
                None => break,
            };
        }
        blocks
    }

    /// Currently live tracking records, for leak reporting.
    #[cfg(feature = "leak-detection")]
    #[must_use]
    pub fn leaks(&self) -> Vec<AllocationRecord> {
        let state = self.inner.lock();
        state.tracking.iter().copied().collect()
    }
}

impl Drop for SegFitAllocator {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SegFitAllocator {
        SegFitAllocator::new(AllocatorConfig::new(64 * 1024).with_guards(false).with_boundary_tags(true))
    }

    #[test]
    fn allocate_returns_zeroed_aligned_pointer() {
        let engine = fixture();
        let ptr = engine.allocate(100);
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % crate::config::ALIGNMENT, 0);
        assert_eq!(engine.size_of(ptr), 100);
        unsafe {
            for i in 0..100 {
                assert_eq!(*ptr.add(i), 0);
            }
        }
    }

    #[test]
    fn zero_size_allocation_returns_null() {
        let engine = fixture();
        assert!(engine.allocate(0).is_null());
    }

    #[test]
    fn free_then_double_free_is_reported_and_reallocation_succeeds() {
        let engine = fixture();
        let ptr = engine.allocate(50);
        unsafe {
            engine.free(ptr);
            engine.free(ptr); // double free: reported, not fatal
        }
        let again = engine.allocate(50);
        assert!(!again.is_null());
    }

    #[test]
    fn resize_grows_and_preserves_contents() {
        let engine = fixture();
        let p = engine.allocate(100);
        unsafe {
            *p = 0xAB;
        }
        let q = engine.resize(p, 200);
        assert!(!q.is_null());
        assert_eq!(engine.size_of(q), 200);
        unsafe {
            assert_eq!(*q, 0xAB);
        }
    }

    #[test]
    fn resize_to_zero_frees_and_returns_null() {
        let engine = fixture();
        let p = engine.allocate(64);
        let q = engine.resize(p, 0);
        assert!(q.is_null());
        assert_eq!(engine.size_of(p), 0);
    }

    #[test]
    fn coalescing_merges_freed_neighbors_back_into_one_block() {
        let engine = fixture();
        let a = engine.allocate(64);
        let b = engine.allocate(64);
        let c = engine.allocate(64);
        unsafe {
            engine.free(a);
            engine.free(c);
            engine.free(b);
        }
        let blocks = engine.walk_arena();
        assert_eq!(blocks.iter().filter(|b| !b.free).count(), 0);
    }

    #[test]
    fn count_init_rejects_overflowing_product() {
        let engine = fixture();
        assert!(engine.count_init(usize::MAX, 2).is_null());
    }

    #[test]
    fn validate_block_detects_corrupted_start_sentinel() {
        let engine = fixture();
        let p = engine.allocate(64);
        assert!(engine.validate_block(p, Site::Validate).is_ok());

        let offset = engine.resolve_unlocked(p).unwrap();
        unsafe {
            let base = engine.inner.lock().base();
            header_at(base, offset).start_sentinel ^= 0xFFFF_FFFF;
        }
        let err = engine.validate_block(p, Site::Validate).unwrap_err();
        assert!(err.to_string().contains("start sentinel corrupted"));
    }

    #[test]
    fn validate_block_detects_corrupted_footer_sentinel() {
        let engine = fixture();
        let p = engine.allocate(64);
        let offset = engine.resolve_unlocked(p).unwrap();
        unsafe {
            let base = engine.inner.lock().base();
            let payload_size = header_at(base, offset).payload_size;
            footer_at(base, offset, payload_size).footer_sentinel ^= 0xFFFF_FFFF;
        }
        let err = engine.validate_block(p, Site::Validate).unwrap_err();
        assert!(err.to_string().contains("footer sentinel corrupted"));
    }

    #[test]
    fn overhead_and_per_class_stats_track_allocate_and_free() {
        let engine = SegFitAllocator::new(
            AllocatorConfig::new(64 * 1024).with_guards(false).with_boundary_tags(true).with_stats(true),
        );
        let before = engine.stats();
        assert_eq!(before.overhead_bytes, 0);
        assert_eq!(before.live_bytes_per_class.iter().sum::<usize>(), 0);

        let p = engine.allocate(100);
        let after_alloc = engine.stats();
        assert!(after_alloc.overhead_bytes > 0);
        let class = crate::config::class_of(engine.size_of(p).max(100));
        assert!(after_alloc.live_bytes_per_class[class] > 0);

        unsafe { engine.free(p) };
        let after_free = engine.stats();
        assert_eq!(after_free.overhead_bytes, 0);
        assert_eq!(after_free.live_bytes_per_class.iter().sum::<usize>(), 0);
    }

    #[test]
    fn debug_walk_full_does_not_flag_a_healthy_heap() {
        let engine = SegFitAllocator::new(
            AllocatorConfig::new(64 * 1024)
                .with_guards(false)
                .with_boundary_tags(true)
                .with_stats(true)
                .with_debug_level(crate::config::DebugLevel::Full),
        );
        let a = engine.allocate(64);
        let b = engine.allocate(128);
        unsafe {
            engine.free(a);
            engine.free(b);
        }
        // No panics and the heap remains usable: a corrupted self-check
        // would only report, never abort, so this asserts the crate still
        // works normally when DebugLevel::Full is on throughout.
        assert!(!engine.allocate(32).is_null());
    }
}
