//! Forward/backward boundary-tag coalescing: merges a newly freed block
//! with physically adjacent Free neighbors.

use crate::allocator::freelist::FreeListRegistry;
use crate::block::{block_total_size, header_at, next_physical, prev_physical, write_footer, HEADER_SIZE};

/// Merges the Free block at `offset` with its physical neighbors.
///
/// Forward merge runs first, then backward (only when `boundary_tags` is
/// true); the survivor is unlinked from its pre-merge free-list entry
/// before either merge mutates its payload size and re-inserted exactly
/// once afterward, keyed by the final size class. Returns the offset of
/// the surviving block, already linked into `free_list`.
///
/// # Safety
/// `offset` must name a Free block already unlinked from `free_list`;
/// `arena_len` must be the arena's total length.
pub unsafe fn coalesce(
    free_list: &mut FreeListRegistry,
    base: *mut u8,
    offset: usize,
    arena_len: usize,
    boundary_tags: bool,
    cache_locality: bool,
) -> usize {
    let mut survivor = offset;

    if let Some(next) = unsafe { next_physical(survivor, header_at(base, survivor).payload_size, arena_len) } {
        let next_is_free = unsafe { header_at(base, next) }.free;
        if next_is_free {
            unsafe { free_list.unlink(base, next) };
            let next_payload = unsafe { header_at(base, next) }.payload_size;
            let grown = unsafe { header_at(base, survivor) }.payload_size
                + HEADER_SIZE
                + next_payload
                + crate::block::FOOTER_SIZE;
            unsafe { header_at(base, survivor) }.payload_size = grown;
            unsafe { write_footer(base, survivor, grown, true) };
        }
    }

    if boundary_tags {
        if let Some(prev) = unsafe { prev_physical(base, survivor) } {
            let prev_is_free = unsafe { header_at(base, prev) }.free;
            if prev_is_free {
                unsafe { free_list.unlink(base, prev) };
                let survivor_payload = unsafe { header_at(base, survivor) }.payload_size;
                let grown = unsafe { header_at(base, prev) }.payload_size
                    + HEADER_SIZE
                    + survivor_payload
                    + crate::block::FOOTER_SIZE;
                unsafe { header_at(base, prev) }.payload_size = grown;
                unsafe { write_footer(base, prev, grown, true) };
                survivor = prev;
            }
        }
    }

    unsafe { free_list.insert(base, survivor, cache_locality) };
    survivor
}
