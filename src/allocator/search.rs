//! Block splitting: trims a located Free block down to the requested size
//! when the remainder is large enough to stand on its own.

use crate::block::{block_total_size, header_at, write_footer, BlockHeader, FOOTER_SIZE, HEADER_SIZE, MIN_BLOCK_SIZE};
use crate::config::ALIGNMENT;

/// Minimum remainder, in payload bytes, worth carving into its own Free
/// block: `MIN_BLOCK_SIZE`'s usable-space portion, with its own header
/// already accounted for separately via `overhead` in `split`. When guards
/// are enabled the remainder also has to absorb two red-zone bands, or the
/// split is skipped and the whole block is handed out oversized.
#[must_use]
fn min_remainder(guards_enabled: bool) -> usize {
    let base = MIN_BLOCK_SIZE - HEADER_SIZE;
    if guards_enabled {
        base + 2 * ALIGNMENT
    } else {
        base
    }
}

/// Splits the Free block at `offset` down to `size` bytes of payload if the
/// leftover is at least [`min_remainder`]. Returns the offset of the new
/// Free suffix block when a split happened.
///
/// # Safety
/// `offset` must name a Free block with `payload_size >= size`, unlinked
/// from the free-list registry (the caller re-links both halves).
#[must_use]
pub unsafe fn split(base: *mut u8, offset: usize, size: usize, guards_enabled: bool) -> Option<usize> {
    let payload_size = unsafe { header_at(base, offset) }.payload_size;
    let overhead = HEADER_SIZE + FOOTER_SIZE;
    if payload_size < size + overhead + min_remainder(guards_enabled) {
        return None;
    }
    let remainder = payload_size - size - overhead;

    {
        let header = unsafe { header_at(base, offset) };
        header.payload_size = size;
    }
    unsafe { write_footer(base, offset, size, false) };

    let suffix_offset = offset + block_total_size(size);
    unsafe {
        *base.add(suffix_offset).cast::<BlockHeader>() = BlockHeader::new_free(remainder);
        write_footer(base, suffix_offset, remainder, true);
    }
    Some(suffix_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;

    #[test]
    fn split_carves_suffix_when_remainder_large_enough() {
        let payload = 256;
        let mut arena = vec![0u8; block_total_size(payload)];
        let base = arena.as_mut_ptr();
        unsafe {
            *base.cast::<BlockHeader>() = BlockHeader::new_free(payload);
            write_footer(base, 0, payload, true);
        }
        let suffix = unsafe { split(base, 0, 32, false) };
        assert!(suffix.is_some());
        let header = unsafe { header_at(base, 0) };
        assert_eq!(header.payload_size, 32);
    }

    #[test]
    fn split_refuses_when_remainder_too_small() {
        let payload = 48;
        let mut arena = vec![0u8; block_total_size(payload)];
        let base = arena.as_mut_ptr();
        unsafe {
            *base.cast::<BlockHeader>() = BlockHeader::new_free(payload);
            write_footer(base, 0, payload, true);
        }
        let suffix = unsafe { split(base, 0, 32, false) };
        assert_eq!(suffix, None);
    }
}
