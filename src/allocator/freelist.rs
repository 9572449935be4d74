//! Segregated free-list registry: eight doubly linked lists of Free
//! blocks, one per size class, plus the best-fit search that selects a
//! candidate for a new allocation.

use crate::block::{header_at, NONE};
use crate::config::{class_of, NUM_SIZE_CLASSES};

/// Head offsets for the eight size-class free lists.
#[derive(Debug, Clone)]
pub struct FreeListRegistry {
    heads: [usize; NUM_SIZE_CLASSES],
}

impl FreeListRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self { heads: [NONE; NUM_SIZE_CLASSES] }
    }

    /// Links the Free block at `offset` into its size class's list.
    ///
    /// # Safety
    /// `offset` must name a Free block in `base`'s arena, unlinked from any
    /// list (`list_prev`/`list_next` are overwritten unconditionally).
    pub unsafe fn insert(&mut self, base: *mut u8, offset: usize, cache_locality: bool) {
        let class = unsafe { header_at(base, offset).class() };
        if cache_locality && class < 4 {
            unsafe { self.insert_ordered(base, offset, class) };
        } else {
            unsafe { self.push_front(base, offset, class) };
        }
    }

    /// # Safety
    /// Same as [`Self::insert`].
    unsafe fn push_front(&mut self, base: *mut u8, offset: usize, class: usize) {
        let old_head = self.heads[class];
        {
            let header = unsafe { header_at(base, offset) };
            header.list_prev = NONE;
            header.list_next = old_head;
        }
        if old_head != NONE {
            unsafe { header_at(base, old_head) }.list_prev = offset;
        }
        self.heads[class] = offset;
    }

    /// Inserts `offset` before the first node whose own offset exceeds it,
    /// or at the tail if none does. Degenerates correctly on empty and
    /// single-element lists — no special case needed.
    ///
    /// # Safety
    /// Same as [`Self::insert`].
    unsafe fn insert_ordered(&mut self, base: *mut u8, offset: usize, class: usize) {
        let mut cursor = self.heads[class];
        let mut prev = NONE;
        while cursor != NONE && cursor < offset {
            prev = cursor;
            cursor = unsafe { header_at(base, cursor) }.list_next;
        }

        {
            let header = unsafe { header_at(base, offset) };
            header.list_prev = prev;
            header.list_next = cursor;
        }
        if cursor != NONE {
            unsafe { header_at(base, cursor) }.list_prev = offset;
        }
        if prev != NONE {
            unsafe { header_at(base, prev) }.list_next = offset;
        } else {
            self.heads[class] = offset;
        }
    }

    /// Removes the Free block at `offset` from its size class's list.
    /// `offset`'s class is read from its own header before the links are
    /// cleared.
    ///
    /// # Safety
    /// `offset` must currently be linked into the list for `class_of` of
    /// its own `payload_size`.
    pub unsafe fn unlink(&mut self, base: *mut u8, offset: usize) {
        let (class, prev, next) = {
            let header = unsafe { header_at(base, offset) };
            (header.class(), header.list_prev, header.list_next)
        };

        if prev != NONE {
            unsafe { header_at(base, prev) }.list_next = next;
        } else {
            self.heads[class] = next;
        }
        if next != NONE {
            unsafe { header_at(base, next) }.list_prev = prev;
        }

        let header = unsafe { header_at(base, offset) };
        header.list_prev = NONE;
        header.list_next = NONE;
    }

    /// Finds a Free block able to satisfy `size` bytes of payload.
    ///
    /// Scans the home class fully for the tightest fit (slack of zero
    /// short-circuits); if none fits, returns the head of the first
    /// nonempty higher class, which is always large enough because class
    /// bounds are monotone.
    ///
    /// # Safety
    /// Every offset reachable from `self.heads` must name a live Free
    /// block in `base`'s arena.
    #[must_use]
    pub unsafe fn find(&self, base: *mut u8, size: usize) -> Option<usize> {
        let home = class_of(size);

        let mut best: Option<(usize, usize)> = None; // (offset, slack)
        let mut cursor = self.heads[home];
        while cursor != NONE {
            let payload = unsafe { header_at(base, cursor) }.payload_size;
            if payload >= size {
                let slack = payload - size;
                if slack == 0 {
                    return Some(cursor);
                }
                if best.is_none_or(|(_, best_slack)| slack < best_slack) {
                    best = Some((cursor, slack));
                }
            }
            cursor = unsafe { header_at(base, cursor) }.list_next;
        }
        if let Some((offset, _)) = best {
            return Some(offset);
        }

        for class in (home + 1)..NUM_SIZE_CLASSES {
            if self.heads[class] != NONE {
                return Some(self.heads[class]);
            }
        }
        None
    }

    /// Iterates every offset linked into `class`, head to tail.
    ///
    /// # Safety
    /// Same as [`Self::find`].
    pub unsafe fn iter_class(&self, base: *mut u8, class: usize) -> FreeListIter {
        FreeListIter { base, cursor: self.heads[class] }
    }

    #[must_use]
    pub fn head(&self, class: usize) -> usize {
        self.heads[class]
    }
}

impl Default for FreeListRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FreeListIter {
    base: *mut u8,
    cursor: usize,
}

impl Iterator for FreeListIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cursor == NONE {
            return None;
        }
        let current = self.cursor;
        // SAFETY: the iterator is only constructed over offsets the caller
        // has guaranteed are live Free blocks.
        self.cursor = unsafe { header_at(self.base, current) }.list_next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{block_total_size, BlockHeader};

    fn make_arena(payloads: &[usize]) -> Vec<u8> {
        let total: usize = payloads.iter().map(|&p| block_total_size(p)).sum();
        let mut arena = vec![0u8; total];
        let base = arena.as_mut_ptr();
        let mut offset = 0;
        for &payload in payloads {
            unsafe {
                *base.add(offset).cast::<BlockHeader>() = BlockHeader::new_free(payload);
            }
            offset += block_total_size(payload);
        }
        arena
    }

    #[test]
    fn push_front_and_unlink() {
        let mut arena = make_arena(&[32, 32]);
        let base = arena.as_mut_ptr();
        let mut reg = FreeListRegistry::new();
        unsafe {
            reg.insert(base, 0, false);
            reg.insert(base, block_total_size(32), false);
            assert_eq!(reg.head(class_of(32)), block_total_size(32));
            reg.unlink(base, block_total_size(32));
            assert_eq!(reg.head(class_of(32)), 0);
        }
    }

    #[test]
    fn find_prefers_zero_slack() {
        let mut arena = make_arena(&[48, 32]);
        let base = arena.as_mut_ptr();
        let mut reg = FreeListRegistry::new();
        unsafe {
            reg.insert(base, 0, false);
            reg.insert(base, block_total_size(48), false);
            let found = reg.find(base, 32).unwrap();
            assert_eq!(found, block_total_size(48));
        }
    }

    #[test]
    fn find_falls_back_to_higher_class() {
        let mut arena = make_arena(&[128]);
        let base = arena.as_mut_ptr();
        let mut reg = FreeListRegistry::new();
        unsafe {
            reg.insert(base, 0, false);
            let found = reg.find(base, 40);
            assert_eq!(found, Some(0));
        }
    }

    #[test]
    fn ordered_insert_maintains_address_order() {
        let mut arena = make_arena(&[32, 32, 32]);
        let base = arena.as_mut_ptr();
        let mut reg = FreeListRegistry::new();
        let offsets = [
            2 * block_total_size(32),
            0,
            block_total_size(32),
        ];
        unsafe {
            for &o in &offsets {
                reg.insert(base, o, true);
            }
            let walked: Vec<usize> = reg.iter_class(base, class_of(32)).collect();
            assert_eq!(walked, vec![0, block_total_size(32), 2 * block_total_size(32)]);
        }
    }
}
