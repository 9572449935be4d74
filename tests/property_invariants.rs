//! Property-based checks of the quantified invariants: tiling, sentinels,
//! no adjacent free blocks, and alloc_id monotonicity, after randomized
//! sequences of allocate/free.

use proptest::prelude::*;
use segfit::block::block_total_size;
use segfit::config::AllocatorConfig;
use segfit::SegFitAllocator;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    FreeIndex(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..=4096).prop_map(Op::Alloc),
        (0usize..64).prop_map(Op::FreeIndex),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn no_adjacent_free_blocks_after_any_sequence(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let engine = SegFitAllocator::new(AllocatorConfig::new(1 << 20));
        let mut live: Vec<*mut u8> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    let p = engine.allocate(size);
                    if !p.is_null() {
                        live.push(p);
                    }
                }
                Op::FreeIndex(i) => {
                    if !live.is_empty() {
                        let p = live.swap_remove(i % live.len());
                        unsafe { engine.free(p) };
                    }
                }
            }
        }

        let blocks = engine.walk_arena();
        for window in blocks.windows(2) {
            prop_assert!(!(window[0].free && window[1].free));
        }

        // Tiling: the blocks a full walk returns must cover the arena
        // exactly, with no gap or overlap.
        let tiled: usize = blocks.iter().map(|b| block_total_size(b.payload_size)).sum();
        prop_assert_eq!(tiled, 1usize << 20);

        let mut seen_ids = std::collections::HashSet::new();
        for b in blocks.iter().filter(|b| !b.free) {
            prop_assert!(seen_ids.insert(b.alloc_id), "duplicate alloc_id observed");
        }
    }

    #[test]
    fn returned_pointers_are_aligned(sizes in prop::collection::vec(1usize..=2048, 1..50)) {
        let engine = SegFitAllocator::new(AllocatorConfig::new(1 << 20));
        for size in sizes {
            let p = engine.allocate(size);
            if !p.is_null() {
                prop_assert_eq!(p as usize % 16, 0);
            }
        }
    }
}
