//! End-to-end scenarios exercised as an external consumer, against the
//! public `SegFitAllocator` surface only.

use segfit::block::block_total_size;
use segfit::config::AllocatorConfig;
use segfit::SegFitAllocator;

const HEAP_SIZE: usize = 1 << 20;

fn engine() -> SegFitAllocator {
    SegFitAllocator::new(AllocatorConfig::new(HEAP_SIZE))
}

#[test]
fn scenario_basic_allocation_is_zeroed_and_aligned() {
    let engine = engine();
    let p = engine.allocate(100);
    assert!(!p.is_null());
    assert_eq!(engine.size_of(p), 100);
    assert_eq!(p as usize % 16, 0);
    unsafe {
        for i in 0..100 {
            assert_eq!(*p.add(i), 0, "byte {i} not zeroed");
        }
    }
}

#[test]
fn scenario_alternating_free_leaves_no_adjacent_free_blocks() {
    let engine = engine();
    let sizes: Vec<usize> = (0..10).map(|i| 32 + i * 32).collect();
    let ptrs: Vec<*mut u8> = sizes.iter().map(|&s| engine.allocate(s)).collect();
    assert!(ptrs.iter().all(|p| !p.is_null()));

    for (i, &p) in ptrs.iter().enumerate() {
        if i % 2 == 0 {
            unsafe { engine.free(p) };
        }
    }

    let blocks = engine.walk_arena();
    for window in blocks.windows(2) {
        assert!(!(window[0].free && window[1].free), "two adjacent free blocks survived");
    }
}

#[test]
fn scenario_resize_preserves_prefix_and_updates_size() {
    let engine = engine();
    let p = engine.allocate(100);
    unsafe {
        for i in 0..100u8 {
            *p.add(i as usize) = i;
        }
    }
    let q = engine.resize(p, 200);
    assert!(!q.is_null());
    assert_eq!(engine.size_of(q), 200);
    unsafe {
        for i in 0..100u8 {
            assert_eq!(*q.add(i as usize), i);
        }
    }
}

#[test]
fn scenario_double_free_is_recovered() {
    let engine = engine();
    let p = engine.allocate(50);
    unsafe {
        engine.free(p);
        engine.free(p);
    }
    let q = engine.allocate(50);
    assert!(!q.is_null());
}

#[test]
fn scenario_buffer_overrun_is_detected_but_block_is_reclaimed() {
    let engine = SegFitAllocator::new(AllocatorConfig::new(HEAP_SIZE));
    let p = engine.allocate(64);
    unsafe {
        // Corrupt the trailing red zone just past the user-visible region.
        *p.add(64) = 0xFE ^ 0xFF;
        engine.free(p);
    }
    // The block was reclaimed regardless of the reported overrun.
    let q = engine.allocate(64);
    assert!(!q.is_null());
}

#[test]
fn scenario_arena_walk_tiles_exactly_to_heap_size() {
    let engine = engine();
    let sizes: Vec<usize> = (0..20).map(|i| 16 + i * 48).collect();
    let ptrs: Vec<*mut u8> = sizes.iter().map(|&s| engine.allocate(s)).collect();
    for (i, &p) in ptrs.iter().enumerate() {
        if i % 3 == 0 && !p.is_null() {
            unsafe { engine.free(p) };
        }
    }

    let blocks = engine.walk_arena();
    let tiled: usize = blocks.iter().map(|b| block_total_size(b.payload_size)).sum();
    assert_eq!(tiled, HEAP_SIZE, "arena walk did not tile exactly to the heap size");
}

#[cfg(feature = "leak-detection")]
#[test]
fn scenario_leak_check_reports_survivors() {
    let engine = engine();
    let mut ptrs = Vec::new();
    for i in 0..100 {
        ptrs.push(engine.allocate(32 + (i % 5) * 16));
    }
    for (i, &p) in ptrs.iter().enumerate() {
        if i % 2 == 0 {
            unsafe { engine.free(p) };
        }
    }
    let leaks = engine.leaks();
    assert_eq!(leaks.len(), 50);
}
