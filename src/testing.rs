//! Helpers shared by the unit tests.
//!
//! This module should be guarded behind the `test` config.

use crate::mem::{frames_for_order, MAX_ORDER, ORDER_COUNT};
use crate::BuddyAllocator;
use std::sync::Once;

struct Logger;

impl log::Log for Logger {
    #[allow(unused_variables)]
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        #[cfg(any(debug_assertions, feature = "logging"))]
        return true;
        #[cfg(all(not(debug_assertions), not(feature = "logging")))]
        return metadata.level() <= log::Level::Info;
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            let mod_path = record
                .module_path_static()
                .or_else(|| record.module_path())
                .unwrap_or("<n/a>");

            println!("[ {:>5} ] [{}] {}", record.level(), mod_path, record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the test logger, which prints into the captured test output.
pub fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        log::set_logger(&Logger).expect("failed to init logging");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Returns every free block as `(index, order)`, sorted by index.
pub fn free_blocks(alloc: &BuddyAllocator<'_>) -> Vec<(usize, usize)> {
    let mut blocks = (0..ORDER_COUNT)
        .flat_map(|order| alloc.free_blocks(order).map(move |index| (index, order)))
        .collect::<Vec<_>>();
    blocks.sort_unstable();
    blocks
}

/// Asserts that none of the `(index, order)` blocks overlap each other.
pub fn assert_disjoint(blocks: &[(usize, usize)]) {
    let mut blocks = blocks.to_vec();
    blocks.sort_unstable();

    blocks.windows(2).for_each(|pair| {
        let (first, order) = pair[0];
        let (second, _) = pair[1];
        assert!(
            first + frames_for_order(order) <= second,
            "block {:#x} with order {} overlaps block {:#x}",
            first,
            order,
            second
        );
    });
}

/// Checks every invariant the free lists must hold between two operations.
pub fn check_invariants(alloc: &BuddyAllocator<'_>) {
    for order in 0..ORDER_COUNT {
        let blocks = alloc.free_blocks(order).collect::<Vec<_>>();

        blocks.iter().for_each(|&block| {
            assert_eq!(
                block % frames_for_order(order),
                0,
                "block {:#x} is not aligned to order {}",
                block,
                order
            );
            assert!(block + frames_for_order(order) <= alloc.frame_count());
        });

        assert!(
            blocks.windows(2).all(|pair| pair[0] < pair[1]),
            "free list of order {} is not sorted: {:x?}",
            order,
            blocks
        );
    }

    assert_disjoint(&free_blocks(alloc));
    assert_eq!(alloc.stats().free, alloc.free_frames());
}

/// Asserts that no two free blocks are buddies that could be one block.
pub fn assert_merged(alloc: &BuddyAllocator<'_>) {
    for order in 0..MAX_ORDER {
        let blocks = alloc.free_blocks(order).collect::<Vec<_>>();
        blocks.windows(2).for_each(|pair| {
            assert!(
                !(pair[0] % frames_for_order(order + 1) == 0
                    && pair[1] == pair[0] + frames_for_order(order)),
                "blocks {:#x} and {:#x} with order {} should be merged",
                pair[0],
                pair[1],
                order
            );
        });
    }
}

/// Tiny xorshift generator, so randomized tests are reproducible.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Returns a number in `0..bound`.
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}
