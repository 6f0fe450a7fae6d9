//! Implementation of the physical memory system.

pub mod buddy;
pub mod frame;
pub mod linked_list;
pub mod locked;

pub use linked_list::LinkedList;

use crate::unit::{self, KIB};
use core::fmt;
use displaydoc_lite::displaydoc;

/// The size of a single page frame, which is also the
/// size of an order-0 block in the buddy allocator.
pub const PAGE_SIZE: usize = 4 * KIB;

/// The maximum order for the buddy allocator (inclusive).
///
/// The largest block spans `2^18` frames, which is 1 GiB with 4 KiB pages.
pub const MAX_ORDER: usize = 18;

/// The size of the orders array inside the buddy allocator.
pub const ORDER_COUNT: usize = MAX_ORDER + 1;

/// Result for every memory allocation operation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

displaydoc! {
    /// Any error that can be recovered from while allocating frames.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Error {
        /// tried to allocate, but there was no free block large enough left.
        NoMemoryAvailable,
        /// tried to allocate more frames than the largest order can hold.
        OrderTooLarge,
        /// tried to allocate zero pages using `alloc_pages`.
        AllocateZeroPages,
    }
}

/// Returns the number of frames inside a block of the given order.
pub const fn frames_for_order(order: usize) -> usize {
    1 << order
}

/// Calculates the smallest order whose blocks can hold `count` frames.
///
/// This function may return an order that is larger than [`MAX_ORDER`].
pub fn order_for_count(count: usize) -> usize {
    count
        .max(1)
        .checked_next_power_of_two()
        .map_or(usize::BITS as usize, |count| count.trailing_zeros() as usize)
}

/// Returns `floor(log2(num))`, so the order of the largest block
/// that is not larger than `num` frames.
///
/// `num` must not be zero.
pub fn floor_log2(num: usize) -> usize {
    debug_assert!(num != 0, "log2 of zero is undefined");
    (usize::BITS - 1 - num.leading_zeros()) as usize
}

/// Calculate the index of the other buddy for the block at `index`.
///
/// Both buddies of order `order` only differ in bit `order`.
pub const fn buddy_of(index: usize, order: usize) -> usize {
    index ^ frames_for_order(order)
}

/// A page allocation algorithm that manages the frames of one frame store.
///
/// Implementations do not synchronize anything themselves; wrap them
/// inside a [`LockedAllocator`](locked::LockedAllocator) to share them.
pub trait PageAllocator: Send {
    /// The friendly name of this algorithm, used to select it.
    fn name(&self) -> &'static str;

    /// Allocates a block of `2^order` contiguous frames and returns the index
    /// of its first frame.
    fn allocate(&mut self, order: usize) -> Result<usize>;

    /// Returns the block of `2^order` frames starting at `index`.
    fn free(&mut self, index: usize, order: usize);

    /// Marks `count` frames starting at `start` as available for allocation.
    fn insert_range(&mut self, start: usize, count: usize);

    /// Marks `count` frames starting at `start` as unavailable for allocation.
    fn remove_range(&mut self, start: usize, count: usize);

    /// Writes the current state of the free lists into the log.
    fn dump_state(&self);

    /// Return a copy of the statistics for this allocator.
    fn stats(&self) -> AllocStats;
}

/// Statistics for a frame allocator, counted in frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
    /// The name of the allocator that collected these stats.
    pub name: &'static str,
    /// The number of frames that are handed out right now.
    pub allocated: usize,
    /// The number of frames that are left for allocation.
    pub free: usize,
    /// The number of frames inside the frame store.
    pub total: usize,
}

impl AllocStats {
    /// Create a new [`AllocStats`] instance for the given allocator name.
    pub const fn with_name(name: &'static str) -> Self {
        Self {
            name,
            allocated: 0,
            free: 0,
            total: 0,
        }
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f, "\nAllocated: {}", unit::frames(self.allocated))?;
        writeln!(f, "Free: {}", unit::frames(self.free))?;
        writeln!(f, "Total: {}", unit::frames(self.total))?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f)?;
        Ok(())
    }
}
