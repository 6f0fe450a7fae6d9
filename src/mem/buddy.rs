//! Implementation of a Buddy Allocator that is responsible for allocating
//! the physical page frames that are described by a frame store.
//!
//! Every free block is recorded by the index of its first frame inside one
//! free list per order. A block of order `o` spans `2^o` frames and always
//! starts at an index that is a multiple of `2^o`, so the two halves of a
//! block (the buddies) only differ in bit `o - 1` of their index.

use super::{
    buddy_of, floor_log2, frame::Frame, frames_for_order, linked_list::Iter, AllocStats, Error,
    LinkedList, PageAllocator, Result, MAX_ORDER, ORDER_COUNT,
};
use core::fmt;
use log::{debug, trace};

/// The central structure that is responsible for allocating frames
/// using the buddy allocation algorithm.
pub struct BuddyAllocator<'frames> {
    frames: &'frames mut [Frame],
    orders: [LinkedList; ORDER_COUNT],
    stats: AllocStats,
}

impl<'frames> BuddyAllocator<'frames> {
    /// Create an empty buddy allocator that is not bound to any frame store.
    pub fn new() -> Self {
        Self {
            frames: Default::default(),
            orders: [LinkedList::EMPTY; ORDER_COUNT],
            stats: AllocStats::with_name("buddy"),
        }
    }

    /// Binds this allocator to the given frame store.
    ///
    /// No frame is available for allocation afterwards, they have to be
    /// registered using [`insert_range`](Self::insert_range).
    ///
    /// Returns `false` if the store is empty or this allocator
    /// was already initialized.
    pub fn init(&mut self, frames: &'frames mut [Frame]) -> bool {
        if frames.is_empty() || !self.frames.is_empty() {
            return false;
        }

        frames.iter_mut().for_each(|frame| *frame = Frame::EMPTY);

        self.stats.total = frames.len();
        self.frames = frames;
        debug!("Buddy allocator manages {} frames", self.frames.len());
        true
    }

    /// Returns the number of frames inside the frame store.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Allocates a block of `2^order` frames and returns the index of
    /// its first frame.
    ///
    /// The smallest non-empty order that can satisfy the request is used,
    /// and inside this order the block with the lowest index.
    ///
    /// # Panics
    ///
    /// If `order` is larger than [`MAX_ORDER`].
    pub fn allocate(&mut self, order: usize) -> Result<usize> {
        assert!(order <= MAX_ORDER, "invalid order {} given to allocate", order);

        let frames = &mut *self.frames;
        let orders = &mut self.orders;
        let (source_order, block) = (order..ORDER_COUNT)
            .find_map(|source| orders[source].pop(frames).map(|block| (source, block)))
            .ok_or(Error::NoMemoryAvailable)?;

        // walk down the orders and split the block until it has the
        // requested size. the block keeps its index, and the upper half
        // is given back to the free list of the order below.
        for order_to_split in (order + 1..=source_order).rev() {
            let target_order = order_to_split - 1;
            let buddy = buddy_of(block, target_order);
            self.orders[target_order].insert(self.frames, buddy);
        }

        let count = frames_for_order(order);
        self.stats.free -= count;
        self.stats.allocated += count;

        trace!(
            "Allocated block {:#x} with order {} (split from order {})",
            block,
            order,
            source_order
        );
        Ok(block)
    }

    /// Frees the block of `2^order` frames that starts at `index`, and
    /// merges it with its buddy as long as the buddy is free too.
    ///
    /// # Panics
    ///
    /// If `order` is larger than [`MAX_ORDER`], `index` is not a
    /// multiple of `2^order`, or the block lies outside the frame store.
    pub fn free(&mut self, index: usize, order: usize) {
        assert!(order <= MAX_ORDER, "invalid order {} given to free", order);

        let count = frames_for_order(order);
        assert!(
            index & (count - 1) == 0,
            "block {:#x} is not aligned to order {}",
            index,
            order
        );
        assert!(
            index
                .checked_add(count)
                .map_or(false, |end| end <= self.frames.len()),
            "block {:#x} with order {} is outside of the frame store",
            index,
            order
        );

        trace!("Freeing block {:#x} with order {}", index, order);

        let mut index = index;
        let mut order = order;
        while order < MAX_ORDER {
            let buddy = buddy_of(index, order);

            // if the buddy is not free, we can't merge any further
            if !self.orders[order].remove(self.frames, buddy) {
                break;
            }

            index = index.min(buddy);
            order += 1;
        }

        self.orders[order].insert(self.frames, index);

        self.stats.free += count;
        self.stats.allocated = self.stats.allocated.saturating_sub(count);
    }

    /// Marks `count` frames beginning at `start` as available for allocation.
    ///
    /// The range is split up into as few blocks as possible, meaning that
    /// each block is as large as both its alignment and the remaining
    /// range allow. The frames must not be available already.
    ///
    /// # Panics
    ///
    /// If the range exceeds the frame store.
    pub fn insert_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }

        self.check_range(start, count);
        debug!(
            "Making frames {:#x}..{:#x} available for allocation",
            start,
            start + count
        );

        self.insert_blocks(start, count);
        self.stats.free += count;
    }

    /// Marks `count` frames beginning at `start` as unavailable for allocation.
    ///
    /// Free blocks that only partially overlap the range are split up, and
    /// the parts outside the range stay available.
    ///
    /// # Panics
    ///
    /// If the range exceeds the frame store.
    pub fn remove_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }

        self.check_range(start, count);
        debug!(
            "Making frames {:#x}..{:#x} unavailable for allocation",
            start,
            start + count
        );

        let end = start + count;
        let mut removed = 0;
        for order in 0..ORDER_COUNT {
            let size = frames_for_order(order);

            while let Some(block) = self.find_overlapping(order, start, end) {
                self.orders[order].remove(self.frames, block);

                let block_end = block + size;
                removed += block_end.min(end) - block.max(start);

                // the remainders are smaller than `size`, so they always
                // end up in an order that was already visited
                if block < start {
                    self.insert_blocks(block, start - block);
                }
                if block_end > end {
                    self.insert_blocks(end, block_end - end);
                }
            }
        }

        self.stats.free -= removed;
    }

    /// Returns the name of this algorithm.
    pub fn name(&self) -> &'static str {
        self.stats.name
    }

    /// Writes the free lists of every order into the log.
    pub fn dump_state(&self) {
        debug!("BUDDY STATE:");
        for order in 0..ORDER_COUNT {
            debug!("{}", self.free_area(order));
        }
    }

    /// Returns the state of every free list, formatted the same
    /// way as [`dump_state`](Self::dump_state) logs it.
    pub fn state(&self) -> State<'_> {
        State {
            frames: &*self.frames,
            orders: &self.orders,
        }
    }

    /// Returns an iterator over the first frame of every free block
    /// with the given order, in ascending order.
    ///
    /// # Panics
    ///
    /// If `order` is larger than [`MAX_ORDER`].
    pub fn free_blocks(&self, order: usize) -> Iter<'_> {
        assert!(order <= MAX_ORDER, "invalid order {} given to free_blocks", order);
        self.orders[order].iter(&*self.frames)
    }

    /// Counts the free frames by walking all free lists.
    pub fn free_frames(&self) -> usize {
        (0..ORDER_COUNT)
            .map(|order| self.free_blocks(order).count() * frames_for_order(order))
            .sum()
    }

    /// Checks whether the frame at `index` is part of a free block.
    pub fn is_free(&self, index: usize) -> bool {
        (0..ORDER_COUNT).any(|order| {
            let size = frames_for_order(order);
            self.free_blocks(order)
                .take_while(|&block| block <= index)
                .any(|block| index < block + size)
        })
    }

    /// Return a copy of the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.stats.clone()
    }

    /// Registers the range as free blocks, without any checks or statistics.
    ///
    /// Walking from left to right and always taking the largest block that
    /// is aligned at the current index and still fits, results in the same
    /// blocks as first carving out the largest aligned block and then
    /// splitting up the unaligned parts before and after it.
    fn insert_blocks(&mut self, mut start: usize, mut count: usize) {
        while count > 0 {
            let mut order = floor_log2(count).min(MAX_ORDER);
            if start != 0 {
                order = order.min(start.trailing_zeros() as usize);
            }

            self.orders[order].insert(self.frames, start);

            let size = frames_for_order(order);
            start += size;
            count -= size;
        }
    }

    /// Finds the first free block of the given order, that overlaps `start..end`.
    fn find_overlapping(&self, order: usize, start: usize, end: usize) -> Option<usize> {
        let size = frames_for_order(order);
        self.free_blocks(order)
            .take_while(|&block| block < end)
            .find(|&block| block + size > start)
    }

    fn check_range(&self, start: usize, count: usize) {
        assert!(
            start
                .checked_add(count)
                .map_or(false, |end| end <= self.frames.len()),
            "frames {:#x}..{:#x} are outside of the frame store",
            start,
            start.saturating_add(count)
        );
    }

    fn free_area(&self, order: usize) -> FreeArea<'_> {
        FreeArea {
            order,
            blocks: self.free_blocks(order),
        }
    }
}

impl Default for BuddyAllocator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAllocator for BuddyAllocator<'_> {
    fn name(&self) -> &'static str {
        BuddyAllocator::name(self)
    }

    fn allocate(&mut self, order: usize) -> Result<usize> {
        BuddyAllocator::allocate(self, order)
    }

    fn free(&mut self, index: usize, order: usize) {
        BuddyAllocator::free(self, index, order)
    }

    fn insert_range(&mut self, start: usize, count: usize) {
        BuddyAllocator::insert_range(self, start, count)
    }

    fn remove_range(&mut self, start: usize, count: usize) {
        BuddyAllocator::remove_range(self, start, count)
    }

    fn dump_state(&self) {
        BuddyAllocator::dump_state(self)
    }

    fn stats(&self) -> AllocStats {
        BuddyAllocator::stats(self)
    }
}

/// A single line of the state dump: the free blocks of one order.
struct FreeArea<'frames> {
    order: usize,
    blocks: Iter<'frames>,
}

impl fmt::Display for FreeArea<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.order)?;

        self.blocks
            .clone()
            .try_for_each(|block| write!(f, "{:x} ", block))
    }
}

/// The state of every free list of a [`BuddyAllocator`].
pub struct State<'alloc> {
    frames: &'alloc [Frame],
    orders: &'alloc [LinkedList; ORDER_COUNT],
}

impl fmt::Display for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BUDDY STATE:")?;
        self.orders.iter().enumerate().try_for_each(|(order, list)| {
            let area = FreeArea {
                order,
                blocks: list.iter(self.frames),
            };
            writeln!(f, "{}", area)
        })
    }
}
