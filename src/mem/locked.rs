//! Thread-safe wrapper around a [`PageAllocator`].

use super::{order_for_count, AllocStats, Error, PageAllocator, Result, MAX_ORDER};
use spin::{Mutex, MutexGuard};

/// The central allocator that is responsible for allocating physical frames.
///
/// Every method acquires the lock exactly once and releases it before
/// returning, so a single call is atomic. Use [`lock`](Self::lock) if
/// multiple calls must happen without interruption.
pub struct LockedAllocator<A> {
    inner: Mutex<A>,
}

impl<A: PageAllocator> LockedAllocator<A> {
    /// Create a new locked allocator.
    pub const fn new(alloc: A) -> Self {
        Self {
            inner: Mutex::new(alloc),
        }
    }

    /// Manually acquire the internal lock and get a guard to the allocator.
    pub fn lock(&self) -> MutexGuard<'_, A> {
        self.inner.lock()
    }

    /// Returns the name of the wrapped algorithm.
    pub fn name(&self) -> &'static str {
        self.lock().name()
    }

    /// Allocate a single frame.
    pub fn alloc(&self) -> Result<usize> {
        // order 0 is exactly one frame
        self.lock().allocate(0)
    }

    /// Allocate a block of contiguous frames that holds at least `count` frames.
    ///
    /// The block is rounded up to the next power of two, so it has to be
    /// freed using [`order_for_count(count)`](order_for_count).
    pub fn alloc_pages(&self, count: usize) -> Result<usize> {
        if count == 0 {
            return Err(Error::AllocateZeroPages);
        }

        let order = order_for_count(count);
        if order > MAX_ORDER {
            return Err(Error::OrderTooLarge);
        }

        self.lock().allocate(order)
    }

    /// Allocate a block of `2^order` contiguous frames.
    pub fn allocate(&self, order: usize) -> Result<usize> {
        self.lock().allocate(order)
    }

    /// Free the block of `2^order` frames starting at `index`.
    pub fn free(&self, index: usize, order: usize) {
        self.lock().free(index, order)
    }

    /// Makes `count` frames starting at `start` available for allocation.
    pub fn insert_range(&self, start: usize, count: usize) {
        self.lock().insert_range(start, count)
    }

    /// Makes `count` frames starting at `start` unavailable for allocation.
    pub fn remove_range(&self, start: usize, count: usize) {
        self.lock().remove_range(start, count)
    }

    /// Writes the current state of the wrapped algorithm into the log.
    pub fn dump_state(&self) {
        self.lock().dump_state()
    }

    /// Return the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.lock().stats()
    }
}
