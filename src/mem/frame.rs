//! The per-frame metadata records that make up a frame store.

/// Metadata record for a single physical page frame.
///
/// A frame is identified by its index inside the frame store. The only
/// state a frame carries is the link to the next free block, which is
/// meaningful only while the frame is the first frame of a free block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    next_free: Option<usize>,
}

impl Frame {
    /// A frame that is not linked into any free list.
    pub const EMPTY: Frame = Frame { next_free: None };

    /// Create a new, unlinked frame record.
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Returns the index of the next free block, if this frame
    /// is linked into a free list.
    pub fn next_free(&self) -> Option<usize> {
        self.next_free
    }

    pub(super) fn set_next_free(&mut self, next: Option<usize>) {
        self.next_free = next;
    }
}
