//! Intrusive, address-ordered linked list of free blocks.

use super::frame::Frame;

/// Intrusive linked list used in the buddy allocator.
///
/// The list only stores the index of its first block. Every other link
/// lives inside the [`Frame`] record of the previous block, so each
/// operation takes the frame store the list was built in.
///
/// The entries are always kept in strictly ascending order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedList {
    head: Option<usize>,
}

impl LinkedList {
    /// An empty list.
    pub const EMPTY: LinkedList = LinkedList { head: None };

    /// Create a new `LinkedList`.
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Returns whether this list is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the first, and therefore lowest, entry of this list.
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Insert `item` right before the first entry that is not smaller than it.
    pub fn insert(&mut self, frames: &mut [Frame], item: usize) {
        let mut prev: Option<usize> = None;
        let mut current = self.head;

        while let Some(idx) = current {
            if idx >= item {
                break;
            }

            prev = Some(idx);
            current = frames[idx].next_free();
        }

        assert_ne!(
            current,
            Some(item),
            "block {:#x} is already part of the free list",
            item
        );

        frames[item].set_next_free(current);
        match prev {
            Some(prev) => frames[prev].set_next_free(Some(item)),
            None => self.head = Some(item),
        }
    }

    /// Remove `item` from this list.
    ///
    /// Returns `false` if `item` wasn't part of the list.
    pub fn remove(&mut self, frames: &mut [Frame], item: usize) -> bool {
        let mut prev: Option<usize> = None;
        let mut current = self.head;

        while let Some(idx) = current {
            // the list is sorted, so `item` can't come after this point
            if idx > item {
                return false;
            }

            let next = frames[idx].next_free();
            if idx == item {
                match prev {
                    Some(prev) => frames[prev].set_next_free(next),
                    None => self.head = next,
                }
                frames[idx].set_next_free(None);
                return true;
            }

            prev = Some(idx);
            current = next;
        }

        false
    }

    /// Removes the first item from this list.
    pub fn pop(&mut self, frames: &mut [Frame]) -> Option<usize> {
        let item = self.head?;
        self.head = frames[item].next_free();
        frames[item].set_next_free(None);
        Some(item)
    }

    /// Returns an iterator over the entries of `self`, in ascending order.
    pub fn iter<'frames>(&self, frames: &'frames [Frame]) -> Iter<'frames> {
        Iter {
            head: self.head,
            frames,
        }
    }
}

/// Iterator over the entries of a [`LinkedList`].
#[derive(Clone)]
pub struct Iter<'frames> {
    head: Option<usize>,
    frames: &'frames [Frame],
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.head?;
        self.head = self.frames[item].next_free();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(frames: &mut [Frame], items: &[usize]) -> LinkedList {
        let mut list = LinkedList::new();
        items.iter().for_each(|&item| list.insert(frames, item));
        list
    }

    #[test]
    fn insert_keeps_ascending_order() {
        let mut frames = [Frame::EMPTY; 16];
        let list = list_of(&mut frames, &[8, 2, 12, 0, 4]);

        assert_eq!(list.iter(&frames).collect::<Vec<_>>(), [0, 2, 4, 8, 12]);
        assert_eq!(list.head(), Some(0));
    }

    #[test]
    fn remove_reports_membership() {
        let mut frames = [Frame::EMPTY; 16];
        let mut list = list_of(&mut frames, &[1, 5, 9]);

        assert!(!list.remove(&mut frames, 4));
        assert!(!list.remove(&mut frames, 10));
        assert!(list.remove(&mut frames, 5));
        assert!(!list.remove(&mut frames, 5));
        assert_eq!(list.iter(&frames).collect::<Vec<_>>(), [1, 9]);

        assert!(list.remove(&mut frames, 1));
        assert!(list.remove(&mut frames, 9));
        assert!(list.is_empty());
        assert_eq!(frames, [Frame::EMPTY; 16]);
    }

    #[test]
    fn pop_takes_the_lowest_entry() {
        let mut frames = [Frame::EMPTY; 8];
        let mut list = list_of(&mut frames, &[6, 3, 7]);

        assert_eq!(list.pop(&mut frames), Some(3));
        assert_eq!(list.pop(&mut frames), Some(6));
        assert_eq!(list.pop(&mut frames), Some(7));
        assert_eq!(list.pop(&mut frames), None);
    }

    #[test]
    #[should_panic(expected = "already part of the free list")]
    fn duplicate_insert_is_caught() {
        let mut frames = [Frame::EMPTY; 4];
        list_of(&mut frames, &[2, 2]);
    }
}
