//! Fixed-capacity frame ring used for both the transmit FIFO and the receive ring
//!
//! One slot is always left unused so that `write == read` means empty and
//! `(write + 1) % N == read` means full. A ring of capacity `N` therefore
//! holds at most `N - 1` frames.
//!
//! Each ring has exactly one producer (moves `write`) and one consumer
//! (moves `read`). The driver enforces this through `&mut self`; sharing a
//! ring between contexts needs a critical section around every call.

use crate::frame::CanFrame;

pub struct FrameRing<const N: usize> {
    slots: [CanFrame; N],
    write: usize,
    read: usize,
}

impl<const N: usize> FrameRing<N> {
    pub const fn new() -> Self {
        Self {
            slots: [CanFrame::empty(); N],
            write: 0,
            read: 0,
        }
    }

    /// Number of slots, including the one that is never filled
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn usable_capacity(&self) -> usize {
        N.saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }

    pub fn is_full(&self) -> bool {
        N == 0 || Self::next(self.write) == self.read
    }

    pub fn len(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            N - self.read + self.write
        }
    }

    /// Copies `frame` (DLC bytes only) into the next free slot.
    /// Returns `false` without touching the ring if it is full.
    pub fn push(&mut self, frame: &CanFrame) -> bool {
        match self.slot_for_write() {
            Some(slot) => {
                slot.copy_from(frame);
                self.commit_write();
                true
            }
            None => false,
        }
    }

    /// Removes and returns the oldest frame
    pub fn pop(&mut self) -> Option<CanFrame> {
        let frame = self.peek()?;
        self.advance_read();
        Some(frame)
    }

    /// Oldest frame, left in place
    pub fn peek(&self) -> Option<CanFrame> {
        if self.is_empty() {
            return None;
        }

        let mut out = CanFrame::empty();
        out.copy_from(&self.slots[self.read]);
        Some(out)
    }

    /// Releases the slot at the read index. Does nothing on an empty ring.
    pub fn advance_read(&mut self) {
        if !self.is_empty() {
            self.read = Self::next(self.read);
        }
    }

    /// Slot at the write index, or `None` if the ring is full. The frame
    /// only becomes visible to the consumer after [`FrameRing::commit_write`].
    pub fn slot_for_write(&mut self) -> Option<&mut CanFrame> {
        if self.is_full() {
            return None;
        }

        Some(&mut self.slots[self.write])
    }

    /// Publishes the slot handed out by [`FrameRing::slot_for_write`].
    pub fn commit_write(&mut self) {
        if !self.is_full() {
            self.write = Self::next(self.write);
        }
    }

    pub fn clear(&mut self) {
        self.read = self.write;
    }

    fn next(index: usize) -> usize {
        (index + 1) % N
    }
}

impl<const N: usize> Default for FrameRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
