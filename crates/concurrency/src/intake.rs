//! Double-buffered request intake
//!
//! Submitters append to the pending buffer; the driver swaps buffers and
//! works through the batch it took while new submissions keep landing in
//! the other buffer. Both buffers keep their capacity across swaps, so a
//! steady submit/poll cycle stops allocating after warmup.
//!
//! ```text
//!   submit ──push──▶ [pending]          poll ──swap──▶ [in-flight batch]
//!                        ▲                                   │
//!                        └──────── recycled buffer ◀─────────┘
//! ```

/// Two-buffer queue feeding the driver thread
#[derive(Debug)]
pub struct IntakeQueue<T> {
    pending: Vec<T>,
    in_flight: Vec<T>,
}

impl<T> IntakeQueue<T> {
    /// Empty queue
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    /// Append to the pending buffer
    pub fn push(&mut self, item: T) {
        self.pending.push(item);
    }

    /// Exchange buffers and hand out the batch collected since the last swap
    ///
    /// The previous batch buffer is cleared and becomes the new pending
    /// buffer.
    pub fn swap(&mut self) -> std::vec::Drain<'_, T> {
        self.in_flight.clear();
        std::mem::swap(&mut self.pending, &mut self.in_flight);
        self.in_flight.drain(..)
    }

    /// Drop pending items matching `predicate`
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|item| !predicate(item));
        before - self.pending.len()
    }

    /// Items waiting for the next swap
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for IntakeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
