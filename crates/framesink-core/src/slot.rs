//! Latest-wins frame exchange
//!
//! The single synchronization point between the receiver thread and the
//! presenter. Holds at most one pending frame; publishing replaces any
//! unconsumed frame, so a slow presenter causes silent drops instead of
//! memory growth or a stalled producer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::frame::Frame;

/// Single-capacity, latest-value-wins exchange between two threads.
///
/// Contract: `publish` never blocks the producer on a slow consumer,
/// at most one frame is stored, and each published frame is consumed at
/// most once. Both operations are a store/take of one `Option` under an
/// uncontended lock.
#[derive(Default)]
pub struct FrameSlot {
    pending: Mutex<Option<Frame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, Option<Frame>> {
        // Neither operation can panic while holding the lock, so a
        // poisoned mutex still contains a valid Option.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `frame`, discarding any frame not yet consumed.
    pub fn publish(&self, frame: Frame) {
        self.pending().replace(frame);
    }

    /// Exchange the current frame for empty, returning whatever was there.
    pub fn take_and_clear(&self) -> Option<Frame> {
        self.pending().take()
    }

    /// Whether a frame is waiting to be consumed.
    pub fn has_pending(&self) -> bool {
        self.pending().is_some()
    }
}
