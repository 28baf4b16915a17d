//! Bounded FIFO buffer of recent frames.
//!
//! The buffer holds the last `capacity` frames so that an activation on
//! frame *N* can still redact the same track's appearances on frames
//! *N - capacity + 1 ..= N* before they are emitted. The capacity is a hard
//! limit: it is the only thing bounding the engine's memory use, so
//! violations are programming errors and fail fast.

use std::collections::VecDeque;

use crate::frame::FrameRecord;

/// A bounded FIFO of [`FrameRecord`]s.
///
/// Invariants, enforced with assertions:
/// - length never exceeds capacity;
/// - frame indices are strictly increasing;
/// - frames leave strictly in frame-index order (FIFO, no reordering).
#[derive(Debug)]
pub struct RedactionBuffer {
    frames: VecDeque<FrameRecord>,
    capacity: usize,
    last_index: Option<u64>,
}

impl RedactionBuffer {
    /// Create a buffer with the given hard capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "redaction buffer capacity must be > 0");
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            last_index: None,
        }
    }

    /// Append a frame at the tail.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is already at capacity (the caller must pop
    /// before pushing again) or if the frame index does not strictly
    /// increase.
    pub fn push(&mut self, frame: FrameRecord) {
        assert!(
            self.frames.len() < self.capacity,
            "redaction buffer over capacity: push without emit"
        );
        if let Some(last) = self.last_index {
            assert!(
                frame.frame_index > last,
                "frame index {} not after {}",
                frame.frame_index,
                last
            );
        }
        self.last_index = Some(frame.frame_index);
        self.frames.push_back(frame);
    }

    /// Remove and return the oldest frame, if any.
    pub fn pop_oldest(&mut self) -> Option<FrameRecord> {
        self.frames.pop_front()
    }

    /// Mutable access to the most recently pushed frame.
    pub fn newest_mut(&mut self) -> Option<&mut FrameRecord> {
        self.frames.back_mut()
    }

    /// Iterate mutably over every frame except the newest.
    ///
    /// This is the retroactive-redaction window: the newest frame is
    /// handled by the regular per-frame pass.
    pub fn older_frames_mut(&mut self) -> impl Iterator<Item = &mut FrameRecord> {
        let older = self.frames.len().saturating_sub(1);
        self.frames.iter_mut().take(older)
    }

    /// Whether the buffer has reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// Current number of buffered frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the buffer holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The hard capacity of this buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
