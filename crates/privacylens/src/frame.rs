//! Core frame and detection types for privacylens.
//!
//! This module defines the fundamental data structures for representing
//! decoded video frames and the per-frame detections produced by the
//! upstream detector/tracker.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An axis-aligned bounding box in pixel coordinates (TLBR format).
///
/// Coordinates come straight from the detector and may extend past the
/// frame bounds; use [`BoundingBox::clamp_to`] before touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    /// Left edge (x1).
    pub x1: f32,
    /// Top edge (y1).
    pub y1: f32,
    /// Right edge (x2).
    pub x2: f32,
    /// Bottom edge (y2).
    pub y2: f32,
}

impl BoundingBox {
    /// Create a bounding box from TLBR coordinates.
    #[must_use]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Clamp this box to `[0, width) x [0, height)` frame bounds.
    ///
    /// Returns `None` when the clamped region is degenerate (zero area),
    /// including boxes entirely outside the frame. Degenerate boxes are a
    /// no-op for the renderer, never an error.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<PixelRect> {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        let x1 = self.x1.min(self.x2).clamp(0.0, w);
        let x2 = self.x1.max(self.x2).clamp(0.0, w);
        let y1 = self.y1.min(self.y2).clamp(0.0, h);
        let y2 = self.y1.max(self.y2).clamp(0.0, h);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (x1.floor() as u32, y1.floor() as u32);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (right, bottom) = (x2.floor() as u32, y2.floor() as u32);

        let rect_width = right.saturating_sub(x);
        let rect_height = bottom.saturating_sub(y);
        if rect_width == 0 || rect_height == 0 {
            return None;
        }

        Some(PixelRect {
            x,
            y,
            width: rect_width,
            height: rect_height,
        })
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// An integer pixel region fully inside a frame, with non-zero area.
///
/// Produced only by [`BoundingBox::clamp_to`], so downstream code can rely
/// on the region being in-bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels (always >= 1).
    pub width: u32,
    /// Height in pixels (always >= 1).
    pub height: u32,
}

/// A single detection of a tracked object in one frame.
///
/// Produced once per track per frame it appears in; immutable once created
/// and owned by the frame it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Stable identifier assigned by the external tracker.
    pub track_id: u64,

    /// Detector class label (e.g. "credit_card", "car_plate").
    pub class_label: String,

    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,

    /// Bounding box of the detected region.
    pub bbox: BoundingBox,
}

/// A decoded video frame paired with its detections.
///
/// Created by a [`DetectionSource`], mutated in place by the renderer
/// (blur is applied destructively), and consumed when handed to a
/// [`FrameSink`].
#[derive(Debug, Clone)]
pub struct FrameRecord {
    /// Zero-based frame index, strictly increasing across the stream.
    pub frame_index: u64,

    /// The frame's pixel buffer.
    pub pixels: RgbImage,

    /// Detections for this frame, in detector order. May be empty.
    pub detections: Vec<Detection>,
}

impl FrameRecord {
    /// Create a new frame record.
    #[must_use]
    pub fn new(frame_index: u64, pixels: RgbImage, detections: Vec<Detection>) -> Self {
        Self {
            frame_index,
            pixels,
            detections,
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// An ordered, finite, non-restartable stream of frames with detections.
///
/// Implementors pair each decoded frame with the detections the external
/// tracker produced for it. Frame indices must be strictly increasing
/// from 0. Pulling the next frame may block on external model inference;
/// the engine itself performs no concurrent work.
pub trait DetectionSource {
    /// Yield the next frame, or `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the next frame or its detections cannot be
    /// produced (decode failure, malformed manifest, out-of-order index).
    fn next_frame(&mut self) -> Result<Option<FrameRecord>>;
}

/// Receives fully-redacted frames in emission order.
///
/// Frames arrive strictly in frame-index order and must be encoded or
/// written without reordering.
pub trait FrameSink {
    /// Write one emitted frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    fn write(&mut self, frame: FrameRecord) -> Result<()>;
}
