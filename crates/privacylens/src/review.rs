//! Track deduplication for human review.
//!
//! A video produces many detections of the same physical object. Review
//! needs one row per distinct track: when it first appeared, its best
//! sighting, and optionally a cropped thumbnail of the first sighting.
//! The resulting manifest is what a reviewer curates into the
//! `curated_ids` list for a redaction run, so curation happens before
//! the redaction pass, never as a rewrite of already-written output.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::imageops;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::{BoundingBox, Detection, DetectionSource, FrameRecord};

/// One distinct track, deduplicated across the whole video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Stable tracker-assigned ID.
    pub track_id: u64,
    /// Class label from the first sighting.
    pub class_label: String,
    /// Frame index of the first sighting.
    pub first_seen_frame: u64,
    /// First sighting in seconds, estimated as `frame / fps`.
    pub first_seen_timestamp: f64,
    /// Highest confidence across all sightings. Ties keep the earliest.
    pub best_confidence: f32,
    /// Bounding box of the best sighting.
    pub best_bbox: BoundingBox,
    /// Thumbnail of the first sighting, when crops were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<PathBuf>,
}

/// The review manifest: every distinct track, in order of appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewManifest {
    /// When the manifest was generated.
    pub generated_at: DateTime<Utc>,
    /// Frame rate used for timestamp estimation.
    pub fps: f64,
    /// Distinct tracks sorted by first appearance.
    pub tracks: Vec<TrackSummary>,
}

impl ReviewManifest {
    /// Every track ID in the manifest, ready to paste into
    /// `redaction.curated_ids`.
    #[must_use]
    pub fn track_ids(&self) -> Vec<u64> {
        self.tracks.iter().map(|t| t.track_id).collect()
    }
}

/// Accumulates per-track summaries over a frame stream.
#[derive(Debug)]
pub struct TrackReview {
    fps: f64,
    crops_dir: Option<PathBuf>,
    tracks: HashMap<u64, TrackSummary>,
    frames_seen: u64,
}

impl TrackReview {
    /// Create a review pass with the given frame rate for timestamps.
    #[must_use]
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            crops_dir: None,
            tracks: HashMap::new(),
            frames_seen: 0,
        }
    }

    /// Also write a cropped thumbnail of each track's first sighting
    /// into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_crops_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
            path: dir.clone(),
            source,
        })?;
        self.crops_dir = Some(dir);
        Ok(self)
    }

    /// Fold one frame's detections into the running summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if a thumbnail cannot be written.
    pub fn observe(&mut self, frame: &FrameRecord) -> Result<()> {
        self.frames_seen += 1;
        for detection in &frame.detections {
            if let Some(summary) = self.tracks.get_mut(&detection.track_id) {
                // Strictly greater: on a tie the earliest sighting wins.
                if detection.confidence > summary.best_confidence {
                    summary.best_confidence = detection.confidence;
                    summary.best_bbox = detection.bbox;
                }
            } else {
                let crop = self.write_crop(frame, detection)?;
                #[allow(clippy::cast_precision_loss)]
                let first_seen_timestamp = frame.frame_index as f64 / self.fps;
                tracing::debug!(
                    track_id = detection.track_id,
                    class = %detection.class_label,
                    frame_index = frame.frame_index,
                    "new track"
                );
                self.tracks.insert(
                    detection.track_id,
                    TrackSummary {
                        track_id: detection.track_id,
                        class_label: detection.class_label.clone(),
                        first_seen_frame: frame.frame_index,
                        first_seen_timestamp,
                        best_confidence: detection.confidence,
                        best_bbox: detection.bbox,
                        crop,
                    },
                );
            }
        }
        Ok(())
    }

    /// Consume an entire source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInput`] if the source yields no frames, or any
    /// source or thumbnail error.
    pub fn consume<D: DetectionSource>(&mut self, source: &mut D) -> Result<()> {
        while let Some(frame) = source.next_frame()? {
            self.observe(&frame)?;
        }
        if self.frames_seen == 0 {
            return Err(Error::NoInput);
        }
        Ok(())
    }

    /// Finish the pass and produce the manifest, sorted by first
    /// appearance (track ID breaks ties).
    #[must_use]
    pub fn build(self) -> ReviewManifest {
        let mut tracks: Vec<TrackSummary> = self.tracks.into_values().collect();
        tracks.sort_by_key(|t| (t.first_seen_frame, t.track_id));
        tracing::info!(
            tracks = tracks.len(),
            frames = self.frames_seen,
            "review manifest built"
        );
        ReviewManifest {
            generated_at: Utc::now(),
            fps: self.fps,
            tracks,
        }
    }

    fn write_crop(&self, frame: &FrameRecord, detection: &Detection) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.crops_dir else {
            return Ok(None);
        };
        let Some(rect) = detection.bbox.clamp_to(frame.width(), frame.height()) else {
            return Ok(None);
        };
        let crop =
            imageops::crop_imm(&frame.pixels, rect.x, rect.y, rect.width, rect.height).to_image();
        let path = dir.join(format!("track_{:04}.png", detection.track_id));
        crop.save(&path).map_err(|source| Error::FrameWrite {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }
}
