//! Run-level source and sink adapters.
//!
//! Video container decode and encode happen outside this crate. The
//! hand-off formats are a JSON-Lines detection manifest plus a directory
//! of per-frame images on the way in, and a directory of numbered PNGs on
//! the way out.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::frame::{BoundingBox, Detection, DetectionSource, FrameRecord, FrameSink};

/// One detection as it appears in the manifest.
///
/// The tracker may emit detections it could not assign a stable ID to.
/// Those cannot be redacted selectively, so the source drops them with a
/// warning instead of failing the run.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    /// Track ID, when the tracker assigned one.
    #[serde(default)]
    pub track_id: Option<u64>,
    /// Detector class label.
    pub class_label: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box as `[x1, y1, x2, y2]`.
    pub bbox: BoundingBox,
}

/// One manifest line: a frame and its detections.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestRecord {
    /// Zero-based frame index.
    pub frame_index: u64,
    /// Frame image file name, relative to the frames directory.
    pub image: String,
    /// Detections for this frame. May be empty.
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Reads a JSON-Lines detection manifest and the frame images it names.
///
/// Lines are consumed lazily so a long video is never held in memory.
/// Frame indices must be strictly increasing; blank lines are skipped.
#[derive(Debug)]
pub struct ManifestSource {
    lines: Lines<BufReader<File>>,
    frames_dir: PathBuf,
    line_number: usize,
    last_index: Option<u64>,
    dropped_detections: u64,
}

impl ManifestSource {
    /// Open a manifest file alongside its frame-image directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be opened.
    pub fn open(manifest: impl Into<PathBuf>, frames_dir: impl Into<PathBuf>) -> Result<Self> {
        let manifest = manifest.into();
        let frames_dir = frames_dir.into();
        tracing::debug!(manifest = %manifest.display(), frames = %frames_dir.display(), "opening detection manifest");
        let file = File::open(&manifest)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            frames_dir,
            line_number: 0,
            last_index: None,
            dropped_detections: 0,
        })
    }

    /// Detections dropped so far because the tracker assigned no ID.
    #[must_use]
    pub fn dropped_detections(&self) -> u64 {
        self.dropped_detections
    }

    fn next_record(&mut self) -> Result<Option<ManifestRecord>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_number += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ManifestRecord =
                serde_json::from_str(&line).map_err(|source| Error::DetectionParse {
                    line: self.line_number,
                    source,
                })?;
            return Ok(Some(record));
        }
    }

    fn convert_detections(&mut self, frame_index: u64, raw: Vec<RawDetection>) -> Vec<Detection> {
        let mut detections = Vec::with_capacity(raw.len());
        for detection in raw {
            match detection.track_id {
                Some(track_id) => detections.push(Detection {
                    track_id,
                    class_label: detection.class_label,
                    confidence: detection.confidence,
                    bbox: detection.bbox,
                }),
                None => {
                    self.dropped_detections += 1;
                    tracing::warn!(
                        frame_index,
                        class = %detection.class_label,
                        confidence = detection.confidence,
                        "dropping detection without a track ID; it cannot be redacted selectively"
                    );
                }
            }
        }
        detections
    }
}

impl DetectionSource for ManifestSource {
    fn next_frame(&mut self) -> Result<Option<FrameRecord>> {
        let Some(record) = self.next_record()? else {
            return Ok(None);
        };

        if let Some(prev) = self.last_index {
            if record.frame_index <= prev {
                return Err(Error::FrameOrder {
                    prev,
                    got: record.frame_index,
                });
            }
        }
        self.last_index = Some(record.frame_index);

        let path = self.frames_dir.join(&record.image);
        let pixels = image::open(&path)
            .map_err(|source| Error::FrameRead {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        let detections = self.convert_detections(record.frame_index, record.detections);
        Ok(Some(FrameRecord::new(
            record.frame_index,
            pixels,
            detections,
        )))
    }
}

/// Writes emitted frames as numbered PNGs into a directory.
///
/// File names are `frame_NNNNNN.png` keyed by frame index, so the
/// external video writer can reassemble them in order.
#[derive(Debug)]
pub struct ImageDirSink {
    dir: PathBuf,
    frames_written: u64,
}

impl ImageDirSink {
    /// Create the output directory (and parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            frames_written: 0,
        })
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Output file path for a frame index.
    #[must_use]
    pub fn frame_path(&self, frame_index: u64) -> PathBuf {
        self.dir.join(format!("frame_{frame_index:06}.png"))
    }
}

impl FrameSink for ImageDirSink {
    fn write(&mut self, frame: FrameRecord) -> Result<()> {
        let path = self.frame_path(frame.frame_index);
        frame.pixels.save(&path).map_err(|source| Error::FrameWrite {
            path: path.clone(),
            source,
        })?;
        self.frames_written += 1;
        Ok(())
    }
}
