//! Activation policy and per-track state.
//!
//! A policy decides whether a detection qualifies a track for redaction.
//! Activation is monotonic: once a track activates it stays activated for
//! the remainder of the run, so redaction is irreversible once triggered.

use std::collections::HashSet;

use crate::frame::{BoundingBox, Detection};

/// Decides whether a track should be redacted.
///
/// Chosen once per run and immutable for the run's duration. Both variants
/// drive the same retroactive-buffer path in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RedactionPolicy {
    /// A fixed set of track IDs, chosen by an external review step, is
    /// redacted for the entire video regardless of confidence.
    Curated(HashSet<u64>),

    /// A track becomes redacted the first time any of its detections
    /// meets the threshold.
    ConfidenceThreshold(f32),
}

impl RedactionPolicy {
    /// Build a curated policy from a set of track IDs.
    #[must_use]
    pub fn curated(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::Curated(ids.into_iter().collect())
    }

    /// Build a confidence-triggered policy.
    #[must_use]
    pub fn confidence(threshold: f32) -> Self {
        Self::ConfidenceThreshold(threshold)
    }

    /// Whether this detection qualifies its track for redaction.
    ///
    /// For curated mode any detection of a member track qualifies; for
    /// confidence mode the detection's confidence must meet the threshold.
    #[must_use]
    pub fn qualifies(&self, detection: &Detection) -> bool {
        match self {
            Self::Curated(ids) => ids.contains(&detection.track_id),
            Self::ConfidenceThreshold(threshold) => detection.confidence >= *threshold,
        }
    }

    /// Short policy name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Curated(_) => "curated",
            Self::ConfidenceThreshold(_) => "confidence",
        }
    }
}

/// Mutable per-track engine state.
///
/// One entry per track ever seen; created on first detection of that track
/// and updated each frame. Bounded by the number of distinct tracks in a
/// video, which is assumed small.
#[derive(Debug, Clone)]
pub struct TrackState {
    /// Whether this track has been activated. Never reset.
    pub activated: bool,

    /// How many more frames the last-known region stays blurred when
    /// detections momentarily stop. Does not deactivate a track.
    pub persistence_remaining: u32,

    /// The most recently seen bounding box for this track.
    pub last_bbox: BoundingBox,

    /// Class label from the most recent detection.
    pub class_label: String,

    /// Confidence of the most recent detection.
    pub last_confidence: f32,
}

impl TrackState {
    /// Create state for a track from its first detection.
    #[must_use]
    pub fn new(detection: &Detection) -> Self {
        Self {
            activated: false,
            persistence_remaining: 0,
            last_bbox: detection.bbox,
            class_label: detection.class_label.clone(),
            last_confidence: detection.confidence,
        }
    }

    /// Record a fresh detection of this track.
    pub fn note_detection(&mut self, detection: &Detection) {
        self.last_bbox = detection.bbox;
        self.last_confidence = detection.confidence;
        if self.class_label != detection.class_label {
            self.class_label.clone_from(&detection.class_label);
        }
    }
}
