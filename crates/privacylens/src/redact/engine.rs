//! The stateful temporal redaction engine.
//!
//! The engine owns the frame buffer, per-track state, and the renderer,
//! and ties them together: frames enter, sit in the buffer for up to
//! `buffer_frames` frames, and leave through the sink strictly in order.
//! When a track activates, the buffered frames are redacted retroactively
//! before they can be emitted. Frames already emitted are gone; the buffer
//! capacity is the documented limit of how far back redaction can reach.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::frame::{DetectionSource, FrameRecord, FrameSink};
use crate::redact::buffer::RedactionBuffer;
use crate::redact::policy::{RedactionPolicy, TrackState};
use crate::redact::renderer::Renderer;

/// Counters accumulated over one engine run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Frames pulled from the source.
    pub frames_processed: u64,
    /// Frames handed to the sink.
    pub frames_emitted: u64,
    /// Tracks that activated (each counted once).
    pub tracks_activated: u64,
    /// Individual region blurs applied, including retroactive and
    /// persistence blurs.
    pub regions_blurred: u64,
}

/// Single-pass redaction over an ordered frame stream.
///
/// One engine handles one run; the policy is fixed for its lifetime and
/// activation is never undone. Frames still buffered when the engine is
/// dropped without [`RedactionEngine::finish`] are discarded, never
/// emitted unredacted.
#[derive(Debug)]
pub struct RedactionEngine {
    policy: RedactionPolicy,
    buffer: RedactionBuffer,
    tracks: HashMap<u64, TrackState>,
    renderer: Renderer,
    persistence_frames: u32,
    stats: EngineStats,
}

impl RedactionEngine {
    /// Create an engine with the given policy and lookback window.
    ///
    /// `buffer_frames` is both the buffer capacity and the number of
    /// frames a track's last-known region stays blurred after its
    /// detections stop.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_frames` is 0.
    #[must_use]
    pub fn new(policy: RedactionPolicy, buffer_frames: usize, renderer: Renderer) -> Self {
        tracing::debug!(
            policy = policy.name(),
            buffer_frames,
            "redaction engine ready"
        );
        Self {
            policy,
            buffer: RedactionBuffer::new(buffer_frames),
            tracks: HashMap::new(),
            renderer,
            persistence_frames: u32::try_from(buffer_frames).unwrap_or(u32::MAX),
            stats: EngineStats::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Ingest one frame, then emit the oldest buffered frame if the
    /// buffer is at capacity.
    ///
    /// The incoming frame is redacted per the policy, retroactive blur is
    /// applied to still-buffered frames for any track that activated on
    /// this frame, and persistence countdowns advance.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the emitted frame.
    pub fn process_frame<S: FrameSink>(&mut self, frame: FrameRecord, sink: &mut S) -> Result<()> {
        self.stats.frames_processed += 1;
        self.buffer.push(frame);

        let newly_activated = self.redact_newest();
        if !newly_activated.is_empty() {
            self.redact_retroactively(&newly_activated);
        }

        if self.buffer.is_full() {
            if let Some(oldest) = self.buffer.pop_oldest() {
                tracing::trace!(frame_index = oldest.frame_index, "emitting frame");
                sink.write(oldest)?;
                self.stats.frames_emitted += 1;
            }
        }
        Ok(())
    }

    /// Flush every buffered frame to the sink, in order, and return the
    /// run's counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects a frame.
    pub fn finish<S: FrameSink>(mut self, sink: &mut S) -> Result<EngineStats> {
        while let Some(frame) = self.buffer.pop_oldest() {
            sink.write(frame)?;
            self.stats.frames_emitted += 1;
        }
        tracing::info!(
            frames = self.stats.frames_processed,
            tracks_activated = self.stats.tracks_activated,
            regions_blurred = self.stats.regions_blurred,
            "redaction run complete"
        );
        Ok(self.stats)
    }

    /// Drive the engine over an entire source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInput`] if the source yields no frames at all,
    /// or any error from the source or sink.
    pub fn run<D, S>(mut self, source: &mut D, sink: &mut S) -> Result<EngineStats>
    where
        D: DetectionSource,
        S: FrameSink,
    {
        while let Some(frame) = source.next_frame()? {
            self.process_frame(frame, sink)?;
        }
        if self.stats.frames_processed == 0 {
            return Err(Error::NoInput);
        }
        self.finish(sink)
    }

    /// Run the policy and persistence passes over the newest buffered
    /// frame, blurring in place. Returns the tracks that activated on
    /// this frame.
    fn redact_newest(&mut self) -> HashSet<u64> {
        let mut newly_activated = HashSet::new();
        let Some(frame) = self.buffer.newest_mut() else {
            return newly_activated;
        };
        let FrameRecord {
            frame_index,
            pixels,
            detections,
        } = frame;

        let mut seen = HashSet::new();
        let mut counters_reset = HashSet::new();

        for detection in detections.iter() {
            seen.insert(detection.track_id);
            let state = self
                .tracks
                .entry(detection.track_id)
                .or_insert_with(|| TrackState::new(detection));
            state.note_detection(detection);

            if self.policy.qualifies(detection) {
                if !state.activated {
                    state.activated = true;
                    self.stats.tracks_activated += 1;
                    newly_activated.insert(detection.track_id);
                    tracing::info!(
                        track_id = detection.track_id,
                        class = %detection.class_label,
                        confidence = detection.confidence,
                        frame_index = *frame_index,
                        "track activated for redaction"
                    );
                }
                state.persistence_remaining = self.persistence_frames;
                counters_reset.insert(detection.track_id);
            }

            // Activation is monotonic: any later sighting of an activated
            // track is blurred regardless of its confidence.
            if state.activated && self.renderer.redact_detection(pixels, detection) {
                self.stats.regions_blurred += 1;
            }
        }

        // Persistence pass: keep blurring the last-known region of an
        // activated track through short tracker dropouts. The countdown
        // does not advance on frames where a qualifying detection just
        // reset it, so a dropout after frame N covers exactly the next
        // `persistence_frames` frames.
        for (track_id, state) in &mut self.tracks {
            if !state.activated
                || state.persistence_remaining == 0
                || counters_reset.contains(track_id)
            {
                continue;
            }
            if !seen.contains(track_id) {
                tracing::debug!(
                    track_id,
                    remaining = state.persistence_remaining,
                    frame_index = *frame_index,
                    "blurring stale region through tracker dropout"
                );
                if self.renderer.redact(pixels, &state.last_bbox) {
                    self.stats.regions_blurred += 1;
                }
            }
            state.persistence_remaining -= 1;
        }

        newly_activated
    }

    /// Blur every buffered appearance of the given tracks on frames older
    /// than the newest.
    fn redact_retroactively(&mut self, track_ids: &HashSet<u64>) {
        for frame in self.buffer.older_frames_mut() {
            let FrameRecord {
                pixels, detections, ..
            } = frame;
            for detection in detections.iter() {
                if track_ids.contains(&detection.track_id)
                    && self.renderer.redact_detection(pixels, detection)
                {
                    self.stats.regions_blurred += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlurConfig, OverlayConfig};
    use crate::frame::{BoundingBox, Detection};
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    const WIDTH: u32 = 48;
    const HEIGHT: u32 = 48;

    struct VecSink {
        frames: Vec<FrameRecord>,
    }

    impl VecSink {
        fn new() -> Self {
            Self { frames: Vec::new() }
        }
    }

    impl FrameSink for VecSink {
        fn write(&mut self, frame: FrameRecord) -> Result<()> {
            if let Some(last) = self.frames.last() {
                assert!(frame.frame_index > last.frame_index, "sink saw reordering");
            }
            self.frames.push(frame);
            Ok(())
        }
    }

    struct VecSource {
        frames: VecDeque<FrameRecord>,
    }

    impl DetectionSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<FrameRecord>> {
            Ok(self.frames.pop_front())
        }
    }

    fn test_renderer() -> Renderer {
        let blur = BlurConfig {
            kernel_size: 7,
            sigma: 3.0,
        };
        Renderer::new(&blur, &OverlayConfig::default()).unwrap()
    }

    fn engine(policy: RedactionPolicy, buffer_frames: usize) -> RedactionEngine {
        crate::logging::init_test_logging();
        RedactionEngine::new(policy, buffer_frames, test_renderer())
    }

    /// High-frequency pattern so blurred regions are detectable.
    fn checkerboard() -> RgbImage {
        RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    fn detection(track_id: u64, confidence: f32, bbox: BoundingBox) -> Detection {
        Detection {
            track_id,
            class_label: "credit_card".to_string(),
            confidence,
            bbox,
        }
    }

    fn frame(index: u64, detections: Vec<Detection>) -> FrameRecord {
        FrameRecord::new(index, checkerboard(), detections)
    }

    /// Whether the interior of `bbox` differs from the pristine pattern.
    fn region_blurred(frame: &FrameRecord, bbox: BoundingBox) -> bool {
        let pristine = checkerboard();
        let rect = bbox.clamp_to(WIDTH, HEIGHT).unwrap();
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                if frame.pixels.get_pixel(x, y) != pristine.get_pixel(x, y) {
                    return true;
                }
            }
        }
        false
    }

    const BOX_A: BoundingBox = BoundingBox {
        x1: 4.0,
        y1: 4.0,
        x2: 20.0,
        y2: 20.0,
    };
    const BOX_B: BoundingBox = BoundingBox {
        x1: 28.0,
        y1: 4.0,
        x2: 44.0,
        y2: 20.0,
    };
    const BOX_C: BoundingBox = BoundingBox {
        x1: 4.0,
        y1: 28.0,
        x2: 20.0,
        y2: 44.0,
    };

    #[test]
    fn test_late_activation_redacts_buffered_frames() {
        // Low-confidence sightings on frames 0-4, the threshold is met on
        // frame 5. All six frames are still buffered, so all six come out
        // blurred.
        let mut engine = engine(RedactionPolicy::confidence(0.9), 10);
        let mut sink = VecSink::new();

        for i in 0..5 {
            let f = frame(i, vec![detection(1, 0.5, BOX_A)]);
            engine.process_frame(f, &mut sink).unwrap();
        }
        let f = frame(5, vec![detection(1, 0.95, BOX_A)]);
        engine.process_frame(f, &mut sink).unwrap();

        assert!(sink.frames.is_empty());
        let stats = engine.finish(&mut sink).unwrap();

        assert_eq!(stats.frames_emitted, 6);
        assert_eq!(stats.tracks_activated, 1);
        for f in &sink.frames {
            assert!(
                region_blurred(f, BOX_A),
                "frame {} leaked an unredacted region",
                f.frame_index
            );
        }
    }

    #[test]
    fn test_frames_beyond_window_are_not_redacted() {
        // With a 10-frame buffer and activation on frame 12, frames 0-2
        // have already been emitted and stay clear; frames 3-12 are still
        // buffered and get the retroactive blur.
        let mut engine = engine(RedactionPolicy::confidence(0.9), 10);
        let mut sink = VecSink::new();

        for i in 0..12 {
            let f = frame(i, vec![detection(1, 0.5, BOX_A)]);
            engine.process_frame(f, &mut sink).unwrap();
        }
        let f = frame(12, vec![detection(1, 0.95, BOX_A)]);
        engine.process_frame(f, &mut sink).unwrap();

        let stats = engine.finish(&mut sink).unwrap();
        assert_eq!(stats.frames_emitted, 13);

        for f in &sink.frames {
            let blurred = region_blurred(f, BOX_A);
            if f.frame_index < 3 {
                assert!(!blurred, "frame {} outside the window was blurred", f.frame_index);
            } else {
                assert!(blurred, "frame {} inside the window leaked", f.frame_index);
            }
        }
    }

    #[test]
    fn test_persistence_covers_exactly_buffer_frames() {
        // One qualifying detection on frame 0, then nothing. The stale
        // region stays blurred for exactly `buffer_frames` more frames.
        let buffer_frames = 4;
        let mut engine = engine(RedactionPolicy::confidence(0.9), buffer_frames);
        let mut sink = VecSink::new();

        engine
            .process_frame(frame(0, vec![detection(1, 0.95, BOX_A)]), &mut sink)
            .unwrap();
        for i in 1..=10 {
            engine.process_frame(frame(i, Vec::new()), &mut sink).unwrap();
        }
        engine.finish(&mut sink).unwrap();

        for f in &sink.frames {
            let blurred = region_blurred(f, BOX_A);
            if f.frame_index <= buffer_frames as u64 {
                assert!(blurred, "dropout frame {} lost its blur", f.frame_index);
            } else {
                assert!(!blurred, "frame {} blurred past persistence", f.frame_index);
            }
        }
    }

    #[test]
    fn test_persistence_restarts_on_requalification() {
        // Qualify on frame 0 and again on frame 2 mid-dropout; the
        // countdown restarts from frame 2.
        let mut engine = engine(RedactionPolicy::confidence(0.9), 3);
        let mut sink = VecSink::new();

        engine
            .process_frame(frame(0, vec![detection(1, 0.95, BOX_A)]), &mut sink)
            .unwrap();
        engine.process_frame(frame(1, Vec::new()), &mut sink).unwrap();
        engine
            .process_frame(frame(2, vec![detection(1, 0.95, BOX_A)]), &mut sink)
            .unwrap();
        for i in 3..=7 {
            engine.process_frame(frame(i, Vec::new()), &mut sink).unwrap();
        }
        engine.finish(&mut sink).unwrap();

        for f in &sink.frames {
            let blurred = region_blurred(f, BOX_A);
            if f.frame_index <= 5 {
                assert!(blurred, "frame {} lost its blur", f.frame_index);
            } else {
                assert!(!blurred, "frame {} blurred past persistence", f.frame_index);
            }
        }
    }

    #[test]
    fn test_activation_is_monotonic() {
        // After one qualifying detection, later low-confidence sightings
        // of the same track are still blurred.
        let mut engine = engine(RedactionPolicy::confidence(0.9), 10);
        let mut sink = VecSink::new();

        engine
            .process_frame(frame(0, vec![detection(1, 0.95, BOX_A)]), &mut sink)
            .unwrap();
        for i in 1..4 {
            engine
                .process_frame(frame(i, vec![detection(1, 0.1, BOX_B)]), &mut sink)
                .unwrap();
        }
        let stats = engine.finish(&mut sink).unwrap();

        assert_eq!(stats.tracks_activated, 1);
        assert!(region_blurred(&sink.frames[0], BOX_A));
        for f in &sink.frames[1..] {
            assert!(region_blurred(f, BOX_B), "frame {} leaked", f.frame_index);
        }
    }

    #[test]
    fn test_curated_policy_blurs_only_members() {
        let mut engine = engine(RedactionPolicy::curated([3, 7]), 10);
        let mut sink = VecSink::new();

        for i in 0..3 {
            let detections = vec![
                detection(3, 0.99, BOX_A),
                detection(5, 0.99, BOX_B),
                detection(7, 0.99, BOX_C),
            ];
            engine.process_frame(frame(i, detections), &mut sink).unwrap();
        }
        let stats = engine.finish(&mut sink).unwrap();

        assert_eq!(stats.tracks_activated, 2);
        for f in &sink.frames {
            assert!(region_blurred(f, BOX_A));
            assert!(region_blurred(f, BOX_C));
            assert!(
                !region_blurred(f, BOX_B),
                "non-curated track blurred on frame {}",
                f.frame_index
            );
        }
    }

    #[test]
    fn test_frames_emitted_in_order_with_full_buffer() {
        let mut engine = engine(RedactionPolicy::confidence(0.9), 3);
        let mut sink = VecSink::new();

        for i in 0..8 {
            engine.process_frame(frame(i, Vec::new()), &mut sink).unwrap();
        }
        // Buffer holds 3 frames; the first emission happened on the third
        // push.
        assert_eq!(sink.frames.len(), 6);

        let stats = engine.finish(&mut sink).unwrap();
        assert_eq!(stats.frames_processed, 8);
        assert_eq!(stats.frames_emitted, 8);

        let indices: Vec<u64> = sink.frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<u64>>());
    }

    #[test]
    fn test_run_over_source() {
        let mut source = VecSource {
            frames: (0..5)
                .map(|i| frame(i, vec![detection(1, 0.95, BOX_A)]))
                .collect(),
        };
        let mut sink = VecSink::new();

        let engine = engine(RedactionPolicy::confidence(0.9), 10);
        let stats = engine.run(&mut source, &mut sink).unwrap();

        assert_eq!(stats.frames_processed, 5);
        assert_eq!(stats.frames_emitted, 5);
        assert_eq!(sink.frames.len(), 5);
    }

    #[test]
    fn test_run_with_empty_source_is_no_input() {
        let mut source = VecSource {
            frames: VecDeque::new(),
        };
        let mut sink = VecSink::new();

        let engine = engine(RedactionPolicy::confidence(0.9), 10);
        let result = engine.run(&mut source, &mut sink);
        assert!(matches!(result, Err(Error::NoInput)));
    }

    #[test]
    fn test_drop_without_finish_discards_buffered_frames() {
        // Fail closed: a cancelled run never emits what it buffered.
        let mut sink = VecSink::new();
        {
            let mut engine = engine(RedactionPolicy::confidence(0.9), 10);
            for i in 0..5 {
                engine.process_frame(frame(i, Vec::new()), &mut sink).unwrap();
            }
        }
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_activation_counted_once_per_track() {
        let mut engine = engine(RedactionPolicy::confidence(0.9), 10);
        let mut sink = VecSink::new();

        for i in 0..4 {
            engine
                .process_frame(frame(i, vec![detection(1, 0.95, BOX_A)]), &mut sink)
                .unwrap();
        }
        let stats = engine.finish(&mut sink).unwrap();
        assert_eq!(stats.tracks_activated, 1);
        assert_eq!(stats.regions_blurred, 4);
    }

    #[test]
    fn test_empty_frames_pass_through_untouched() {
        let mut engine = engine(RedactionPolicy::confidence(0.9), 4);
        let mut sink = VecSink::new();

        for i in 0..3 {
            engine.process_frame(frame(i, Vec::new()), &mut sink).unwrap();
        }
        let stats = engine.finish(&mut sink).unwrap();

        assert_eq!(stats.regions_blurred, 0);
        let pristine = checkerboard();
        for f in &sink.frames {
            assert_eq!(f.pixels, pristine);
        }
    }
}
