//! The temporal redaction engine.
//!
//! This module implements the stateful buffering and activation logic that
//! decides, per frame and per tracked object, whether to blur a region,
//! and retroactively blurs already-buffered frames when a track activates
//! late:
//!
//! - **Activation policy**: curated track sets or confidence-triggered
//!   activation, both funneled through one retroactive-buffer algorithm.
//!
//! - **Redaction buffer**: a hard-capacity FIFO of recent frames that makes
//!   late activation safe within the lookback window.
//!
//! - **Persistence tracking**: per-track countdowns that keep a region
//!   blurred across short tracker dropouts.
//!
//! - **Renderer**: destructive Gaussian blur over clamped bounding boxes.
//!
//! # Example
//!
//! ```
//! use image::RgbImage;
//! use privacylens::config::{BlurConfig, OverlayConfig};
//! use privacylens::redact::{RedactionEngine, RedactionPolicy, Renderer};
//! use privacylens::{FrameRecord, FrameSink};
//!
//! struct Discard;
//! impl FrameSink for Discard {
//!     fn write(&mut self, _frame: FrameRecord) -> privacylens::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let renderer = Renderer::new(&BlurConfig::default(), &OverlayConfig::default()).unwrap();
//! let mut engine = RedactionEngine::new(RedactionPolicy::confidence(0.9), 10, renderer);
//!
//! let frame = FrameRecord::new(0, RgbImage::new(64, 64), Vec::new());
//! let mut sink = Discard;
//! engine.process_frame(frame, &mut sink).unwrap();
//! let stats = engine.finish(&mut sink).unwrap();
//! assert_eq!(stats.frames_emitted, 1);
//! ```

mod buffer;
mod engine;
mod policy;
mod renderer;

pub use buffer::RedactionBuffer;
pub use engine::{EngineStats, RedactionEngine};
pub use policy::{RedactionPolicy, TrackState};
pub use renderer::Renderer;
