//! `privacylens` - Temporal redaction of sensitive content in video frames
//!
//! This library blurs the frame regions an upstream detector/tracker flags
//! as sensitive (credit cards, license plates) and guarantees that no frame
//! reaches the output unredacted once its content has been judged
//! sensitive, even when that judgment arrives several frames late. The
//! core is a bounded lookback buffer: frames sit in it just long enough
//! for late activations to blur them retroactively before emission.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod redact;
pub mod review;
pub mod source;

pub use config::{Config, OverlayConfig};
pub use error::{Error, Result};
pub use frame::{BoundingBox, Detection, DetectionSource, FrameRecord, FrameSink};
pub use logging::init_logging;
pub use redact::{EngineStats, RedactionEngine, RedactionPolicy, Renderer};
pub use review::{ReviewManifest, TrackReview, TrackSummary};
