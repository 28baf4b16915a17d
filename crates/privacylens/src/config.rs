//! Configuration management for privacylens.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::redact::RedactionPolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "privacylens";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables, prefixed with `PRIVACYLENS_` and nested
///    with a double underscore (`PRIVACYLENS_REDACTION__BUFFER_FRAMES`),
///    since the keys themselves contain single underscores
/// 2. TOML config file at `~/.config/privacylens/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Redaction engine configuration.
    pub redaction: RedactionConfig,
    /// Blur transform configuration.
    pub blur: BlurConfig,
    /// Diagnostic overlay configuration.
    pub overlay: OverlayConfig,
    /// Track review configuration.
    pub review: ReviewConfig,
}

/// Which activation policy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// A track activates the first time a detection meets the confidence
    /// threshold.
    #[default]
    Confidence,
    /// Only an externally curated, fixed set of track IDs is redacted.
    Curated,
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confidence => write!(f, "confidence"),
            Self::Curated => write!(f, "curated"),
        }
    }
}

/// Redaction-engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Activation policy mode.
    pub mode: PolicyMode,
    /// Confidence threshold in `[0, 1]` for `confidence` mode.
    pub confidence_threshold: f32,
    /// Track IDs to redact in `curated` mode.
    pub curated_ids: Vec<u64>,
    /// Lookback window: how many frames the buffer holds, and how many
    /// frames a track's last-known region stays blurred after detections
    /// stop. Must be greater than 0.
    pub buffer_frames: usize,
}

/// Blur-transform configuration.
///
/// The default kernel is deliberately large so blurred regions are not
/// recoverable by sharpening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Gaussian kernel size in pixels. Must be odd and greater than 1.
    pub kernel_size: u32,
    /// Gaussian sigma. Must be greater than 0.
    pub sigma: f32,
}

/// Diagnostic overlay configuration.
///
/// The overlay re-exposes classification metadata (class, confidence,
/// track ID) in the visible frame, so it must stay disabled for any
/// privacy-sensitive production output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Draw diagnostic boxes and labels on redacted regions.
    pub enabled: bool,
    /// Path to a TTF/OTF font for label text. Without a font, only the
    /// box outline is drawn.
    pub font_path: Option<PathBuf>,
}

/// Track-review configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Frame rate used to estimate first-seen timestamps when the source
    /// does not provide one.
    pub fps: f64,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Confidence,
            confidence_threshold: 0.9,
            curated_ids: Vec::new(),
            buffer_frames: 10,
        }
    }
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 51,
            sigma: 30.0,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { fps: 30.0 }
    }
}

impl RedactionConfig {
    /// Build the activation policy this configuration describes.
    #[must_use]
    pub fn policy(&self) -> RedactionPolicy {
        match self.mode {
            PolicyMode::Confidence => RedactionPolicy::confidence(self.confidence_threshold),
            PolicyMode::Curated => RedactionPolicy::curated(self.curated_ids.iter().copied()),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `PRIVACYLENS_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Section and key are separated by a double underscore because
        // the keys themselves contain single ones.
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("PRIVACYLENS_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.redaction.buffer_frames == 0 {
            return Err(Error::ConfigValidation {
                message: "buffer_frames must be greater than 0".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.redaction.confidence_threshold) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "confidence_threshold ({}) must be within [0, 1]",
                    self.redaction.confidence_threshold
                ),
            });
        }

        if self.blur.kernel_size < 3 || self.blur.kernel_size % 2 == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "blur kernel_size ({}) must be odd and at least 3",
                    self.blur.kernel_size
                ),
            });
        }

        if self.blur.sigma <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!("blur sigma ({}) must be greater than 0", self.blur.sigma),
            });
        }

        if self.review.fps <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!("review fps ({}) must be greater than 0", self.review.fps),
            });
        }

        Ok(())
    }
}
