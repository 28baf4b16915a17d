//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Redact command arguments.
#[derive(Debug, Args)]
pub struct RedactCommand {
    /// Directory containing the decoded frame images
    #[arg(short, long, value_name = "DIR")]
    pub frames: PathBuf,

    /// JSON-Lines detection manifest (one record per frame)
    #[arg(short, long, value_name = "FILE")]
    pub detections: PathBuf,

    /// Output directory for redacted frames
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Use confidence-triggered activation with this threshold
    /// (overrides the configured policy)
    #[arg(long, value_name = "T", conflicts_with = "track_id")]
    pub threshold: Option<f32>,

    /// Redact only this track ID; repeat for several
    /// (overrides the configured policy)
    #[arg(long = "track-id", value_name = "ID")]
    pub track_id: Vec<u64>,

    /// Draw diagnostic boxes and labels on redacted regions
    /// (never for privacy-sensitive output)
    #[arg(long)]
    pub overlay: bool,
}

/// Tracks command arguments.
#[derive(Debug, Args)]
pub struct TracksCommand {
    /// Directory containing the decoded frame images
    #[arg(short, long, value_name = "DIR")]
    pub frames: PathBuf,

    /// JSON-Lines detection manifest (one record per frame)
    #[arg(short, long, value_name = "FILE")]
    pub detections: PathBuf,

    /// Write a cropped thumbnail of each track's first sighting here
    #[arg(long, value_name = "DIR")]
    pub crops: Option<PathBuf>,

    /// Frame rate for timestamp estimation (overrides config)
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Output the manifest as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
