//! Command-line interface for privacylens.
//!
//! This module provides the CLI structure and command handlers for the
//! `plens` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, RedactCommand, TracksCommand};

/// plens - Blur sensitive content out of video frames
///
/// Runs a temporal redaction pass over decoded video frames: regions an
/// upstream detector flagged as sensitive (credit cards, license plates)
/// are blurred, including retroactively across a lookback window when the
/// detector's judgment arrives a few frames late.
#[derive(Debug, Parser)]
#[command(name = "plens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the redaction pass over a frame directory
    Redact(RedactCommand),

    /// Summarize distinct tracks for human review
    Tracks(TracksCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
