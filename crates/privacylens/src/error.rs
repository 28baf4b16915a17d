//! Error types for privacylens.
//!
//! This module defines all error types used throughout the privacylens crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for privacylens operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Detection Source Errors ===
    /// The detection source yielded no frames at all.
    #[error("detection source yielded no frames")]
    NoInput,

    /// A line of the detection manifest could not be parsed.
    #[error("failed to parse detection manifest at line {line}: {source}")]
    DetectionParse {
        /// 1-based line number in the manifest.
        line: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Frame indices were not strictly increasing.
    #[error("frame index {got} is out of order (previous index was {prev})")]
    FrameOrder {
        /// The previously seen frame index.
        prev: u64,
        /// The offending frame index.
        got: u64,
    },

    /// Failed to read a frame image.
    #[error("failed to read frame image at {path}: {source}")]
    FrameRead {
        /// Path to the frame image file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    // === Output Errors ===
    /// Failed to write a frame image.
    #[error("failed to write frame image to {path}: {source}")]
    FrameWrite {
        /// Path the frame was being written to.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Renderer Errors ===
    /// Failed to load the overlay font.
    #[error("failed to load overlay font from {path}: {message}")]
    FontLoad {
        /// Path to the font file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for privacylens operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a font loading error.
    #[must_use]
    pub fn font_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FontLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the source had no frames.
    #[must_use]
    pub fn is_no_input(&self) -> bool {
        matches!(self, Self::NoInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NoInput;
        assert_eq!(err.to_string(), "detection source yielded no frames");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_no_input() {
        assert!(Error::NoInput.is_no_input());
        assert!(!Error::internal("test").is_no_input());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("buffer_frames must be greater than 0");
        assert!(err.to_string().contains("buffer_frames"));
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_frame_order_error_display() {
        let err = Error::FrameOrder { prev: 7, got: 7 };
        let msg = err.to_string();
        assert!(msg.contains("7 is out of order"));
        assert!(msg.contains("previous index was 7"));
    }

    #[test]
    fn test_font_load_error_display() {
        let err = Error::font_load("/fonts/mono.ttf", "invalid font data");
        let msg = err.to_string();
        assert!(msg.contains("/fonts/mono.ttf"));
        assert!(msg.contains("invalid font data"));
    }

    #[test]
    fn test_detection_parse_error_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::DetectionParse {
            line: 42,
            source: json_err,
        };
        assert!(err.to_string().contains("line 42"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
