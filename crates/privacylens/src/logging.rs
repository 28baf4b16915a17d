//! Logging setup for the `plens` binary.
//!
//! Diagnostics go to stderr through `tracing`, so stdout stays clean for
//! the JSON manifests and tables the CLI prints. The default filter scopes
//! the chosen [`Verbosity`] to this crate and pins the image codec
//! dependencies at `warn`, keeping a `-vv` run about activations and
//! emissions rather than pixel I/O. Setting `RUST_LOG` replaces the whole
//! filter.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the redaction run reports on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Track activations and run summaries.
    #[default]
    Normal,
    /// Per-track decisions (persistence countdowns, new tracks).
    Verbose,
    /// Per-frame emission events.
    Trace,
}

impl Verbosity {
    /// The most detailed level this verbosity lets through.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Filter directives used when `RUST_LOG` is not set.
fn default_directives(verbosity: Verbosity) -> String {
    format!(
        "privacylens={},image=warn,imageproc=warn",
        verbosity.level()
    )
}

/// Install the global tracing subscriber.
///
/// Called once by `main` before any work starts; later calls are no-ops,
/// so the first call wins. `RUST_LOG` takes precedence over `verbosity`.
///
/// # Examples
///
/// ```no_run
/// use privacylens::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// tracing::debug!("now visible on stderr");
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}

/// Quiet, capture-friendly subscriber for tests that exercise code paths
/// which log.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("privacylens=error")
        .with_test_writer()
        .try_init();
}
