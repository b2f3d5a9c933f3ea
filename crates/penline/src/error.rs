//! Error types for a `penline` run.

use std::path::PathBuf;

/// Fatal errors. Any of these ends the run with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The source image is missing, unreadable, or cannot be decoded.
    /// Raised before any drawing command is issued.
    #[error("cannot load source image {}: {reason}", path.display())]
    SourceUnavailable {
        /// Absolute path that was tried.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Flags or `--config-json` describe an unusable configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    OutputWriteFailed {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// The debug edge map could not be saved. Logged, never fatal.
#[derive(Debug, thiserror::Error)]
#[error("failed to save edge map to {}: {source}", path.display())]
pub struct DebugWriteFailed {
    /// Target path.
    pub path: PathBuf,
    /// Underlying image error.
    pub source: image::ImageError,
}
