//! Loading the source image from disk.

use std::path::{Path, PathBuf};

use penline_pipeline::PipelineError;
use tracing::{debug, instrument};

use crate::error::RunError;

/// Absolute form of `path`, for error messages. Falls back to the path
/// as given when the working directory is unavailable.
#[must_use]
pub fn resolve(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Read the whole source file.
///
/// # Errors
///
/// Returns [`RunError::SourceUnavailable`] with the resolved path when the
/// file cannot be read or is empty.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<u8>, RunError> {
    let bytes = std::fs::read(path).map_err(|e| RunError::SourceUnavailable {
        path: resolve(path),
        reason: e.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(RunError::SourceUnavailable {
            path: resolve(path),
            reason: "file is empty".to_string(),
        });
    }
    debug!(bytes = bytes.len(), "Read source image");
    Ok(bytes)
}

/// Map a pipeline failure to the run error for `path`.
///
/// Decoding problems mean the source is unusable; configuration
/// problems are reported as such.
#[must_use]
pub fn classify(path: &Path, err: PipelineError) -> RunError {
    match err {
        PipelineError::InvalidConfig(msg) => RunError::InvalidConfig(msg),
        PipelineError::EmptyInput | PipelineError::ImageDecode(_) => {
            RunError::SourceUnavailable {
                path: resolve(path),
                reason: err.to_string(),
            }
        }
    }
}
