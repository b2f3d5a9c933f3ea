//! penline-export: drawing-agent back ends that serialize (sans-IO).
//!
//! Turns the pipeline's drawing commands into files: an SVG document, a
//! raster PNG preview, or a JSON-lines command log. Everything returns
//! in-memory strings or bytes; writing them is the caller's job.

pub mod commands;
pub mod preview;
pub mod svg;
pub mod trace;

pub use commands::{from_json_lines, to_json_line, to_json_lines};
pub use preview::{MAX_CANVAS_SIDE, render, render_png};
pub use svg::{SvgMetadata, strokes_to_svg, to_svg};
pub use trace::{DrawingFrame, PenTrace, TracedLabel, TracedPath};

/// Errors from the raster back end.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The frame cannot be allocated as a pixmap.
    #[error("cannot allocate a {width}x{height} preview canvas")]
    Canvas {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// PNG encoding failed.
    #[error("failed to encode preview: {0}")]
    Png(#[from] image::ImageError),
}
