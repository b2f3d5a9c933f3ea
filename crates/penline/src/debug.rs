//! Persisting the intermediate edge map for inspection.

use std::path::Path;

use penline_pipeline::Bitmap;

use crate::error::DebugWriteFailed;

/// Default file name for the edge map.
pub const DEFAULT_EDGE_IMAGE: &str = "debug_canny_edges.png";

/// Save the edge map as a black-and-white image (edges white).
///
/// The format follows the file extension.
///
/// # Errors
///
/// Returns [`DebugWriteFailed`] if encoding or writing fails. Callers log
/// it and carry on.
pub fn save_edge_map(edges: &Bitmap, path: &Path) -> Result<(), DebugWriteFailed> {
    edges.to_gray().save(path).map_err(|source| DebugWriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn edge_map_round_trips_through_png() {
        let edges = Bitmap::from_fn(6, 4, |x, y| x == y);
        let path = std::env::temp_dir().join(format!("penline-edges-{}.png", std::process::id()));
        save_edge_map(&edges, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_luma8();
        std::fs::remove_file(&path).ok();
        assert_eq!(Bitmap::from_gray(&loaded), edges);
    }

    #[test]
    fn unwritable_path_is_reported() {
        let edges = Bitmap::empty(2, 2);
        let path = std::env::temp_dir()
            .join("penline-no-such-dir")
            .join("nested")
            .join("edges.png");
        let err = save_edge_map(&edges, &path).unwrap_err();
        assert_eq!(err.path, path);
    }
}
