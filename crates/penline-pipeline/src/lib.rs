//! penline-pipeline: pure photo-to-strokes pipeline (sans-IO).
//!
//! Converts raster images into pen strokes through:
//! decode -> grayscale -> edge detection -> contour extraction ->
//! simplification -> coordinate mapping -> stroke emission.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory byte
//! slices and bitmaps, and emits drawing commands into any
//! [`DrawingAgent`]. File access, pacing, and logging live in the
//! `penline` binary; serializing agents live in `penline-export`.

pub mod bitmap;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod mapping;
pub mod pipeline;
pub mod raster;
pub mod simplify;
pub mod stroke;
pub mod types;

pub use bitmap::Bitmap;
pub use contour::{ChainApproximation, ContourExtractor, ContourExtractorKind};
pub use edge::{CannyEdgeSource, EdgeSource};
pub use mapping::CoordinateMapper;
pub use pipeline::Pipeline;
pub use stroke::{
    COMPLETION_LABEL, CommandRecorder, Completion, DrawCommand, DrawingAgent, draw, emit_strokes,
    prepare_agent,
};
pub use types::{
    Dimensions, DrawPoint, DrawSpeed, GrayImage, PenSettings, PipelineConfig, PipelineError,
    Point, Polyline, StagedResult, Stroke,
};

/// Run the full pipeline with the default Canny edge source.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation,
/// [`PipelineError::EmptyInput`] if `image_bytes` is empty, and
/// [`PipelineError::ImageDecode`] if the bytes cannot be decoded.
/// An image without edges is not an error: it yields zero strokes.
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    process_staged_with(image_bytes, config, &CannyEdgeSource)
}

/// Run the full pipeline with a caller-supplied edge source.
///
/// # Errors
///
/// Same as [`process_staged`].
pub fn process_staged_with<S: EdgeSource + ?Sized>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    edge_source: &S,
) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(image_bytes.to_vec(), config.clone())
        .decode()?
        .detect_edges_with(edge_source)
        .extract_contours()
        .simplify()
        .map_coordinates()
        .into_result())
}

/// Turn an edge bitmap directly into drawing-space strokes.
///
/// Runs extraction, simplification, and mapping with the settings in
/// `config`; edge thresholds and `invert` are ignored. The config is
/// not validated.
#[must_use]
pub fn vectorize(edges: &Bitmap, config: &PipelineConfig) -> Vec<Stroke> {
    let contours = config
        .contour_extractor
        .extract(edges, config.chain_approximation);
    let simplified = simplify::simplify_paths(&contours, config.simplification_factor);
    CoordinateMapper::new(edges.dimensions(), config.scale_factor).map_all(&simplified)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{ImageEncoder, Rgba, RgbaImage};

    use super::*;

    /// PNG with a black left half and a white right half.
    fn sharp_edge_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        buf
    }

    fn uniform_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]));
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        buf
    }

    fn row_five() -> Bitmap {
        Bitmap::from_fn(10, 10, |x, y| y == 5 && (1..=8).contains(&x))
    }

    #[test]
    fn process_empty_input() {
        let result = process_staged(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process_staged(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn process_rejects_invalid_config() {
        let config = PipelineConfig {
            simplification_factor: -1.0,
            ..PipelineConfig::default()
        };
        let result = process_staged(&sharp_edge_png(20, 20), &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn uniform_image_yields_no_strokes() {
        let staged = process_staged(&uniform_png(20, 20), &PipelineConfig::default()).unwrap();
        assert!(staged.edges.is_blank());
        assert!(staged.contours.is_empty());
        assert!(staged.strokes.is_empty());
    }

    #[test]
    fn sharp_edge_produces_strokes() {
        let staged = process_staged(&sharp_edge_png(40, 40), &PipelineConfig::default()).unwrap();
        assert_eq!(
            staged.dimensions,
            Dimensions {
                width: 40,
                height: 40
            }
        );
        assert!(!staged.strokes.is_empty());
        assert_eq!(staged.contours.len(), staged.simplified.len());
        assert_eq!(staged.simplified.len(), staged.strokes.len());
    }

    #[test]
    fn strokes_stay_within_image_bounds() {
        let staged = process_staged(&sharp_edge_png(40, 30), &PipelineConfig::default()).unwrap();
        for stroke in &staged.strokes {
            for p in stroke.points() {
                assert!((-20.0..=20.0).contains(&p.x), "x out of range: {p:?}");
                assert!((-15.0..=15.0).contains(&p.y), "y out of range: {p:?}");
            }
        }
    }

    #[test]
    fn vectorize_row_five() {
        let strokes = vectorize(&row_five(), &PipelineConfig::default());
        assert_eq!(strokes.len(), 1);
        assert_eq!(
            strokes[0].points(),
            &[DrawPoint::new(-4.0, 0.0), DrawPoint::new(3.0, 0.0)]
        );
    }

    #[test]
    fn row_five_end_to_end_commands() {
        let strokes = vectorize(&row_five(), &PipelineConfig::default());
        let mut recorder = CommandRecorder::new();
        emit_strokes(&strokes, &mut recorder, None);
        assert_eq!(
            recorder.commands(),
            &[
                DrawCommand::PenUp,
                DrawCommand::move_to(-4.0, 0.0),
                DrawCommand::PenDown,
                DrawCommand::move_to(3.0, 0.0),
                DrawCommand::PenUp,
            ]
        );
    }

    #[test]
    fn empty_bitmap_emits_only_completion() {
        let edges = Bitmap::empty(10, 10);
        let strokes = vectorize(&edges, &PipelineConfig::default());
        assert!(strokes.is_empty());

        let completion = Completion::for_dimensions(edges.dimensions());
        let mut recorder = CommandRecorder::new();
        emit_strokes(&strokes, &mut recorder, Some(&completion));
        assert_eq!(
            recorder.commands(),
            &[
                DrawCommand::PenUp,
                DrawCommand::SetPosition { x: 15.0, y: 15.0 },
                DrawCommand::Label {
                    text: COMPLETION_LABEL.to_string()
                },
            ]
        );
    }

    #[test]
    fn vectorize_is_deterministic() {
        let edges = Bitmap::from_fn(30, 30, |x, y| (x * 7 + y * 3) % 11 == 0 || x == y);
        let config = PipelineConfig::default();
        assert_eq!(vectorize(&edges, &config), vectorize(&edges, &config));
    }

    #[test]
    fn scale_factor_scales_strokes() {
        let config = PipelineConfig {
            scale_factor: 2.5,
            ..PipelineConfig::default()
        };
        let strokes = vectorize(&row_five(), &config);
        assert_eq!(
            strokes[0].points(),
            &[DrawPoint::new(-10.0, 0.0), DrawPoint::new(7.5, 0.0)]
        );
    }
}
