//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use penline_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(png, PipelineConfig::default())
//!     .decode()?
//!     .detect_edges()
//!     .extract_contours()
//!     .simplify()
//!     .map_coordinates()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state, carrying
//! every previously computed intermediate. Edge detection can be handed a
//! custom [`EdgeSource`] through [`Decoded::detect_edges_with`].

use crate::bitmap::Bitmap;
use crate::contour::ContourExtractor;
use crate::diagnostics::{StageMetrics, contour_stats, total_points};
use crate::edge::{CannyEdgeSource, EdgeSource, clamp_thresholds};
use crate::mapping::CoordinateMapper;
use crate::raster::decode_and_grayscale;
use crate::types::{
    Dimensions, GrayImage, PipelineConfig, PipelineError, Polyline, StagedResult, Stroke,
};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a pipeline over encoded image bytes.
    pub const fn new(source: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending { config, source }
    }

    /// Start from an already decoded grayscale raster.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn from_raster(
        grayscale: GrayImage,
        config: PipelineConfig,
    ) -> Result<Decoded, PipelineError> {
        config.validate()?;
        Ok(Decoded::new(config, grayscale, 0))
    }
}

/// Common surface of every pipeline state.
pub trait PipelineStage {
    /// Short stage name used in diagnostics output.
    const NAME: &str;

    /// Zero-based position of the stage.
    const INDEX: usize;

    /// Metrics describing the work done to reach this state, or `None`
    /// before any processing has happened.
    fn metrics(&self) -> Option<StageMetrics>;
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Validate the configuration, then decode the source to grayscale.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an invalid config,
    /// [`PipelineError::EmptyInput`] for empty bytes, and
    /// [`PipelineError::ImageDecode`] for undecodable data.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let grayscale = decode_and_grayscale(&self.source)?;
        Ok(Decoded::new(self.config, grayscale, self.source.len()))
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding.
#[must_use = "pipeline stages are consumed by advancing; call .detect_edges() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    grayscale: GrayImage,
    dimensions: Dimensions,
    source_len: usize,
}

impl Decoded {
    fn new(config: PipelineConfig, grayscale: GrayImage, source_len: usize) -> Self {
        let dimensions = Dimensions {
            width: grayscale.width(),
            height: grayscale.height(),
        };
        Self {
            config,
            grayscale,
            dimensions,
            source_len,
        }
    }

    /// The decoded grayscale raster.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// Source dimensions in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Run the default Canny detector.
    pub fn detect_edges(self) -> EdgesDetected {
        self.detect_edges_with(&CannyEdgeSource)
    }

    /// Run edge detection with the given source, then apply inversion if
    /// the config asks for it.
    pub fn detect_edges_with<S: EdgeSource + ?Sized>(self, source: &S) -> EdgesDetected {
        let raw = source.detect(
            &self.grayscale,
            self.config.edge_threshold_low,
            self.config.edge_threshold_high,
        );
        let detected_edge_pixels = raw.edge_count();
        let edges = if self.config.invert {
            raw.inverted()
        } else {
            raw
        };
        EdgesDetected {
            config: self.config,
            grayscale: self.grayscale,
            edges,
            dimensions: self.dimensions,
            detected_edge_pixels,
        }
    }
}

// ──────────────────────── Stage 2: EdgesDetected ─────────────────────

/// Pipeline state after edge detection.
#[must_use = "pipeline stages are consumed by advancing; call .extract_contours() to continue"]
pub struct EdgesDetected {
    config: PipelineConfig,
    grayscale: GrayImage,
    edges: Bitmap,
    dimensions: Dimensions,
    detected_edge_pixels: u64,
}

impl EdgesDetected {
    /// The binary edge map, after optional inversion.
    #[must_use]
    pub const fn edges(&self) -> &Bitmap {
        &self.edges
    }

    /// Group edge pixels and trace one contour per group.
    pub fn extract_contours(self) -> ContoursExtracted {
        let contours = self
            .config
            .contour_extractor
            .extract(&self.edges, self.config.chain_approximation);
        ContoursExtracted {
            config: self.config,
            grayscale: self.grayscale,
            edges: self.edges,
            contours,
            dimensions: self.dimensions,
        }
    }
}

// ─────────────────────── Stage 3: ContoursExtracted ──────────────────

/// Pipeline state after contour extraction.
#[must_use = "pipeline stages are consumed by advancing; call .simplify() to continue"]
pub struct ContoursExtracted {
    config: PipelineConfig,
    grayscale: GrayImage,
    edges: Bitmap,
    contours: Vec<Polyline>,
    dimensions: Dimensions,
}

impl ContoursExtracted {
    /// Traced contours in pixel space.
    #[must_use]
    pub fn contours(&self) -> &[Polyline] {
        &self.contours
    }

    /// Reduce every contour with a tolerance relative to its own length.
    pub fn simplify(self) -> Simplified {
        let simplified =
            crate::simplify::simplify_paths(&self.contours, self.config.simplification_factor);
        Simplified {
            config: self.config,
            grayscale: self.grayscale,
            edges: self.edges,
            contours: self.contours,
            simplified,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 4: Simplified ───────────────────────

/// Pipeline state after simplification.
#[must_use = "pipeline stages are consumed by advancing; call .map_coordinates() to continue"]
pub struct Simplified {
    config: PipelineConfig,
    grayscale: GrayImage,
    edges: Bitmap,
    contours: Vec<Polyline>,
    simplified: Vec<Polyline>,
    dimensions: Dimensions,
}

impl Simplified {
    /// Simplified contours, one per traced contour.
    #[must_use]
    pub fn simplified(&self) -> &[Polyline] {
        &self.simplified
    }

    /// Map simplified contours into centered, y-up drawing space.
    pub fn map_coordinates(self) -> Mapped {
        let mapper = CoordinateMapper::new(self.dimensions, self.config.scale_factor);
        let strokes = mapper.map_all(&self.simplified);
        Mapped {
            config: self.config,
            grayscale: self.grayscale,
            edges: self.edges,
            contours: self.contours,
            simplified: self.simplified,
            strokes,
            dimensions: self.dimensions,
        }
    }
}

// ─────────────────────────── Stage 5: Mapped ─────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Mapped {
    config: PipelineConfig,
    grayscale: GrayImage,
    edges: Bitmap,
    contours: Vec<Polyline>,
    simplified: Vec<Polyline>,
    strokes: Vec<Stroke>,
    dimensions: Dimensions,
}

impl Mapped {
    /// Strokes in drawing space.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Consume the pipeline and return every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            grayscale: self.grayscale,
            edges: self.edges,
            contours: self.contours,
            simplified: self.simplified,
            strokes: self.strokes,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── PipelineStage impls ───────────────────────

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: pixel_count(self.dimensions),
        })
    }
}

impl PipelineStage for EdgesDetected {
    const NAME: &str = "edges";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        let (low_threshold, high_threshold) =
            clamp_thresholds(self.config.edge_threshold_low, self.config.edge_threshold_high);
        Some(StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            inverted: self.config.invert,
            detected_edge_pixels: self.detected_edge_pixels,
            edge_pixel_count: self.edges.edge_count(),
            total_pixel_count: pixel_count(self.dimensions),
        })
    }
}

impl PipelineStage for ContoursExtracted {
    const NAME: &str = "contours";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        let stats = contour_stats(&self.contours);
        Some(StageMetrics::ContourExtraction {
            extractor: format!("{:?}", self.config.contour_extractor),
            contour_count: self.contours.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        })
    }
}

impl PipelineStage for Simplified {
    const NAME: &str = "simplify";
    const INDEX: usize = 4;

    fn metrics(&self) -> Option<StageMetrics> {
        let points_before = total_points(&self.contours);
        let points_after = total_points(&self.simplified);
        #[allow(clippy::cast_precision_loss)]
        let reduction_ratio = if points_before > 0 {
            1.0 - points_after as f64 / points_before as f64
        } else {
            0.0
        };
        Some(StageMetrics::Simplification {
            factor: self.config.simplification_factor,
            polyline_count: self.simplified.len(),
            points_before,
            points_after,
            reduction_ratio,
        })
    }
}

impl PipelineStage for Mapped {
    const NAME: &str = "map";
    const INDEX: usize = 5;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Mapping {
            scale: self.config.scale_factor,
            stroke_count: self.strokes.len(),
            point_count: self.strokes.iter().map(Stroke::len).sum(),
        })
    }
}

fn pixel_count(dimensions: Dimensions) -> u64 {
    u64::from(dimensions.width) * u64::from(dimensions.height)
}
