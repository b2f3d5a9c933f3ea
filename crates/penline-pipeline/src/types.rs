//! Shared types for the penline vectorization pipeline.
//!
//! Two coordinate spaces are in play and each has its own point type:
//!
//! - [`Point`] lives in *pixel space* (origin top-left, x right, y down).
//!   Contours and simplified contours are [`Polyline`]s of these.
//! - [`DrawPoint`] lives in *drawing space* (origin at the image center,
//!   x right, y up). [`Stroke`]s are sequences of these.
//!
//! The only way to get from one to the other is
//! [`CoordinateMapper::map`](crate::mapping::CoordinateMapper::map).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contour::{ChainApproximation, ContourExtractorKind};

/// Re-export `GrayImage` so downstream crates can reference the decoded
/// raster without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A 2D point in drawing space (centered origin, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawPoint {
    /// Horizontal position, positive to the right of center.
    pub x: f64,
    /// Vertical position, positive above center.
    pub y: f64,
}

impl DrawPoint {
    /// Create a new drawing-space point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A sequence of connected pixel-space points.
///
/// Used both for traced contours and for their simplified forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Total length of the polyline, treated as open.
    ///
    /// The closing segment from the last point back to the first is not
    /// counted. Polylines with fewer than two points have length 0.
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// An ordered sequence of drawing-space points replayed with one pen-down.
///
/// The pen is up while travelling to the first point and down for every
/// move after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke(Vec<DrawPoint>);

impl Stroke {
    /// Create a stroke from drawing-space points.
    #[must_use]
    pub const fn new(points: Vec<DrawPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the stroke has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the stroke.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[DrawPoint] {
        &self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// How fast the drawing agent replays moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawSpeed {
    /// Moves complete immediately.
    #[default]
    Instant,
    /// Throttled replay. Level 1 is the slowest, 10 the fastest.
    Animated(u8),
}

impl DrawSpeed {
    /// Slowest animated level.
    pub const MIN_LEVEL: u8 = 1;
    /// Fastest animated level.
    pub const MAX_LEVEL: u8 = 10;

    /// Returns `true` if this speed is representable by a drawing agent.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self {
            Self::Instant => true,
            Self::Animated(level) => level >= Self::MIN_LEVEL && level <= Self::MAX_LEVEL,
        }
    }
}

impl fmt::Display for DrawSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => f.write_str("instant"),
            Self::Animated(level) => write!(f, "{level}"),
        }
    }
}

impl FromStr for DrawSpeed {
    type Err = String;

    /// Parses `"instant"` (or the legacy `"-1"`) and animated levels `"1"`..`"10"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("instant") || s == "-1" {
            return Ok(Self::Instant);
        }
        let level: u8 = s
            .parse()
            .map_err(|_| format!("speed must be 'instant' or 1-10, got '{s}'"))?;
        let speed = Self::Animated(level);
        if speed.is_valid() {
            Ok(speed)
        } else {
            Err(format!("animated speed level must be 1-10, got {level}"))
        }
    }
}

/// Configuration for the vectorization pipeline.
///
/// All parameters have defaults matching the classic photo-to-sketch
/// settings: Canny thresholds 100/200, tolerance at 0.5% of each
/// contour's length, and unit scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hysteresis low threshold. Pixels above it are edges only when
    /// connected to a strong edge.
    pub edge_threshold_low: u16,

    /// Hysteresis high threshold. Pixels above it are definite edges.
    pub edge_threshold_high: u16,

    /// Whether to invert the binary edge map before contour extraction.
    pub invert: bool,

    /// Which contour extraction algorithm to use.
    pub contour_extractor: ContourExtractorKind,

    /// How traced pixel chains are compressed.
    pub chain_approximation: ChainApproximation,

    /// Simplification tolerance as a fraction of each contour's open arc
    /// length. Higher values produce coarser strokes with fewer points.
    pub simplification_factor: f64,

    /// Uniform scale from pixels to drawing units.
    pub scale_factor: f64,
}

impl PipelineConfig {
    /// Default hysteresis low threshold.
    pub const DEFAULT_EDGE_THRESHOLD_LOW: u16 = 100;
    /// Default hysteresis high threshold.
    pub const DEFAULT_EDGE_THRESHOLD_HIGH: u16 = 200;
    /// Default simplification factor (0.5% of contour length).
    pub const DEFAULT_SIMPLIFICATION_FACTOR: f64 = 0.005;
    /// Default drawing-space scale.
    pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;

    /// Check the configuration for values the pipeline cannot honor.
    ///
    /// Edge thresholds are not checked here: the edge source clamps
    /// them into a usable range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when the simplification
    /// factor is negative or not finite, or the scale factor is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.simplification_factor.is_finite() || self.simplification_factor < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "simplification_factor must be a finite non-negative number, got {}",
                self.simplification_factor
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "scale_factor must be a finite positive number, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edge_threshold_low: Self::DEFAULT_EDGE_THRESHOLD_LOW,
            edge_threshold_high: Self::DEFAULT_EDGE_THRESHOLD_HIGH,
            invert: false,
            contour_extractor: ContourExtractorKind::default(),
            chain_approximation: ChainApproximation::default(),
            simplification_factor: Self::DEFAULT_SIMPLIFICATION_FACTOR,
            scale_factor: Self::DEFAULT_SCALE_FACTOR,
        }
    }
}

/// Pen state applied to the drawing agent before any stroke is emitted.
///
/// The pipeline supports a single pen: one color, one width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenSettings {
    /// Line width in drawing units.
    pub width: f64,
    /// Color name understood by the drawing agent.
    pub color: String,
    /// Replay speed.
    pub speed: DrawSpeed,
}

impl PenSettings {
    /// Default pen width.
    pub const DEFAULT_WIDTH: f64 = 2.0;
    /// Default pen color.
    pub const DEFAULT_COLOR: &'static str = "black";

    /// Check the pen settings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a non-positive or
    /// non-finite width, an empty color name, or an animated speed level
    /// outside 1-10.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "pen width must be a finite positive number, got {}",
                self.width
            )));
        }
        if self.color.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "pen color must not be empty".to_string(),
            ));
        }
        if !self.speed.is_valid() {
            return Err(PipelineError::InvalidConfig(format!(
                "animated speed level must be 1-10, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            color: Self::DEFAULT_COLOR.to_string(),
            speed: DrawSpeed::default(),
        }
    }
}

/// Result of running the pipeline with every intermediate stage preserved.
///
/// Does not derive `PartialEq` because `GrayImage` comparisons walk the
/// whole raster; compare individual fields instead.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Decoded grayscale raster.
    pub grayscale: GrayImage,
    /// Binary edge map (post-inversion when `invert = true`).
    pub edges: crate::Bitmap,
    /// Traced contours in pixel space.
    pub contours: Vec<Polyline>,
    /// Simplified contours in pixel space, one per contour.
    pub simplified: Vec<Polyline>,
    /// Strokes in drawing space, one per simplified contour.
    pub strokes: Vec<Stroke>,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Total number of points across all strokes.
    #[must_use]
    pub fn stroke_point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(7.0, 11.0);
        assert!((p.distance(p)).abs() < f64::EPSILON);
    }

    // --- Polyline tests ---

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert_eq!(pl.len(), 0);
        assert!(pl.first().is_none());
        assert!(pl.last().is_none());
    }

    #[test]
    fn polyline_first_and_last() {
        let pl = Polyline::new(vec![
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        ]);
        assert_eq!(pl.first(), Some(&Point::new(1.0, 2.0)));
        assert_eq!(pl.last(), Some(&Point::new(5.0, 6.0)));
    }

    #[test]
    fn arc_length_is_open() {
        // Unit square traced as three sides: the closing side is not counted.
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!((pl.arc_length() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn arc_length_of_short_polylines_is_zero() {
        assert!(Polyline::new(vec![]).arc_length().abs() < f64::EPSILON);
        assert!(
            Polyline::new(vec![Point::new(4.0, 4.0)])
                .arc_length()
                .abs()
                < f64::EPSILON
        );
    }

    // --- DrawSpeed tests ---

    #[test]
    fn draw_speed_parses_instant_and_levels() {
        assert_eq!("instant".parse::<DrawSpeed>().unwrap(), DrawSpeed::Instant);
        assert_eq!("-1".parse::<DrawSpeed>().unwrap(), DrawSpeed::Instant);
        assert_eq!("1".parse::<DrawSpeed>().unwrap(), DrawSpeed::Animated(1));
        assert_eq!("10".parse::<DrawSpeed>().unwrap(), DrawSpeed::Animated(10));
    }

    #[test]
    fn draw_speed_rejects_out_of_range() {
        assert!("0".parse::<DrawSpeed>().is_err());
        assert!("11".parse::<DrawSpeed>().is_err());
        assert!("fast".parse::<DrawSpeed>().is_err());
    }

    #[test]
    fn draw_speed_display_round_trips_through_from_str() {
        for speed in [DrawSpeed::Instant, DrawSpeed::Animated(7)] {
            assert_eq!(speed.to_string().parse::<DrawSpeed>().unwrap(), speed);
        }
    }

    // --- Config tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.edge_threshold_low, 100);
        assert_eq!(config.edge_threshold_high, 200);
        assert!(!config.invert);
        assert_eq!(config.contour_extractor, ContourExtractorKind::MooreNeighbor);
        assert_eq!(config.chain_approximation, ChainApproximation::Simple);
        assert!((config.simplification_factor - 0.005).abs() < f64::EPSILON);
        assert!((config.scale_factor - 1.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_simplification_factor_is_invalid() {
        let config = PipelineConfig {
            simplification_factor: -0.1,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_or_nan_scale_is_invalid() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig {
                scale_factor: scale,
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn pen_settings_defaults_and_validation() {
        let pen = PenSettings::default();
        assert!((pen.width - 2.0).abs() < f64::EPSILON);
        assert_eq!(pen.color, "black");
        assert_eq!(pen.speed, DrawSpeed::Instant);
        assert!(pen.validate().is_ok());

        let bad = PenSettings {
            speed: DrawSpeed::Animated(12),
            ..PenSettings::default()
        };
        assert!(bad.validate().is_err());

        let thin = PenSettings {
            width: 0.0,
            ..PenSettings::default()
        };
        assert!(thin.validate().is_err());
    }

    #[test]
    fn pipeline_config_deserializes_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"simplification_factor": 0.02}"#).unwrap();
        assert!((config.simplification_factor - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.edge_threshold_high, 200);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            PipelineError::InvalidConfig("bad".to_string()).to_string(),
            "invalid pipeline configuration: bad",
        );
    }
}
