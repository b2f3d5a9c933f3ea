//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! The library never reads a clock itself. Callers that want timings pass
//! a [`Clock`] to [`process_staged_with_diagnostics`]; the binary supplies
//! one backed by `std::time::Instant`, tests supply a fake.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::edge::{CannyEdgeSource, EdgeSource};
use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{PipelineConfig, PipelineError, Polyline, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Decoding and grayscale conversion.
    pub decode: StageDiagnostics,
    /// Edge detection, including optional inversion.
    pub edge_detection: StageDiagnostics,
    /// Contour extraction.
    pub contour_extraction: StageDiagnostics,
    /// Relative RDP simplification.
    pub simplification: StageDiagnostics,
    /// Pixel to drawing space mapping.
    pub mapping: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name.
    pub stage: String,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: Option<StageMetrics>,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Decoding metrics.
    Decode {
        /// Size of the encoded input. Zero when starting from a raster.
        input_bytes: usize,
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
        /// `width * height`.
        pixel_count: u64,
    },
    /// Edge detection metrics.
    EdgeDetection {
        /// Low threshold after clamping.
        low_threshold: u16,
        /// High threshold after clamping.
        high_threshold: u16,
        /// Whether the edge map was inverted.
        inverted: bool,
        /// Edge pixels reported by the detector.
        detected_edge_pixels: u64,
        /// Edge pixels handed to contour extraction.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Contour extraction metrics.
    ContourExtraction {
        /// Extraction algorithm.
        extractor: String,
        /// Number of contours found.
        contour_count: usize,
        /// Total points across all contours.
        total_point_count: usize,
        /// Fewest points in any contour.
        min_contour_points: usize,
        /// Most points in any contour.
        max_contour_points: usize,
        /// Mean points per contour.
        mean_contour_points: f64,
    },
    /// Simplification metrics.
    Simplification {
        /// Tolerance as a fraction of each contour's arc length.
        factor: f64,
        /// Number of polylines after simplification.
        polyline_count: usize,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Coordinate mapping metrics.
    Mapping {
        /// Drawing units per pixel.
        scale: f64,
        /// Number of strokes produced.
        stroke_count: usize,
        /// Total points across all strokes.
        point_count: usize,
    },
}

/// High-level summary counts for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of contours found.
    pub contour_count: usize,
    /// Number of strokes to draw.
    pub stroke_count: usize,
    /// Points across all strokes.
    pub final_point_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Edge Detection", &self.edge_detection),
            ("Contour Extraction", &self.contour_extraction),
            ("Simplification", &self.simplification),
            ("Mapping", &self.mapping),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = diag.metrics.as_ref().map_or_else(String::new, format_metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contours: {}  |  Strokes: {}  |  Points: {}",
            self.summary.contour_count, self.summary.stroke_count, self.summary.final_point_count,
        ));

        lines.join("\n")
    }
}

/// Run the pipeline with the default edge source, timing every stage.
///
/// # Errors
///
/// Same as [`crate::process_staged`].
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    process_staged_with_diagnostics_using(image_bytes, config, &CannyEdgeSource, clock)
}

/// Run the pipeline with a caller-supplied edge source, timing every
/// stage.
///
/// # Errors
///
/// Same as [`crate::process_staged`].
pub fn process_staged_with_diagnostics_using<S, C>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    edge_source: &S,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError>
where
    S: EdgeSource + ?Sized,
    C: Clock,
{
    let run_start = clock.now();

    let t = clock.now();
    let decoded = Pipeline::new(image_bytes.to_vec(), config.clone()).decode()?;
    let decode = record(&decoded, clock.elapsed(&t));

    let t = clock.now();
    let edges = decoded.detect_edges_with(edge_source);
    let edge_detection = record(&edges, clock.elapsed(&t));

    let t = clock.now();
    let contours = edges.extract_contours();
    let contour_extraction = record(&contours, clock.elapsed(&t));

    let t = clock.now();
    let simplified = contours.simplify();
    let simplification = record(&simplified, clock.elapsed(&t));

    let t = clock.now();
    let mapped = simplified.map_coordinates();
    let mapping = record(&mapped, clock.elapsed(&t));

    let result = mapped.into_result();
    let total_duration = clock.elapsed(&run_start);

    let summary = PipelineSummary {
        image_width: result.dimensions.width,
        image_height: result.dimensions.height,
        pixel_count: u64::from(result.dimensions.width) * u64::from(result.dimensions.height),
        contour_count: result.contours.len(),
        stroke_count: result.strokes.len(),
        final_point_count: result.stroke_point_count(),
    };

    Ok((
        result,
        PipelineDiagnostics {
            decode,
            edge_detection,
            contour_extraction,
            simplification,
            mapping,
            total_duration,
            summary,
        },
    ))
}

fn record<S: PipelineStage>(stage: &S, duration: Duration) -> StageDiagnostics {
    StageDiagnostics {
        stage: S::NAME.to_owned(),
        duration,
        metrics: stage.metrics(),
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            inverted,
            edge_pixel_count,
            total_pixel_count,
            ..
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            let invert = if *inverted { " inverted" } else { "" };
            format!(
                "low={low_threshold} high={high_threshold}{invert} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::ContourExtraction {
            extractor,
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => format!(
            "{extractor} {contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
        ),
        StageMetrics::Simplification {
            factor,
            points_before,
            points_after,
            reduction_ratio,
            ..
        } => format!(
            "factor={factor} {points_before}->{points_after} pts ({:.1}% reduction)",
            reduction_ratio * 100.0,
        ),
        StageMetrics::Mapping {
            scale,
            stroke_count,
            point_count,
        } => format!("scale={scale} {stroke_count} strokes, {point_count} pts"),
    }
}

/// Statistics for a set of contour polylines.
pub(crate) struct ContourStats {
    /// Total number of points across all contours.
    pub total: usize,
    /// Minimum number of points in any single contour.
    pub min: usize,
    /// Maximum number of points in any single contour.
    pub max: usize,
    /// Mean number of points per contour.
    pub mean: f64,
}

/// Compute contour statistics from a set of polylines.
pub(crate) fn contour_stats(contours: &[Polyline]) -> ContourStats {
    let total = total_points(contours);
    let min = contours.iter().map(Polyline::len).min().unwrap_or(0);
    let max = contours.iter().map(Polyline::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}

/// Total points across a slice of polylines.
pub(crate) fn total_points(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::len).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::bitmap::Bitmap;
    use crate::types::{GrayImage, Point};

    /// Clock that advances one millisecond every time it is read.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    struct Square;

    impl EdgeSource for Square {
        fn detect(&self, raster: &GrayImage, _low: u16, _high: u16) -> Bitmap {
            Bitmap::from_fn(raster.width(), raster.height(), |x, y| {
                (2..=7).contains(&x) && (2..=7).contains(&y)
            })
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::new(width, height);
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn contour_stats_empty() {
        let stats = contour_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert!(stats.mean.abs() < f64::EPSILON);
    }

    #[test]
    fn contour_stats_computes() {
        let contours = vec![
            Polyline::new(vec![Point::new(0.0, 0.0)]),
            Polyline::new(vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
            ]),
        ];
        let stats = contour_stats(&contours);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 3);
        assert!((stats.mean - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let clock = TickClock(Cell::new(0));
        let (result, diag) = process_staged_with_diagnostics_using(
            &png(10, 10),
            &PipelineConfig::default(),
            &Square,
            &clock,
        )
        .unwrap();

        assert_eq!(diag.decode.stage, "decode");
        assert_eq!(diag.mapping.stage, "map");
        for stage in [
            &diag.decode,
            &diag.edge_detection,
            &diag.contour_extraction,
            &diag.simplification,
            &diag.mapping,
        ] {
            assert!(stage.metrics.is_some(), "{} has no metrics", stage.stage);
            assert_eq!(stage.duration, Duration::from_millis(1));
        }
        assert!(diag.total_duration > diag.decode.duration);
        assert_eq!(diag.summary.contour_count, 1);
        assert_eq!(diag.summary.stroke_count, result.strokes.len());
        assert_eq!(diag.summary.final_point_count, result.stroke_point_count());
    }

    #[test]
    fn report_names_each_stage() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) = process_staged_with_diagnostics_using(
            &png(10, 10),
            &PipelineConfig::default(),
            &Square,
            &clock,
        )
        .unwrap();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        for name in [
            "Decode",
            "Edge Detection",
            "Contour Extraction",
            "Simplification",
            "Mapping",
        ] {
            assert!(report.contains(name), "missing {name} in report");
        }
        assert!(report.contains("MooreNeighbor"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) = process_staged_with_diagnostics_using(
            &png(10, 10),
            &PipelineConfig::default(),
            &Square,
            &clock,
        )
        .unwrap();
        let json: serde_json::Value = serde_json::to_value(&diag).unwrap();
        assert!((json["decode"]["duration"].as_f64().unwrap() - 0.001).abs() < 1e-9);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.decode.duration, Duration::from_millis(1));
    }

    #[test]
    fn decode_failure_propagates() {
        let clock = TickClock(Cell::new(0));
        let result = process_staged_with_diagnostics(&[], &PipelineConfig::default(), &clock);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
