//! penline: turn a photograph into pen strokes.
//!
//! Loads a raster image, runs the edge → contour → simplify → map
//! pipeline, and replays the resulting strokes through one or more
//! drawing back ends: an SVG file, a PNG preview, or a JSON-lines
//! command stream.
//!
//! # Usage
//!
//! ```text
//! penline [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! With no `--svg`, `--png`, or `--commands`, commands go to stdout as
//! JSON lines. Progress is logged to stderr; set `RUST_LOG` to change
//! the level.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod agent;
mod debug;
mod error;
mod source;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use penline_export::{DrawingFrame, PenTrace, SvgMetadata};
use penline_pipeline::diagnostics::{Clock, process_staged_with_diagnostics};
use penline_pipeline::{
    ChainApproximation, Completion, ContourExtractorKind, DrawSpeed, PenSettings, PipelineConfig,
    PipelineError, StagedResult, draw, process_staged,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::{Fanout, JsonLinesAgent, PacedAgent};
use crate::error::RunError;

/// Path that selects stdout for `--commands`.
const STDOUT_PATH: &str = "-";

/// Turn a photograph into pen strokes.
///
/// Detects edges, traces them into contours, simplifies each contour, and
/// draws the result with a single pen centered on the image.
#[derive(Parser)]
#[command(name = "penline", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Simplification tolerance as a fraction of each contour's length.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIMPLIFICATION_FACTOR)]
    simplification_factor: f64,

    /// Drawing units per pixel.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Replay speed: `instant` (or `-1`) or an animated level 1 (slow) to
    /// 10 (fast).
    #[arg(long, default_value_t = DrawSpeed::Instant, allow_negative_numbers = true)]
    speed: DrawSpeed,

    /// Edge detector low threshold.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_EDGE_THRESHOLD_LOW)]
    edge_low: u16,

    /// Edge detector high threshold.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_EDGE_THRESHOLD_HIGH)]
    edge_high: u16,

    /// Pen width in drawing units.
    #[arg(long, default_value_t = PenSettings::DEFAULT_WIDTH)]
    pen_width: f64,

    /// Pen color name.
    #[arg(long, default_value = PenSettings::DEFAULT_COLOR)]
    pen_color: String,

    /// Contour tracing algorithm.
    #[arg(long, value_enum, default_value_t = Tracer::Moore)]
    tracer: Tracer,

    /// How traced pixel chains are stored before simplification.
    #[arg(long, value_enum, default_value_t = Chain::Simple)]
    chain: Chain,

    /// Invert the edge map before contour tracing.
    #[arg(long)]
    invert: bool,

    /// Where to save the intermediate edge map.
    #[arg(long, default_value = debug::DEFAULT_EDGE_IMAGE)]
    edge_image: PathBuf,

    /// Do not save the intermediate edge map.
    #[arg(long)]
    no_edge_image: bool,

    /// Write the drawing as SVG.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a raster preview of the drawing as PNG.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Write drawing commands as JSON lines (`-` for stdout).
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Leave out the completion marker after the last stroke.
    #[arg(long)]
    no_completion: bool,

    /// Full run config as a JSON string.
    ///
    /// When provided, all pipeline and pen flags are ignored. The JSON
    /// has the shape `{"pipeline": {...}, "pen": {...}}`; missing fields
    /// take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage timings and counts to stderr.
    #[arg(long)]
    diagnostics: bool,
}

/// Contour tracing algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Tracer {
    /// Moore-neighbor boundary trace, one contour per connected group.
    Moore,
    /// Suzuki-Abe border following, outer and hole borders.
    BorderFollowing,
}

/// Chain storage selection.
#[derive(Clone, Copy, ValueEnum)]
enum Chain {
    /// Keep only the points where the trace changes direction.
    Simple,
    /// Keep every traced pixel.
    #[value(name = "none")]
    Full,
}

/// Everything a run needs besides file paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    pipeline: PipelineConfig,
    pen: PenSettings,
}

impl RunConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        self.pipeline.validate()?;
        self.pen.validate()
    }
}

/// Build a [`RunConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual pipeline and pen flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<RunConfig, RunError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json)
            .map_err(|e| RunError::InvalidConfig(format!("cannot parse --config-json: {e}")));
    }

    Ok(RunConfig {
        pipeline: PipelineConfig {
            edge_threshold_low: cli.edge_low,
            edge_threshold_high: cli.edge_high,
            invert: cli.invert,
            contour_extractor: match cli.tracer {
                Tracer::Moore => ContourExtractorKind::MooreNeighbor,
                Tracer::BorderFollowing => ContourExtractorKind::BorderFollowing,
            },
            chain_approximation: match cli.chain {
                Chain::Simple => ChainApproximation::Simple,
                Chain::Full => ChainApproximation::None,
            },
            simplification_factor: cli.simplification_factor,
            scale_factor: cli.scale_factor,
        },
        pen: PenSettings {
            width: cli.pen_width,
            color: cli.pen_color.clone(),
            speed: cli.speed,
        },
    })
}

/// Where JSON-lines commands go, if anywhere.
fn command_target(cli: &Cli) -> Option<PathBuf> {
    match &cli.commands {
        Some(path) => Some(path.clone()),
        None if cli.svg.is_none() && cli.png.is_none() => Some(PathBuf::from(STDOUT_PATH)),
        None => None,
    }
}

fn open_command_sink(path: &Path) -> Result<Box<dyn Write>, RunError> {
    if path.as_os_str() == STDOUT_PATH {
        return Ok(Box::new(std::io::stdout().lock()));
    }
    let file = std::fs::File::create(path).map_err(|source| RunError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(std::io::BufWriter::new(file)))
}

fn write_output(path: &Path, contents: &[u8]) -> Result<(), RunError> {
    std::fs::write(path, contents).map_err(|source| RunError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "Wrote output");
    Ok(())
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = config_from_cli(cli)?;
    config
        .validate()
        .map_err(|e| source::classify(&cli.image_path, e))?;
    debug!(?config, "Resolved configuration");

    info!(
        path = %source::resolve(&cli.image_path).display(),
        "Attempting to load source image"
    );
    let bytes = source::load(&cli.image_path)?;

    let (staged, diagnostics) = if cli.diagnostics {
        let (staged, diagnostics) =
            process_staged_with_diagnostics(&bytes, &config.pipeline, &StdClock)
                .map_err(|e| source::classify(&cli.image_path, e))?;
        (staged, Some(diagnostics))
    } else {
        let staged = process_staged(&bytes, &config.pipeline)
            .map_err(|e| source::classify(&cli.image_path, e))?;
        (staged, None)
    };
    debug!(
        width = staged.dimensions.width,
        height = staged.dimensions.height,
        edge_pixels = staged.edges.edge_count(),
        contours = staged.contours.len(),
        "Pipeline finished"
    );

    if !cli.no_edge_image {
        match debug::save_edge_map(&staged.edges, &cli.edge_image) {
            Ok(()) => debug!(path = %cli.edge_image.display(), "Saved edge map"),
            Err(e) => warn!(error = %e, "Could not save edge map"),
        }
    }

    info!(
        lines = staged.strokes.len(),
        points = staged.stroke_point_count(),
        "Found {} distinct lines",
        staged.strokes.len()
    );

    render_outputs(cli, &config, &staged)?;
    info!("Drawing finished");

    if let Some(diagnostics) = diagnostics {
        eprintln!("{}", diagnostics.report());
    }
    Ok(())
}

/// Draw the strokes through every requested back end and write the files.
fn render_outputs(cli: &Cli, config: &RunConfig, staged: &StagedResult) -> Result<(), RunError> {
    let completion = (!cli.no_completion).then(|| Completion::for_dimensions(staged.dimensions));
    let mut trace = PenTrace::new();
    let command_path = command_target(cli);
    let mut commands = match &command_path {
        Some(path) => Some(JsonLinesAgent::new(open_command_sink(path)?)),
        None => None,
    };

    {
        let mut fanout = Fanout::new();
        if cli.svg.is_some() || cli.png.is_some() {
            fanout.push(&mut trace);
        }
        if let Some(agent) = commands.as_mut() {
            fanout.push(agent);
        }
        debug!(back_ends = fanout.len(), "Drawing");
        let mut paced = PacedAgent::new(fanout);
        draw(&staged.strokes, &mut paced, &config.pen, completion.as_ref());
    }

    if let (Some(agent), Some(path)) = (commands, command_path) {
        let written = agent.written();
        agent
            .finish()
            .map_err(|source| RunError::OutputWriteFailed {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), commands = written, "Streamed commands");
    }

    let frame = DrawingFrame::for_image(staged.dimensions, config.pipeline.scale_factor);

    if let Some(ref png_path) = cli.png {
        let png = penline_export::render_png(trace.paths(), frame).map_err(|e| {
            RunError::OutputWriteFailed {
                path: png_path.clone(),
                source: std::io::Error::other(e),
            }
        })?;
        write_output(png_path, &png)?;
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("penline");
        let config_json = serde_json::to_string(config).ok();
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some("Line drawing generated by penline"),
            config_json: config_json.as_deref(),
        };
        let svg = penline_export::to_svg(trace, frame, &metadata);
        write_output(svg_path, svg.as_bytes())?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("penline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = config_from_cli(&parse(&["photo.png"])).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn flags_fill_the_config() {
        let cli = parse(&[
            "photo.png",
            "--simplification-factor",
            "0.02",
            "--scale-factor",
            "2",
            "--speed",
            "7",
            "--edge-low",
            "50",
            "--edge-high",
            "150",
            "--pen-width",
            "3",
            "--pen-color",
            "red",
            "--tracer",
            "border-following",
            "--chain",
            "none",
            "--invert",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.pipeline.edge_threshold_low, 50);
        assert_eq!(config.pipeline.edge_threshold_high, 150);
        assert!(config.pipeline.invert);
        assert_eq!(
            config.pipeline.contour_extractor,
            ContourExtractorKind::BorderFollowing
        );
        assert_eq!(config.pipeline.chain_approximation, ChainApproximation::None);
        assert!((config.pipeline.simplification_factor - 0.02).abs() < f64::EPSILON);
        assert!((config.pipeline.scale_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.pen.speed, DrawSpeed::Animated(7));
        assert_eq!(config.pen.color, "red");
        assert!((config.pen.width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_speed_is_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["penline", "photo.png", "--speed", "11"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_one_speed_means_instant() {
        let cli = parse(&["photo.png", "--speed", "-1"]);
        assert_eq!(cli.speed, DrawSpeed::Instant);
        let cli = parse(&["--speed=-1", "photo.png"]);
        assert_eq!(cli.speed, DrawSpeed::Instant);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "photo.png",
            "--scale-factor",
            "9",
            "--config-json",
            r#"{"pipeline": {"scale_factor": 0.5}, "pen": {"color": "blue"}}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.pipeline.scale_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.pen.color, "blue");
        assert!((config.pen.width - PenSettings::DEFAULT_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_config_json_is_invalid_config() {
        let cli = parse(&["photo.png", "--config-json", "{not json"]);
        assert!(matches!(
            config_from_cli(&cli),
            Err(RunError::InvalidConfig(_))
        ));
    }

    #[test]
    fn run_config_validation_covers_pen() {
        let config = RunConfig {
            pen: PenSettings {
                width: 0.0,
                ..PenSettings::default()
            },
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn stdout_is_the_fallback_back_end() {
        assert_eq!(
            command_target(&parse(&["photo.png"])),
            Some(PathBuf::from(STDOUT_PATH))
        );
        assert_eq!(command_target(&parse(&["photo.png", "--svg", "out.svg"])), None);
        assert_eq!(
            command_target(&parse(&["photo.png", "--png", "out.png", "--commands", "log.jsonl"])),
            Some(PathBuf::from("log.jsonl"))
        );
    }
}
