//! SVG export serializer.
//!
//! Renders a finished [`PenTrace`] as an SVG document using the [`svg`]
//! crate for document construction, XML escaping, and path data
//! formatting.
//!
//! Drawing space is y-up and SVG is y-down, so every y coordinate is
//! negated on the way out. The `viewBox` covers the source image's
//! [`DrawingFrame`], which keeps the image center at the origin.
//!
//! Each traced path becomes one `<path>` element of `M` and `L` commands
//! with the pen's width and color. Labels become `<text>` elements.
//!
//! This is a pure function with no I/O; it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use penline_pipeline::{Completion, DrawPoint, PenSettings, Stroke, draw};

use crate::trace::{DrawingFrame, PenTrace, TracedLabel};

/// Font size of label text, in drawing units.
const LABEL_FONT_SIZE: f64 = 12.0;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped by the `svg`
/// crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`. Typically the source file
    /// stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized run configuration, emitted as the text of a
    /// `<metadata>` element so exported files are reproducible.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute from drawing-space points.
///
/// Uses `M` for the first point and `L` for the rest, negating y.
/// Returns an empty string for fewer than 2 points.
///
/// # Examples
///
/// ```
/// use penline_pipeline::DrawPoint;
/// use penline_export::svg::build_path_data;
///
/// let d = build_path_data(&[DrawPoint::new(-4.0, 0.0), DrawPoint::new(3.0, 2.0)]);
/// assert_eq!(d, "M-4,0 L3,-2");
/// ```
#[must_use]
pub fn build_path_data(points: &[DrawPoint]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(to_svg_space(*first));
    for &p in rest {
        data = data.line_to(to_svg_space(p));
    }
    String::from(Value::from(data))
}

/// Drawing space to SVG user space.
fn to_svg_space(p: DrawPoint) -> (f64, f64) {
    // Subtracting from zero keeps a zero y from printing as "-0".
    (p.x, 0.0 - p.y)
}

/// Serialize a pen trace into an SVG document.
#[must_use]
pub fn to_svg(trace: PenTrace, frame: DrawingFrame, metadata: &SvgMetadata<'_>) -> String {
    let (paths, labels) = trace.into_parts();

    let mut doc = Document::new()
        .set("width", frame.width)
        .set("height", frame.height)
        .set(
            "viewBox",
            format!(
                "{} {} {} {}",
                frame.left,
                0.0 - frame.top,
                frame.width,
                frame.height
            ),
        );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(Text::new(config_json));
        doc = doc.add(metadata_el);
    }

    for traced in &paths {
        let d = build_path_data(&traced.points);
        if d.is_empty() {
            continue;
        }
        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", traced.color.as_str())
            .set("stroke-width", traced.width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round");
        doc = doc.add(path);
    }

    for label in &labels {
        doc = doc.add(label_element(label));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Run a full drawing session into a [`PenTrace`] and serialize it.
#[must_use]
pub fn strokes_to_svg(
    strokes: &[Stroke],
    frame: DrawingFrame,
    pen: &PenSettings,
    completion: Option<&Completion>,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut trace = PenTrace::new();
    draw(strokes, &mut trace, pen, completion);
    to_svg(trace, frame, metadata)
}

fn label_element(label: &TracedLabel) -> Element {
    let (x, y) = to_svg_space(label.position);
    let mut text = Element::new("text");
    text.assign("x", x);
    text.assign("y", y);
    text.assign("font-family", "sans-serif");
    text.assign("font-size", LABEL_FONT_SIZE);
    text.append(Text::new(label.text.as_str()));
    text
}
