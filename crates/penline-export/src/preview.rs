//! Raster preview of a pen trace, rendered with `tiny-skia`.
//!
//! The canvas covers the [`DrawingFrame`] at one pixel per drawing unit
//! on a white background. Paths are stroked with round caps and joins.
//! Labels are not rendered.

use image::{ImageEncoder, Rgba, RgbaImage};
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::ExportError;
use crate::trace::{DrawingFrame, TracedPath};

/// Longest canvas side, in pixels, the preview will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Render traced paths into an RGBA image.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] if the frame is empty or either side
/// exceeds [`MAX_CANVAS_SIDE`].
pub fn render(paths: &[TracedPath], frame: DrawingFrame) -> Result<RgbaImage, ExportError> {
    let width = canvas_side(frame.width);
    let height = canvas_side(frame.height);
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(ExportError::Canvas { width, height });
    }
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Canvas { width, height })?;
    pixmap.fill(Color::WHITE);

    for traced in paths {
        let Some(path) = build_path(traced, frame) else {
            continue;
        };

        #[allow(clippy::cast_possible_truncation)]
        let stroke = Stroke {
            width: traced.width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        let [r, g, b] = named_color(&traced.color);
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;

        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    Ok(unpremultiply(&pixmap))
}

/// Render traced paths and encode the result as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] for an unusable frame and
/// [`ExportError::Png`] if encoding fails.
pub fn render_png(paths: &[TracedPath], frame: DrawingFrame) -> Result<Vec<u8>, ExportError> {
    let img = render(paths, frame)?;
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn canvas_side(extent: f64) -> u32 {
    if extent.is_finite() && extent >= 1.0 {
        extent.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Drawing space to canvas pixels: origin at the frame's top-left, y down.
#[allow(clippy::cast_possible_truncation)]
fn to_canvas(x: f64, y: f64, frame: DrawingFrame) -> (f32, f32) {
    ((x - frame.left) as f32, (frame.top - y) as f32)
}

fn build_path(traced: &TracedPath, frame: DrawingFrame) -> Option<tiny_skia::Path> {
    let (first, rest) = traced.points.split_first()?;
    let mut pb = PathBuilder::new();
    let (x, y) = to_canvas(first.x, first.y, frame);
    pb.move_to(x, y);
    for p in rest {
        let (x, y) = to_canvas(p.x, p.y, frame);
        pb.line_to(x, y);
    }
    pb.finish()
}

/// Convert a premultiplied pixmap into a straight-alpha `RgbaImage`.
fn unpremultiply(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            let channel = |c: u8| {
                let v = u16::from(c) * 255 / u16::from(a);
                u8::try_from(v).unwrap_or(u8::MAX)
            };
            *pixel = Rgba([
                channel(data[off]),
                channel(data[off + 1]),
                channel(data[off + 2]),
                a,
            ]);
        }
    }
    img
}

/// Resolve a pen color: `#rrggbb` or one of the basic CSS color names.
/// Anything else draws black.
fn named_color(name: &str) -> [u8; 3] {
    let name = name.trim();
    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex).unwrap_or([0, 0, 0]);
    }
    match name.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "navy" => [0, 0, 128],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "orange" => [255, 165, 0],
        "brown" => [165, 42, 42],
        _ => [0, 0, 0],
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([byte(0)?, byte(2)?, byte(4)?])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use penline_pipeline::{Dimensions, DrawPoint};

    use super::*;

    fn frame(width: u32, height: u32) -> DrawingFrame {
        DrawingFrame::for_image(Dimensions { width, height }, 1.0)
    }

    fn path(points: &[(f64, f64)], width: f64, color: &str) -> TracedPath {
        TracedPath {
            points: points.iter().map(|&(x, y)| DrawPoint::new(x, y)).collect(),
            width,
            color: color.to_string(),
        }
    }

    #[test]
    fn empty_trace_is_white() {
        let img = render(&[], frame(8, 6)).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert!(img.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn horizontal_stroke_darkens_its_row() {
        // Drawing y = 0 is canvas row 10 for a 20x20 frame.
        let img = render(&[path(&[(-6.0, 0.0), (6.0, 0.0)], 3.0, "black")], frame(20, 20)).unwrap();
        let on_line = img.get_pixel(10, 10);
        let far_away = img.get_pixel(10, 2);
        assert!(on_line.0[0] < 64, "expected dark pixel, got {on_line:?}");
        assert_eq!(*far_away, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn y_up_is_canvas_up() {
        let img = render(&[path(&[(-5.0, 6.0), (5.0, 6.0)], 2.0, "black")], frame(20, 20)).unwrap();
        // Drawing y = 6 is canvas row 4.
        assert!(img.get_pixel(10, 4).0[0] < 128);
        assert_eq!(img.get_pixel(10, 16).0[0], 255);
    }

    #[test]
    fn color_is_applied() {
        let img = render(&[path(&[(-5.0, 0.0), (5.0, 0.0)], 3.0, "red")], frame(20, 20)).unwrap();
        let px = img.get_pixel(10, 10);
        assert!(px.0[0] > 200 && px.0[1] < 64 && px.0[2] < 64, "got {px:?}");
    }

    #[test]
    fn empty_frame_is_an_error() {
        assert!(matches!(
            render(&[], frame(0, 10)),
            Err(ExportError::Canvas { width: 0, .. })
        ));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let huge = DrawingFrame::for_image(
            Dimensions {
                width: 4000,
                height: 3000,
            },
            250.0,
        );
        assert!(matches!(
            render(&[], huge),
            Err(ExportError::Canvas {
                width: 1_000_000,
                height: 750_000
            })
        ));

        let one_too_wide = frame(MAX_CANVAS_SIDE + 1, 1);
        assert!(render(&[], one_too_wide).is_err());
    }

    #[test]
    fn png_round_trips_through_image() {
        let bytes = render_png(&[path(&[(0.0, 0.0), (3.0, 3.0)], 1.0, "navy")], frame(12, 9)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
    }

    #[test]
    fn color_names_and_hex() {
        assert_eq!(named_color("black"), [0, 0, 0]);
        assert_eq!(named_color("Orange"), [255, 165, 0]);
        assert_eq!(named_color("#1a2B3c"), [0x1a, 0x2b, 0x3c]);
        assert_eq!(named_color("#12"), [0, 0, 0]);
        assert_eq!(named_color("chartreuse-ish"), [0, 0, 0]);
    }
}
