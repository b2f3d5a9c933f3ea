//! Pixel space to drawing space.
//!
//! Drawing space puts the origin at the image center with y pointing up,
//! which is what turtle-style agents and most plotters expect:
//!
//! ```text
//! draw_x = (x - W/2) * scale
//! draw_y = (H/2 - y) * scale
//! ```
//!
//! `W/2` and `H/2` are integer halves of the pixel dimensions, so the
//! center pixel lands exactly on the origin for odd sizes as well.

use crate::types::{Dimensions, DrawPoint, Point, Polyline, Stroke};

/// Maps pixel-space points into centered, y-up drawing space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    center_x: f64,
    center_y: f64,
    scale: f64,
}

impl CoordinateMapper {
    /// Build a mapper for an image of the given dimensions.
    #[must_use]
    pub fn new(dimensions: Dimensions, scale: f64) -> Self {
        Self {
            center_x: f64::from(dimensions.width / 2),
            center_y: f64::from(dimensions.height / 2),
            scale,
        }
    }

    /// Map one pixel-space point.
    #[must_use]
    pub fn map(&self, p: Point) -> DrawPoint {
        DrawPoint::new(
            (p.x - self.center_x) * self.scale,
            (self.center_y - p.y) * self.scale,
        )
    }

    /// Map every point of a simplified contour, preserving order.
    #[must_use]
    pub fn map_polyline(&self, polyline: &Polyline) -> Stroke {
        Stroke::new(polyline.points().iter().map(|&p| self.map(p)).collect())
    }

    /// Map a batch of simplified contours, one stroke per contour.
    #[must_use]
    pub fn map_all(&self, polylines: &[Polyline]) -> Vec<Stroke> {
        polylines.iter().map(|pl| self.map_polyline(pl)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn center_maps_to_origin_for_any_scale() {
        for (w, h) in [(10, 10), (640, 480), (11, 7), (1, 1)] {
            for scale in [0.25, 1.0, 3.5] {
                let mapper = CoordinateMapper::new(dims(w, h), scale);
                let center = Point::new(f64::from(w / 2), f64::from(h / 2));
                assert_eq!(mapper.map(center), DrawPoint::new(0.0, 0.0));
            }
        }
    }

    #[test]
    fn y_axis_is_flipped() {
        let mapper = CoordinateMapper::new(dims(10, 10), 1.0);
        // Top-left corner is up and to the left of center.
        assert_eq!(mapper.map(Point::new(0.0, 0.0)), DrawPoint::new(-5.0, 5.0));
        // Bottom-right is down and to the right.
        assert_eq!(mapper.map(Point::new(10.0, 10.0)), DrawPoint::new(5.0, -5.0));
    }

    #[test]
    fn scale_is_uniform() {
        let mapper = CoordinateMapper::new(dims(100, 50), 2.0);
        assert_eq!(
            mapper.map(Point::new(60.0, 20.0)),
            DrawPoint::new(20.0, 10.0)
        );
    }

    #[test]
    fn row_five_endpoints() {
        let mapper = CoordinateMapper::new(dims(10, 10), 1.0);
        assert_eq!(mapper.map(Point::new(1.0, 5.0)), DrawPoint::new(-4.0, 0.0));
        assert_eq!(mapper.map(Point::new(8.0, 5.0)), DrawPoint::new(3.0, 0.0));
    }

    #[test]
    fn map_polyline_preserves_order_and_length() {
        let mapper = CoordinateMapper::new(dims(20, 20), 0.5);
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 4.0),
        ]);
        let stroke = mapper.map_polyline(&pl);
        assert_eq!(
            stroke.points(),
            &[
                DrawPoint::new(-5.0, 5.0),
                DrawPoint::new(0.0, 0.0),
                DrawPoint::new(5.0, 3.0),
            ]
        );
    }

    #[test]
    fn map_all_is_one_to_one() {
        let mapper = CoordinateMapper::new(dims(4, 4), 1.0);
        let polylines = vec![
            Polyline::new(vec![Point::new(1.0, 1.0)]),
            Polyline::new(vec![]),
        ];
        let strokes = mapper.map_all(&polylines);
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].len(), 1);
        assert!(strokes[1].is_empty());
    }
}
