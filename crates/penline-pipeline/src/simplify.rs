//! Path simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count in polylines by removing points that are within
//! a given perpendicular distance of the line between the endpoints of
//! their sub-segment. The pipeline uses a *relative* tolerance: a
//! fraction of each contour's own open arc length, so long contours are
//! simplified more aggressively than short ones.
//!
//! The reduction works on index ranges over the input slice with an
//! explicit work stack and a keep-mask, so no sub-lists are allocated
//! and recursion depth does not grow with contour length.

use crate::types::{Point, Polyline};

/// Simplify a single polyline with an absolute tolerance in pixels.
///
/// A tolerance of 0.0 preserves every point that deviates at all.
/// Polylines with fewer than 3 points are returned unchanged (nothing to
/// simplify). The first and last points are always kept and point order
/// is preserved.
#[must_use = "returns the simplified polyline"]
pub fn simplify(polyline: &Polyline, tolerance: f64) -> Polyline {
    let points = polyline.points();
    if points.len() < 3 {
        return polyline.clone();
    }

    let kept = keep_mask(points, tolerance);

    let simplified: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polyline::new(simplified)
}

/// Simplify a polyline with tolerance `factor × arc_length`.
///
/// The arc length is measured with the polyline treated as open.
#[must_use = "returns the simplified polyline"]
pub fn simplify_relative(polyline: &Polyline, factor: f64) -> Polyline {
    simplify(polyline, tolerance_for(polyline, factor))
}

/// Tolerance used by [`simplify_relative`] for this polyline.
#[must_use]
pub fn tolerance_for(polyline: &Polyline, factor: f64) -> f64 {
    factor * polyline.arc_length()
}

/// Simplify multiple polylines independently, one output per input.
#[must_use = "returns the simplified polylines"]
pub fn simplify_paths(polylines: &[Polyline], factor: f64) -> Vec<Polyline> {
    polylines
        .iter()
        .map(|pl| simplify_relative(pl, factor))
        .collect()
}

/// Mark which points survive simplification.
///
/// Each stack entry is an index range `(start, end)` whose endpoints are
/// already kept. The farthest interior point is kept and both halves are
/// pushed when it deviates by more than `tolerance`.
fn keep_mask(points: &[Point], tolerance: f64) -> Vec<bool> {
    let last = points.len() - 1;
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    let mut stack = vec![(0, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(p, points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            kept[max_idx] = true;
            // Right half first so the left half is processed first.
            stack.push((max_idx, end));
            stack.push((start, max_idx));
        }
    }
    kept
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
pub(crate) fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
