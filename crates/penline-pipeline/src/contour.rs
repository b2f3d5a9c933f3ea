//! Contour extraction: turn a binary edge [`Bitmap`] into point sequences.
//!
//! This module defines the [`ContourExtractor`] trait for pluggable
//! extraction algorithms and the [`ContourExtractorKind`] enum for
//! selecting one at runtime.
//!
//! Contours come back as a flat list. No nesting or hierarchy is tracked
//! and the order between contours carries no meaning beyond being stable
//! for a given bitmap.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::types::{Point, Polyline};

/// Selects which contour extraction algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourExtractorKind {
    /// 8-connected component grouping followed by a clockwise
    /// Moore-neighbor boundary trace of each group.
    ///
    /// Produces exactly one contour per connected group of edge pixels;
    /// an isolated pixel yields a single-point contour.
    #[default]
    MooreNeighbor,

    /// Suzuki-Abe border following via `imageproc::contours::find_contours`.
    ///
    /// Outer borders and hole borders are both returned, flattened into
    /// one list. A closed ring therefore yields two contours.
    BorderFollowing,
}

/// How a traced pixel chain is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainApproximation {
    /// Keep every traced pixel.
    None,
    /// Drop the interior pixels of horizontal, vertical, and diagonal runs,
    /// keeping only the points where the trace changes direction.
    #[default]
    Simple,
}

/// Trait for contour extraction strategies.
///
/// Input: a binary edge map. Output: a set of ordered pixel-space
/// polylines, each with at least one point.
pub trait ContourExtractor {
    /// Extract contours from the given edge map.
    fn extract(&self, edges: &Bitmap, approximation: ChainApproximation) -> Vec<Polyline>;
}

impl ContourExtractor for ContourExtractorKind {
    fn extract(&self, edges: &Bitmap, approximation: ChainApproximation) -> Vec<Polyline> {
        let chains = match *self {
            Self::MooreNeighbor => trace_moore_neighbor(edges),
            Self::BorderFollowing => trace_border_following(edges),
        };

        chains
            .into_iter()
            .map(|chain| {
                let chain = match approximation {
                    ChainApproximation::None => chain,
                    ChainApproximation::Simple => compress_chain(&chain),
                };
                Polyline::new(
                    chain
                        .into_iter()
                        .map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
                        .collect(),
                )
            })
            .collect()
    }
}

/// Neighbor offsets in clockwise screen order (y grows downward),
/// starting from west.
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Index of `WEST` in [`NEIGHBORS`].
const WEST: usize = 0;

type Pixel = (u32, u32);

/// Index into [`NEIGHBORS`] of the unit offset `(dx, dy)`.
fn neighbor_index(dx: i64, dy: i64) -> Option<usize> {
    NEIGHBORS
        .iter()
        .position(|&(nx, ny)| i64::from(nx) == dx && i64::from(ny) == dy)
}

fn step(p: Pixel, dir: usize) -> (i64, i64) {
    let (dx, dy) = NEIGHBORS[dir];
    (i64::from(p.0) + i64::from(dx), i64::from(p.1) + i64::from(dy))
}

/// Group edge pixels into 8-connected components and trace each one.
///
/// Components are discovered in raster-scan order, so each trace starts
/// at the component's top-most, left-most pixel. Its west neighbor is
/// necessarily background, which seeds the Moore backtrack.
fn trace_moore_neighbor(edges: &Bitmap) -> Vec<Vec<Pixel>> {
    let width = edges.width() as usize;
    let index = move |(x, y): Pixel| y as usize * width + x as usize;
    let mut visited = vec![false; width * edges.height() as usize];
    let mut covered = vec![false; visited.len()];

    let mut contours = Vec::new();
    for y in 0..edges.height() {
        for x in 0..edges.width() {
            if !edges.get(x, y) || visited[index((x, y))] {
                continue;
            }
            let mut members = flood_component(edges, (x, y), &mut visited, index);
            members.sort_unstable_by_key(|&(px, py)| (py, px));
            contours.push(trace_group(edges, &members, &mut covered, index));
        }
    }
    contours
}

/// Mark every pixel 8-connected to `seed` as visited and return them.
fn flood_component(
    edges: &Bitmap,
    seed: Pixel,
    visited: &mut [bool],
    index: impl Fn(Pixel) -> usize,
) -> Vec<Pixel> {
    let mut stack = vec![seed];
    visited[index(seed)] = true;
    let mut members = Vec::new();

    while let Some(p) = stack.pop() {
        members.push(p);
        for (nx, ny) in edge_neighbors(edges, p) {
            let idx = index((nx, ny));
            if !visited[idx] {
                visited[idx] = true;
                stack.push((nx, ny));
            }
        }
    }
    members
}

/// Edge pixels among the eight neighbors of `p`, in clockwise order.
fn edge_neighbors(edges: &Bitmap, p: Pixel) -> impl Iterator<Item = Pixel> + '_ {
    (0..NEIGHBORS.len()).filter_map(move |dir| {
        let (nx, ny) = step(p, dir);
        if !edges.get_signed(nx, ny) {
            return None;
        }
        Some((u32::try_from(nx).ok()?, u32::try_from(ny).ok()?))
    })
}

/// Direction from `p` to a background pixel sharing a side with it.
///
/// A pixel with none is interior: background only reaches it through a
/// corner, and no 8-connected boundary passes through it.
fn background_direction(edges: &Bitmap, p: Pixel) -> Option<usize> {
    [0, 2, 4, 6].into_iter().find(|&dir| {
        let (nx, ny) = step(p, dir);
        !edges.get_signed(nx, ny)
    })
}

/// Trace one component into a single chain that visits every member
/// touching background.
///
/// The outer boundary is traced first. A member it misses, such as a
/// pixel that only faces a hole, seeds another Moore trace around that
/// background region. Each extra loop is spliced into the chain through
/// a path of component pixels walked out and back, so consecutive points
/// stay 8-adjacent and the pen never leaves the edge pixels. Members
/// without a side facing background are interior and never traced.
fn trace_group(
    edges: &Bitmap,
    members: &[Pixel],
    covered: &mut [bool],
    index: impl Fn(Pixel) -> usize + Copy,
) -> Vec<Pixel> {
    let Some(&start) = members.first() else {
        return Vec::new();
    };
    let budget = members.len().saturating_mul(8).saturating_add(8);

    let mut chain = trace_boundary(edges, start, WEST, budget);
    for &p in &chain {
        covered[index(p)] = true;
    }

    for &p in members {
        if covered[index(p)] {
            continue;
        }
        let Some(backtrack) = background_direction(edges, p) else {
            continue;
        };
        let cycle = trace_boundary(edges, p, backtrack, budget);
        let inserted = splice_cycle(edges, &mut chain, &cycle, covered, index);
        for q in inserted {
            covered[index(q)] = true;
        }
    }
    chain
}

/// Insert a closed `cycle` into `chain` and return the pixels added.
///
/// The cycle is entered from the nearest chain pixel (breadth-first over
/// edge pixels), walked once around, and left the way it was entered.
fn splice_cycle(
    edges: &Bitmap,
    chain: &mut Vec<Pixel>,
    cycle: &[Pixel],
    covered: &[bool],
    index: impl Fn(Pixel) -> usize,
) -> Vec<Pixel> {
    let Some(path) = path_to_chain(edges, cycle, covered, index) else {
        chain.extend_from_slice(cycle);
        return cycle.to_vec();
    };
    // path runs from a chain pixel to a cycle pixel.
    let (Some(&anchor), Some(&entry)) = (path.first(), path.last()) else {
        return Vec::new();
    };
    let Some(at) = chain.iter().position(|&q| q == anchor) else {
        chain.extend_from_slice(cycle);
        return cycle.to_vec();
    };
    let offset = cycle.iter().position(|&q| q == entry).unwrap_or(0);

    let mut insertion: Vec<Pixel> = path[1..].to_vec();
    if cycle.len() > 1 {
        insertion.extend(cycle[offset..].iter().chain(&cycle[..offset]).skip(1));
        insertion.push(entry);
    }
    insertion.extend(path[..path.len() - 1].iter().rev());

    let tail = chain.split_off(at + 1);
    chain.extend_from_slice(&insertion);
    chain.extend(tail);
    insertion
}

/// Shortest path of edge pixels from an already covered pixel to any
/// pixel of `cycle`. The returned path starts on the chain and ends on
/// the cycle; it is a single pixel when the two already touch.
fn path_to_chain(
    edges: &Bitmap,
    cycle: &[Pixel],
    covered: &[bool],
    index: impl Fn(Pixel) -> usize,
) -> Option<Vec<Pixel>> {
    let mut parent: HashMap<Pixel, Option<Pixel>> = HashMap::new();
    let mut queue = VecDeque::new();
    for &p in cycle {
        if parent.insert(p, None).is_none() {
            queue.push_back(p);
        }
    }

    while let Some(p) = queue.pop_front() {
        if covered[index(p)] {
            // Walk parents back to the cycle; that order already runs
            // chain -> cycle.
            let mut path = vec![p];
            let mut cur = p;
            while let Some(&Some(prev)) = parent.get(&cur) {
                path.push(prev);
                cur = prev;
            }
            return Some(path);
        }
        for n in edge_neighbors(edges, p) {
            if let Entry::Vacant(slot) = parent.entry(n) {
                slot.insert(Some(p));
                queue.push_back(n);
            }
        }
    }
    None
}

/// Clockwise Moore-neighbor trace around the background region that
/// `backtrack` points into, starting at `start`.
///
/// The trace stops when it is about to repeat its first move out of
/// `start`. The step budget guards against pathological inputs.
fn trace_boundary(
    edges: &Bitmap,
    start: Pixel,
    mut backtrack: usize,
    budget: usize,
) -> Vec<Pixel> {
    let mut chain = vec![start];

    let mut current = start;
    let mut first_move: Option<Pixel> = None;

    for _ in 0..budget {
        let Some((next, dir)) = next_boundary_pixel(edges, current, backtrack) else {
            // Isolated pixel.
            break;
        };

        if current == start {
            match first_move {
                None => first_move = Some(next),
                Some(first) if first == next => break,
                Some(_) => {}
            }
        }

        // The last background pixel examined becomes the new backtrack,
        // expressed relative to `next`.
        let (bx, by) = step(current, (dir + NEIGHBORS.len() - 1) % NEIGHBORS.len());
        backtrack = neighbor_index(bx - i64::from(next.0), by - i64::from(next.1)).unwrap_or(WEST);

        chain.push(next);
        current = next;
    }

    // The loop ends on the move back into `start`; drop the duplicate.
    if chain.len() > 1 && chain.last() == Some(&start) {
        chain.pop();
    }
    chain
}

/// Scan the neighbors of `current` clockwise, starting just after the
/// `backtrack` direction, and return the first edge pixel with its
/// direction.
fn next_boundary_pixel(edges: &Bitmap, current: Pixel, backtrack: usize) -> Option<(Pixel, usize)> {
    (1..=NEIGHBORS.len()).find_map(|k| {
        let dir = (backtrack + k) % NEIGHBORS.len();
        let (nx, ny) = step(current, dir);
        if edges.get_signed(nx, ny) {
            Some(((u32::try_from(nx).ok()?, u32::try_from(ny).ok()?), dir))
        } else {
            None
        }
    })
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
fn trace_border_following(edges: &Bitmap) -> Vec<Vec<Pixel>> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&edges.to_gray());

    contours
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| c.points.into_iter().map(|p| (p.x, p.y)).collect())
        .collect()
}

/// Remove points that continue a straight run, treating the chain as a
/// closed cycle.
///
/// A point is kept when the step into it differs from the step out of
/// it. A one-pixel-wide straight line, traced out and back, therefore
/// reduces to its two endpoints. Chains of one or two points are
/// returned unchanged.
fn compress_chain(chain: &[Pixel]) -> Vec<Pixel> {
    let n = chain.len();
    if n < 3 {
        return chain.to_vec();
    }

    let delta = |a: Pixel, b: Pixel| {
        (
            i64::from(b.0) - i64::from(a.0),
            i64::from(b.1) - i64::from(a.1),
        )
    };

    let kept: Vec<Pixel> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            delta(prev, chain[i]) != delta(chain[i], next)
        })
        .map(|i| chain[i])
        .collect();

    // A chain with no turns at all cannot come from a trace, but keep a
    // usable result if one shows up.
    if kept.is_empty() {
        vec![chain[0]]
    } else {
        kept
    }
}
