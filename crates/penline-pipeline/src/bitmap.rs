//! Binary edge bitmap.
//!
//! A [`Bitmap`] is the hand-off between the edge source and contour
//! extraction: a row-major grid of "edge present" flags with the same
//! dimensions as the source raster.

use image::{GrayImage, Luma};

use crate::types::Dimensions;

/// Gray value used for edge pixels when a bitmap is encoded as an image.
pub const EDGE_VALUE: u8 = 255;

/// Row-major grid of edge flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Bitmap {
    /// Create an all-background bitmap.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; cell_count(width, height)],
        }
    }

    /// Build a bitmap by evaluating `f(x, y)` for every cell.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(cell_count(width, height));
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Interpret a grayscale image as a bitmap: any non-zero pixel is an edge.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            cells: image.as_raw().iter().map(|&v| v > 0).collect(),
        }
    }

    /// Encode as a black/white grayscale image (edge = 255, background = 0).
    #[must_use]
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { EDGE_VALUE } else { 0 }])
        })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height as [`Dimensions`].
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether `(x, y)` is an edge. Out-of-bounds coordinates are background.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[self.index(x, y)]
    }

    /// Signed lookup used by neighbor walks; negative or out-of-bounds
    /// coordinates are background.
    #[must_use]
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) => self.get(x, y),
            _ => false,
        }
    }

    /// Mark or clear a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, edge: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = edge;
        }
    }

    /// Number of edge cells.
    #[must_use]
    pub fn edge_count(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// Returns `true` if no cell is an edge.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        !self.cells.contains(&true)
    }

    /// Swap edge and background cells.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|&c| !c).collect(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bitmap_is_blank() {
        let bm = Bitmap::empty(4, 3);
        assert_eq!(bm.width(), 4);
        assert_eq!(bm.height(), 3);
        assert!(bm.is_blank());
        assert_eq!(bm.edge_count(), 0);
    }

    #[test]
    fn set_and_get() {
        let mut bm = Bitmap::empty(5, 5);
        bm.set(2, 3, true);
        assert!(bm.get(2, 3));
        assert!(!bm.get(3, 2));
        assert_eq!(bm.edge_count(), 1);
    }

    #[test]
    fn out_of_bounds_is_background() {
        let mut bm = Bitmap::from_fn(3, 3, |_, _| true);
        bm.set(10, 10, true);
        assert!(!bm.get(3, 0));
        assert!(!bm.get(0, 3));
        assert!(!bm.get_signed(-1, 0));
        assert!(!bm.get_signed(0, -1));
        assert!(bm.get_signed(2, 2));
    }

    #[test]
    fn gray_round_trip_preserves_cells() {
        let bm = Bitmap::from_fn(6, 4, |x, y| (x + y) % 3 == 0);
        let gray = bm.to_gray();
        assert_eq!(gray.get_pixel(0, 0).0[0], EDGE_VALUE);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
        assert_eq!(Bitmap::from_gray(&gray), bm);
    }

    #[test]
    fn from_gray_treats_any_nonzero_as_edge() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(1, 0, Luma([7]));
        let bm = Bitmap::from_gray(&gray);
        assert!(!bm.get(0, 0));
        assert!(bm.get(1, 0));
    }

    #[test]
    fn double_invert_is_identity() {
        let bm = Bitmap::from_fn(5, 5, |x, _| x == 2);
        let inv = bm.inverted();
        assert!(!inv.get(2, 0));
        assert!(inv.get(0, 0));
        assert_eq!(inv.inverted(), bm);
    }
}
