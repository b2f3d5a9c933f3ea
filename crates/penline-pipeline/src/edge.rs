//! Edge detection: the grayscale raster to binary [`Bitmap`] step.
//!
//! The [`EdgeSource`] trait is the seam between the vectorizer and
//! whatever produces the edge map. The default implementation,
//! [`CannyEdgeSource`], wraps [`imageproc::edges::canny`], which performs
//! smoothing, Sobel gradients, non-maximum suppression, and two-threshold
//! hysteresis.

use image::GrayImage;

use crate::bitmap::Bitmap;

/// Minimum allowed hysteresis threshold.
///
/// A low threshold of zero turns every pixel with any gradient into a
/// candidate edge, which floods contour extraction. It also lets
/// hysteresis walk into the unsuppressed image border.
pub const MIN_THRESHOLD: u16 = 1;
const _: () = assert!(MIN_THRESHOLD > 0);

/// Smallest raster side the detector can process; it needs a one-pixel
/// border on each side.
const MIN_SIDE: u32 = 3;

/// Produces a binary edge map from a grayscale raster.
///
/// Implementations must be deterministic and return a bitmap with the
/// same dimensions as `raster`.
pub trait EdgeSource {
    /// Detect edges using hysteresis thresholds `low` and `high`.
    fn detect(&self, raster: &GrayImage, low: u16, high: u16) -> Bitmap;
}

/// Canny edge detector backed by `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannyEdgeSource;

impl EdgeSource for CannyEdgeSource {
    fn detect(&self, raster: &GrayImage, low: u16, high: u16) -> Bitmap {
        if raster.width() < MIN_SIDE || raster.height() < MIN_SIDE {
            return Bitmap::empty(raster.width(), raster.height());
        }
        let (low, high) = clamp_thresholds(low, high);
        let edges = imageproc::edges::canny(raster, f32::from(low), f32::from(high));
        Bitmap::from_gray(&edges)
    }
}

/// Clamp both thresholds to at least [`MIN_THRESHOLD`] and `low` to at
/// most `high`.
#[must_use]
pub fn clamp_thresholds(low: u16, high: u16) -> (u16, u16) {
    let high = high.max(MIN_THRESHOLD);
    let low = low.max(MIN_THRESHOLD).min(high);
    (low, high)
}
