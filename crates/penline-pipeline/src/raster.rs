//! Source decoding: encoded image bytes to an 8-bit grayscale raster.

use image::GrayImage;

use crate::types::PipelineError;

/// Decode an encoded image and reduce it to one luminance channel.
///
/// Any format enabled on the `image` dependency is accepted (PNG, JPEG,
/// BMP, WebP). Color images are converted with the `image` crate's
/// luma weights; alpha is discarded.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty and
/// [`PipelineError::ImageDecode`] if the data cannot be decoded.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_luma8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{ImageEncoder, Rgb, RgbImage};

    use super::*;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgb8,
            )
            .unwrap();
        buf
    }

    #[test]
    fn rejects_empty_bytes() {
        assert!(matches!(
            decode_and_grayscale(&[]),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_and_grayscale(b"not an image at all"),
            Err(PipelineError::ImageDecode(_))
        ));
    }

    #[test]
    fn keeps_dimensions() {
        let img = RgbImage::from_pixel(13, 7, Rgb([10, 20, 30]));
        let gray = decode_and_grayscale(&encode_png(&img)).unwrap();
        assert_eq!(gray.dimensions(), (13, 7));
    }

    #[test]
    fn black_and_white_survive_conversion() {
        let img = RgbImage::from_fn(4, 1, |x, _| {
            if x < 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let gray = decode_and_grayscale(&encode_png(&img)).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(3, 0).0[0], 255);
    }

    #[test]
    fn green_is_brighter_than_blue() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 200, 0])
            } else {
                Rgb([0, 0, 200])
            }
        });
        let gray = decode_and_grayscale(&encode_png(&img)).unwrap();
        assert!(gray.get_pixel(0, 0).0[0] > gray.get_pixel(1, 0).0[0]);
    }
}
