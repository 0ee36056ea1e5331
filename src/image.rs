//! The canonical decoded raster and the shared container-format decode step.

use std::fmt::Debug;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tracing::debug;

use crate::error::GatewayError;

/// An in-memory RGB8 raster produced from compressed image bytes.
///
/// A `DecodedImage` only ever exists fully formed: positive dimensions and a
/// pixel buffer of exactly `width * height * 3` bytes. A failed or empty
/// decode is reported as [`GatewayError::UnsupportedFormat`] instead of a
/// partially populated value.
#[derive(Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DecodedImage {{ width: {}, height: {}, pixels: <{} bytes> }}",
            self.width,
            self.height,
            self.pixels.len()
        )
    }
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Re-encode as PNG for transport to the engine process.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            &self.pixels,
            self.width,
            self.height,
            ColorType::Rgb8,
        )?;
        Ok(out)
    }
}

/// Decode compressed image bytes into the canonical raster.
///
/// The container format is recognized from the bytes themselves, never from
/// a filename. Undecodable bytes, and decodes yielding a zero dimension, are
/// ordinary classified outcomes, not failures that unwind.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, GatewayError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| {
        debug!("image decode failed: {e}");
        GatewayError::UnsupportedFormat
    })?;

    let raster = decoded.to_rgb8();
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(GatewayError::UnsupportedFormat);
    }

    Ok(DecodedImage {
        width,
        height,
        pixels: raster.into_raw(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::bmp::BmpEncoder;

    /// A small solid-color PNG built in memory.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([12, 34, 56]));
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(img.as_raw(), width, height, ColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn decodes_png_by_content() {
        let image = decode_image(&png_bytes(8, 5)).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 5);
        assert_eq!(image.pixels().len(), 8 * 5 * 3);
    }

    #[test]
    fn decodes_bmp_by_content() {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        BmpEncoder::new(&mut bytes)
            .encode(img.as_raw(), 4, 4, ColorType::Rgb8)
            .unwrap();

        let image = decode_image(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (4, 4));
    }

    #[test]
    fn garbage_bytes_are_a_classified_outcome() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFormat));
    }

    #[test]
    fn empty_input_is_a_classified_outcome() {
        let err = decode_image(&[]).unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFormat));
    }

    #[test]
    fn png_round_trip_preserves_dimensions() {
        let image = decode_image(&png_bytes(9, 3)).unwrap();
        let again = decode_image(&image.to_png().unwrap()).unwrap();
        assert_eq!((again.width(), again.height()), (9, 3));
    }
}
