//! Image probing and letterbox transform.
//!
//! The cache itself never touches pixels; everything pixel-level goes
//! through the [`ImageTransform`] trait. [`Letterbox`] is the stock
//! implementation backed by the `image` crate, covering the common raster
//! formats (JPEG, PNG, GIF, WEBP, BMP).

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use thiserror::Error;

use crate::config::Dimensions;

/// Errors from probing or transforming image bytes
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("could not determine image format")]
    UnknownFormat,

    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
}

/// Pixel dimensions and codec of a source image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Lowercase codec identifier, e.g. "jpeg", "png"
    pub format: String,
}

/// A transformed thumbnail, re-encoded in the source codec
#[derive(Debug, Clone)]
pub struct PaddedImage {
    pub bytes: Vec<u8>,
    /// Lowercase codec identifier, e.g. "jpeg", "png"
    pub format: String,
}

/// Image-processing capability the cache delegates to
pub trait ImageTransform: Send + Sync {
    /// Detect dimensions and codec without a full decode
    fn probe(&self, bytes: &[u8]) -> Result<ImageInfo, TransformError>;

    /// Fit the image into `target`, aspect preserved, padding the
    /// uncovered canvas with `fill`
    fn pad(&self, bytes: &[u8], target: Dimensions, fill: [u8; 3])
        -> Result<PaddedImage, TransformError>;
}

/// Stock transform: Lanczos3 resample onto a solid-color canvas
pub struct Letterbox;

impl ImageTransform for Letterbox {
    fn probe(&self, bytes: &[u8]) -> Result<ImageInfo, TransformError> {
        let reader = guessed_reader(bytes)?;
        let format = reader.format().ok_or(TransformError::UnknownFormat)?;
        let (width, height) = reader.into_dimensions().map_err(TransformError::Decode)?;

        Ok(ImageInfo {
            width,
            height,
            format: format_name(format),
        })
    }

    fn pad(
        &self,
        bytes: &[u8],
        target: Dimensions,
        fill: [u8; 3],
    ) -> Result<PaddedImage, TransformError> {
        let reader = guessed_reader(bytes)?;
        let format = reader.format().ok_or(TransformError::UnknownFormat)?;
        let source = reader.decode().map_err(TransformError::Decode)?;

        // Scales up as well as down; small sources still fill the canvas.
        let resized = source.resize(target.width, target.height, FilterType::Lanczos3);

        let mut canvas = RgbImage::from_pixel(target.width, target.height, Rgb(fill));
        let x = i64::from((target.width - resized.width()) / 2);
        let y = i64::from((target.height - resized.height()) / 2);
        imageops::overlay(&mut canvas, &resized.to_rgb8(), x, y);

        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut buf, format)
            .map_err(TransformError::Encode)?;

        Ok(PaddedImage {
            bytes: buf.into_inner(),
            format: format_name(format),
        })
    }
}

fn guessed_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, TransformError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| TransformError::UnknownFormat)
}

/// Lowercase codec name matching the on-disk file-name encoding
fn format_name(format: ImageFormat) -> String {
    let name = match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        other => other.extensions_str().first().copied().unwrap_or("img"),
    };

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_probe_reports_dimensions_and_format() {
        let bytes = png_bytes(600, 300, [200, 60, 60]);
        let info = Letterbox.probe(&bytes).unwrap();

        assert_eq!(info.width, 600);
        assert_eq!(info.height, 300);
        assert_eq!(info.format, "png");
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let err = Letterbox.probe(b"definitely not an image").unwrap_err();
        assert!(matches!(err, TransformError::UnknownFormat));
    }

    #[test]
    fn test_pad_letterboxes_wide_image() {
        let fill = [10, 20, 30];
        let bytes = png_bytes(600, 300, [200, 60, 60]);

        let padded = Letterbox
            .pad(&bytes, Dimensions::new(200, 200), fill)
            .unwrap();
        assert_eq!(padded.format, "png");

        let out = image::load_from_memory(&padded.bytes).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (200, 200));

        // 600x300 resizes to 200x100, centered: 50px bars top and bottom
        assert_eq!(out.get_pixel(0, 0), &Rgb(fill));
        assert_eq!(out.get_pixel(100, 10), &Rgb(fill));
        assert_eq!(out.get_pixel(100, 100), &Rgb([200, 60, 60]));
        assert_eq!(out.get_pixel(100, 190), &Rgb(fill));
    }

    #[test]
    fn test_pad_keeps_source_codec() {
        let img = RgbImage::from_pixel(64, 64, Rgb([1, 2, 3]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Bmp)
            .unwrap();

        let padded = Letterbox
            .pad(&buf.into_inner(), Dimensions::new(32, 32), [0, 0, 0])
            .unwrap();
        assert_eq!(padded.format, "bmp");
        assert_eq!(
            image::guess_format(&padded.bytes).unwrap(),
            ImageFormat::Bmp
        );
    }
}
