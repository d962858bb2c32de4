//! Centered square crop of an image before upload.
//!
//! Decoding and encoding are CPU bound, so the async entry point runs them on
//! the blocking pool.

use anyhow::{Context, Result};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Cropped image, re-encoded, with the MIME type it was encoded as.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub data: Bytes,
    pub mime_type: String,
    pub side: u32,
}

/// Centered square inside a `width` x `height` image: `(x, y, side)`.
pub fn square_crop_rect(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// Format to re-encode in. An empty MIME type means JPEG, and formats this
/// build cannot write fall back to PNG.
pub fn output_format(mime_type: &str) -> ImageFormat {
    let mime = mime_type.trim();
    if mime.is_empty() {
        return ImageFormat::Jpeg;
    }
    match ImageFormat::from_mime_type(mime) {
        Some(format) if format.writing_enabled() => format,
        _ => ImageFormat::Png,
    }
}

/// Width and height from the image header, without decoding pixels.
pub fn image_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to read image header")?
        .into_dimensions()
        .context("Failed to read image dimensions")
}

pub fn crop_to_square(data: &[u8], mime_type: &str) -> Result<CroppedImage> {
    let img = image::load_from_memory(data).context("Failed to decode image")?;
    let (width, height) = img.dimensions();
    let (x, y, side) = square_crop_rect(width, height);

    let cropped = img.crop_imm(x, y, side, side);
    let format = output_format(mime_type);

    // JPEG has no alpha channel
    let cropped = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(cropped.to_rgb8())
    } else {
        cropped
    };

    let mut buf = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut buf), format)
        .with_context(|| format!("Failed to encode cropped image as {:?}", format))?;

    log::debug!(
        "Cropped {}x{} image to {}x{} at ({}, {})",
        width,
        height,
        side,
        side,
        x,
        y
    );

    Ok(CroppedImage {
        data: Bytes::from(buf),
        mime_type: format.to_mime_type().to_string(),
        side,
    })
}

pub async fn crop_to_square_async(data: Bytes, mime_type: String) -> Result<CroppedImage> {
    tokio::task::spawn_blocking(move || crop_to_square(&data, &mime_type))
        .await
        .context("Crop task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        // Left half red, right half blue, so the crop window is observable
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn test_landscape_rect() {
        assert_eq!(square_crop_rect(400, 300), (50, 0, 300));
    }

    #[test]
    fn test_portrait_rect() {
        assert_eq!(square_crop_rect(300, 401), (0, 50, 300));
    }

    #[test]
    fn test_output_format() {
        assert_eq!(output_format(""), ImageFormat::Jpeg);
        assert_eq!(output_format("image/png"), ImageFormat::Png);
        assert_eq!(output_format("image/jpeg"), ImageFormat::Jpeg);
        assert_eq!(output_format("application/x-unknown"), ImageFormat::Png);
    }

    #[test]
    fn test_crop_png_keeps_format() {
        let data = encoded(400, 300, ImageFormat::Png);
        let cropped = crop_to_square(&data, "image/png").unwrap();
        assert_eq!(cropped.mime_type, "image/png");
        assert_eq!(cropped.side, 300);

        let decoded = image::load_from_memory(&cropped.data).unwrap();
        assert_eq!(decoded.dimensions(), (300, 300));
        // Crop is centered: both colour halves survive
        let rgb = decoded.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(299, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_empty_mime_encodes_jpeg() {
        let data = encoded(64, 32, ImageFormat::Png);
        let cropped = crop_to_square(&data, "").unwrap();
        assert_eq!(cropped.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&cropped.data).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
    }

    #[test]
    fn test_decode_error() {
        assert!(crop_to_square(b"not an image", "image/png").is_err());
    }

    #[test]
    fn test_dimensions_from_header() {
        assert_eq!(image_dimensions(&encoded(400, 300, ImageFormat::Png)).unwrap(), (400, 300));
        assert_eq!(image_dimensions(&encoded(31, 57, ImageFormat::Jpeg)).unwrap(), (31, 57));
        assert!(image_dimensions(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_async_propagates_errors() {
        let result = crop_to_square_async(Bytes::from_static(b"garbage"), "image/png".into()).await;
        assert!(result.is_err());

        let data = Bytes::from(encoded(10, 20, ImageFormat::Png));
        let cropped = crop_to_square_async(data, "image/png".into()).await.unwrap();
        assert_eq!(cropped.side, 10);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_crop_rect_is_centered_square(w in 1u32..5000, h in 1u32..5000) {
            let (x, y, side) = square_crop_rect(w, h);
            prop_assert_eq!(side, w.min(h));
            prop_assert!(x + side <= w);
            prop_assert!(y + side <= h);
            prop_assert!(x == 0 || y == 0);
            prop_assert_eq!(x, (w - side) / 2);
            prop_assert_eq!(y, (h - side) / 2);
        }
    }
}
