//! Fit-inside resizing and JPEG re-encoding
//!
//! CPU-bound throughout; async callers should run [`generate`] on a blocking
//! thread (the pipeline does).

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::debug;

use crate::{MEDIUM_BOX, SMALL_BOX};

#[derive(Debug, Error)]
pub enum MediaError {
    /// The payload is not a decodable image. Uploads must not proceed past
    /// this: no derivative can exist, so nothing is written.
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("jpeg encode failed: {0}")]
    Encode(#[source] image::ImageError),
}

/// The two resized renditions produced for an image upload.
#[derive(Debug, Clone)]
pub struct DerivativeSet {
    /// Fits inside 200×200.
    pub small: Vec<u8>,
    /// Fits inside 500×500.
    pub medium: Vec<u8>,
}

/// Decode `original` once and render both derivative JPEGs.
pub fn generate(original: &[u8]) -> Result<DerivativeSet, MediaError> {
    let img = image::load_from_memory(original).map_err(MediaError::Decode)?;
    debug!(
        width = img.width(),
        height = img.height(),
        "decoded upload for derivative generation"
    );

    let small = render_into_box(&img, SMALL_BOX)?;
    let medium = render_into_box(&img, MEDIUM_BOX)?;

    Ok(DerivativeSet { small, medium })
}

/// Largest dimensions preserving aspect ratio that fit inside a `box_px`
/// square without exceeding the original size. Never below 1 pixel per side.
pub fn fit_dimensions(width: u32, height: u32, box_px: u32) -> (u32, u32) {
    if width <= box_px && height <= box_px {
        return (width, height);
    }
    let scale = f64::from(box_px) / f64::from(width.max(height));
    let w = ((f64::from(width) * scale).round() as u32).clamp(1, box_px);
    let h = ((f64::from(height) * scale).round() as u32).clamp(1, box_px);
    (w, h)
}

fn render_into_box(img: &DynamicImage, box_px: u32) -> Result<Vec<u8>, MediaError> {
    let (target_w, target_h) = fit_dimensions(img.width(), img.height(), box_px);
    if (target_w, target_h) == (img.width(), img.height()) {
        // Already inside the box: re-encode at original size, no resample.
        return encode_jpeg(img);
    }
    let resized = img.resize_exact(target_w, target_h, FilterType::Lanczos3);
    encode_jpeg(&resized)
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    // JPEG has no alpha channel; flatten everything to RGB first.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(MediaError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 251) as u8, (y % 241) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn decoded_dims(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_fit_landscape() {
        assert_eq!(fit_dimensions(1000, 800, 200), (200, 160));
        assert_eq!(fit_dimensions(1000, 800, 500), (500, 400));
    }

    #[test]
    fn test_fit_portrait() {
        assert_eq!(fit_dimensions(800, 1000, 200), (160, 200));
    }

    #[test]
    fn test_fit_square() {
        assert_eq!(fit_dimensions(1200, 1200, 500), (500, 500));
    }

    #[test]
    fn test_fit_never_upscales() {
        assert_eq!(fit_dimensions(120, 80, 200), (120, 80));
        assert_eq!(fit_dimensions(200, 200, 200), (200, 200));
        assert_eq!(fit_dimensions(1, 1, 500), (1, 1));
    }

    #[test]
    fn test_fit_extreme_aspect_keeps_a_pixel() {
        let (w, h) = fit_dimensions(10_000, 10, 200);
        assert_eq!(w, 200);
        assert_eq!(h, 1, "short side must not round down to zero");
    }

    #[test]
    fn test_generate_renders_both_boxes_as_jpeg() {
        let set = generate(&png_bytes(1000, 800)).unwrap();

        assert_eq!(
            image::guess_format(&set.small).unwrap(),
            ImageFormat::Jpeg,
            "derivatives are always JPEG, input format notwithstanding"
        );
        assert_eq!(image::guess_format(&set.medium).unwrap(), ImageFormat::Jpeg);

        assert_eq!(decoded_dims(&set.small), (200, 160));
        assert_eq!(decoded_dims(&set.medium), (500, 400));
    }

    #[test]
    fn test_generate_keeps_small_images_at_original_size() {
        let set = generate(&png_bytes(100, 50)).unwrap();

        assert_eq!(decoded_dims(&set.small), (100, 50));
        assert_eq!(decoded_dims(&set.medium), (100, 50));
        assert_eq!(image::guess_format(&set.small).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_generate_rejects_garbage() {
        let err = generate(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }

    #[test]
    fn test_generate_rejects_empty_payload() {
        assert!(matches!(generate(b""), Err(MediaError::Decode(_))));
    }

    mod proptest_suite {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fit_always_inside_box_and_never_upscales(
                width in 1u32..4000,
                height in 1u32..4000,
                box_px in prop::sample::select(vec![SMALL_BOX, MEDIUM_BOX]),
            ) {
                let (w, h) = fit_dimensions(width, height, box_px);

                prop_assert!(w <= box_px && h <= box_px);
                prop_assert!(w <= width && h <= height);
                prop_assert!(w >= 1 && h >= 1);

                if width <= box_px && height <= box_px {
                    prop_assert_eq!((w, h), (width, height));
                } else {
                    prop_assert_eq!(w.max(h), box_px, "longest side lands on the box edge");
                }
            }
        }
    }
}
