//! Cover normalization: downscale, flatten transparency, lossy re-encode
//!
//! Pure apart from scratch buffers; the same source always yields the same
//! payload.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbImage, RgbaImage};

use crate::types::{CapturedImage, ImageOrigin};

/// Longest side of a normalized image. Keeps the payload safely under the
/// analysis API's request limits.
pub const MAX_DIMENSION: u32 = 800;

/// JPEG quality factor, tuned to balance cover-text legibility against
/// payload size
pub const JPEG_QUALITY: u8 = 70;

/// A source of pixels with intrinsic dimensions: a decoded still image or a
/// raw camera frame.
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);
    fn to_rgba(&self) -> RgbaImage;
}

impl PixelSource for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn to_rgba(&self) -> RgbaImage {
        self.to_rgba8()
    }
}

/// One raw RGBA frame grabbed from a live camera stream
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl RawFrame {
    /// Solid-color frame, used by camera test doubles
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            rgba: pixels,
        }
    }
}

impl PixelSource for RawFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn to_rgba(&self) -> RgbaImage {
        // A mis-sized buffer degrades to a blank frame of the declared size
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

/// Normalize a pixel source into a compact JPEG payload.
///
/// Returns `None` when the source reports a zero intrinsic dimension (camera
/// not yet delivering frames); callers treat that as retry-later, not a
/// fatal error.
pub fn normalize(
    source: &impl PixelSource,
    origin: ImageOrigin,
    max_dimension: u32,
) -> Option<CapturedImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let (target_w, target_h) = scaled_dimensions(width, height, max_dimension);

    let rgba = source.to_rgba();
    let rgba = if (target_w, target_h) == (width, height) {
        rgba
    } else {
        imageops::resize(&rgba, target_w, target_h, imageops::FilterType::Triangle)
    };

    // Composite over opaque white so transparent sources do not corrupt
    // downstream color assumptions when re-encoded as JPEG
    let flattened = flatten_onto_white(&rgba);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&flattened)
        .ok()?;

    Some(CapturedImage::new(jpeg, origin, target_w, target_h))
}

/// Scale so the longer side equals `max_dimension`, preserving aspect ratio.
/// Never upscales.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width >= height {
        if width > max_dimension {
            let scaled = (height as f64 * max_dimension as f64 / width as f64).round() as u32;
            (max_dimension, scaled.max(1))
        } else {
            (width, height)
        }
    } else if height > max_dimension {
        let scaled = (width as f64 * max_dimension as f64 / height as f64).round() as u32;
        (scaled.max(1), max_dimension)
    } else {
        (width, height)
    }
}

fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_landscape_frame_scales_to_long_side() {
        let frame = RawFrame::solid(1600, 1200, [128, 128, 128, 255]);
        let image = normalize(&frame, ImageOrigin::LiveCapture, MAX_DIMENSION).unwrap();
        assert_eq!((image.width, image.height), (800, 600));
        assert_eq!(image.origin, ImageOrigin::LiveCapture);
    }

    #[test]
    fn test_portrait_frame_scales_to_long_side() {
        let frame = RawFrame::solid(900, 1800, [0, 0, 0, 255]);
        let image = normalize(&frame, ImageOrigin::UploadedFile, MAX_DIMENSION).unwrap();
        assert_eq!((image.width, image.height), (400, 800));
    }

    #[test]
    fn test_small_sources_are_never_upscaled() {
        let frame = RawFrame::solid(400, 300, [10, 20, 30, 255]);
        let image = normalize(&frame, ImageOrigin::LiveCapture, MAX_DIMENSION).unwrap();
        assert_eq!((image.width, image.height), (400, 300));
    }

    #[test]
    fn test_zero_dimension_source_yields_none() {
        let empty = RawFrame {
            width: 0,
            height: 720,
            rgba: Vec::new(),
        };
        assert!(normalize(&empty, ImageOrigin::LiveCapture, MAX_DIMENSION).is_none());

        let empty = RawFrame {
            width: 1280,
            height: 0,
            rgba: Vec::new(),
        };
        assert!(normalize(&empty, ImageOrigin::LiveCapture, MAX_DIMENSION).is_none());
    }

    #[test]
    fn test_transparency_flattens_to_white() {
        // Fully transparent source: every encoded pixel must come out near
        // white, not black
        let frame = RawFrame::solid(64, 64, [0, 0, 0, 0]);
        let image = normalize(&frame, ImageOrigin::UploadedFile, MAX_DIMENSION).unwrap();

        let decoded = image::load_from_memory(image.as_bytes()).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(32, 32);
        assert!(
            pixel.0.iter().all(|&c| c >= 240),
            "expected near-white pixel, got {:?}",
            pixel
        );
    }

    #[test]
    fn test_output_is_jpeg() {
        let frame = RawFrame::solid(100, 100, [200, 10, 10, 255]);
        let image = normalize(&frame, ImageOrigin::LiveCapture, MAX_DIMENSION).unwrap();
        // JPEG magic bytes
        assert_eq!(&image.as_bytes()[..2], &[0xFF, 0xD8]);
    }

    proptest! {
        #[test]
        fn prop_scaled_dimensions_bounded(width in 1u32..4000, height in 1u32..4000) {
            let (w, h) = scaled_dimensions(width, height, MAX_DIMENSION);

            // Never exceeds the cap on its long side, never exceeds the source
            prop_assert!(w.max(h) <= MAX_DIMENSION);
            prop_assert!(w <= width && h <= height);
            prop_assert!(w >= 1 && h >= 1);
        }

        #[test]
        fn prop_aspect_ratio_preserved_within_rounding(width in 1u32..4000, height in 1u32..4000) {
            let (w, h) = scaled_dimensions(width, height, MAX_DIMENSION);

            // Cross-multiplied ratio error stays within half a pixel of rounding
            let error = (w as f64 * height as f64 - h as f64 * width as f64).abs();
            prop_assert!(error <= width.max(height) as f64 / 2.0 + 1.0);
        }
    }
}
