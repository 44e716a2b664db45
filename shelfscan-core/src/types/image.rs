//! Transient captured-image value produced by normalization

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Where a captured image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    LiveCapture,
    UploadedFile,
}

/// A normalized, JPEG-encoded cover image ready for transmission.
///
/// Transient: lives from normalization until the review step commits it as a
/// record's cover reference, or the user abandons the review screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    jpeg: Vec<u8>,
    pub origin: ImageOrigin,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    pub(crate) fn new(jpeg: Vec<u8>, origin: ImageOrigin, width: u32, height: u32) -> Self {
        Self {
            jpeg,
            origin,
            width,
            height,
        }
    }

    /// Raw JPEG bytes, no data-URI framing
    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    /// Base64 payload without any data-URI prefix, as transmitted to the
    /// analysis service
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.jpeg)
    }

    /// `data:image/jpeg;base64,...` form used as the stored cover reference
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }

    /// Parse a stored data URI back into an image, stripping the
    /// `data:...;base64,` prefix when present.
    pub fn from_data_uri(uri: &str, origin: ImageOrigin) -> Option<Self> {
        let payload = uri.split_once(',').map_or(uri, |(_, payload)| payload);
        let jpeg = BASE64.decode(payload.trim()).ok()?;
        let decoded = image::load_from_memory(&jpeg).ok()?;
        Some(Self {
            width: decoded.width(),
            height: decoded.height(),
            jpeg,
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest JPEG the decoder accepts: a 1x1 white pixel
    fn tiny_jpeg() -> Vec<u8> {
        let mut buf = Vec::new();
        let img = image::RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        image::codecs::jpeg::JpegEncoder::new(&mut buf)
            .encode_image(&img)
            .unwrap();
        buf
    }

    #[test]
    fn test_data_uri_round_trip() {
        let original = CapturedImage::new(tiny_jpeg(), ImageOrigin::UploadedFile, 1, 1);
        let uri = original.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let back = CapturedImage::from_data_uri(&uri, ImageOrigin::UploadedFile).unwrap();
        assert_eq!(back.as_bytes(), original.as_bytes());
        assert_eq!(back.width, 1);
        assert_eq!(back.height, 1);
    }

    #[test]
    fn test_from_data_uri_accepts_bare_payload() {
        let original = CapturedImage::new(tiny_jpeg(), ImageOrigin::LiveCapture, 1, 1);
        let bare = original.to_base64();
        let back = CapturedImage::from_data_uri(&bare, ImageOrigin::LiveCapture).unwrap();
        assert_eq!(back.as_bytes(), original.as_bytes());
    }

    #[test]
    fn test_from_data_uri_rejects_garbage() {
        assert!(CapturedImage::from_data_uri("data:image/jpeg;base64,!!!", ImageOrigin::UploadedFile).is_none());
    }
}
