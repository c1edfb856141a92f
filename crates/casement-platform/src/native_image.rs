//! Native image value type.
//!
//! An image is RGBA8 pixels plus a scale factor. It has no identity beyond
//! its bytes: two images with equal pixels and scale compare equal.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use casement_common::{PlatformError, Rect};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// Options for [`NativeImage::from_buffer`]. Width and height are only
/// consulted when the buffer is raw RGBA rather than an encoded image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BufferOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale_factor: Option<f64>,
}

#[derive(Clone, PartialEq)]
pub struct NativeImage {
    width: u32,
    height: u32,
    scale_factor: f64,
    rgba: Vec<u8>,
}

impl fmt::Debug for NativeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale_factor", &self.scale_factor)
            .finish_non_exhaustive()
    }
}

impl Default for NativeImage {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl NativeImage {
    pub fn create_empty() -> Self {
        Self {
            width: 0,
            height: 0,
            scale_factor: 1.0,
            rgba: Vec::new(),
        }
    }

    /// Decode a PNG or JPEG file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .map_err(|e| PlatformError::ImageError(format!("{}: {e}", path.display())))?;
        Ok(Self::from_dynamic(decoded, 1.0))
    }

    /// Wrap raw RGBA8 pixels. The buffer length must be `width * height * 4`.
    pub fn from_bitmap(
        buffer: &[u8],
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> Result<Self, PlatformError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| PlatformError::ImageError("bitmap dimensions overflow".into()))?;
        if buffer.len() != expected {
            return Err(PlatformError::ImageError(format!(
                "bitmap of {width}x{height} needs {expected} bytes, got {}",
                buffer.len()
            )));
        }
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(PlatformError::ImageError(format!(
                "invalid scale factor {scale_factor}"
            )));
        }
        Ok(Self {
            width,
            height,
            scale_factor,
            rgba: buffer.to_vec(),
        })
    }

    /// A `width` x `height` image filled with one RGBA colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            scale_factor: 1.0,
            rgba: rgba.repeat(pixels),
        }
    }

    /// Decode an encoded buffer (PNG/JPEG). If the bytes are not a known
    /// image format and both dimensions are given, they are taken as raw
    /// RGBA pixels instead.
    pub fn from_buffer(buffer: &[u8], options: BufferOptions) -> Result<Self, PlatformError> {
        let scale = options.scale_factor.unwrap_or(1.0);
        if buffer.is_empty() {
            return Ok(Self::create_empty());
        }
        match image::load_from_memory(buffer) {
            Ok(decoded) => Ok(Self::from_dynamic(decoded, scale)),
            Err(decode_err) => match (options.width, options.height) {
                (Some(w), Some(h)) => Self::from_bitmap(buffer, w, h, scale),
                _ => Err(PlatformError::ImageError(decode_err.to_string())),
            },
        }
    }

    /// Decode a `data:image/...;base64,...` URL.
    pub fn from_data_url(url: &str) -> Result<Self, PlatformError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| PlatformError::ImageError("not a data URL".into()))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| PlatformError::ImageError("data URL has no payload".into()))?;
        if !meta.starts_with("image/") || !meta.ends_with(";base64") {
            return Err(PlatformError::ImageError(format!(
                "unsupported data URL type {meta:?}"
            )));
        }
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| PlatformError::ImageError(format!("bad base64 payload: {e}")))?;
        Self::from_buffer(&bytes, BufferOptions::default())
    }

    fn from_dynamic(decoded: DynamicImage, scale_factor: f64) -> Self {
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            scale_factor,
            rgba: rgba.into_raw(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn to_bitmap(&self) -> &[u8] {
        &self.rgba
    }

    /// Lossless PNG encoding. Empty images encode to an empty buffer.
    pub fn to_png(&self) -> Result<Vec<u8>, PlatformError> {
        let Some(img) = self.as_rgba_image() else {
            return Ok(Vec::new());
        };
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| PlatformError::ImageError(format!("png encode: {e}")))?;
        Ok(out.into_inner())
    }

    /// JPEG encoding at `quality` (1-100). Alpha is discarded.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, PlatformError> {
        let Some(img) = self.as_rgba_image() else {
            return Ok(Vec::new());
        };
        let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| PlatformError::ImageError(format!("jpeg encode: {e}")))?;
        Ok(out)
    }

    pub fn to_data_url(&self) -> Result<String, PlatformError> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    /// The part of the image inside `rect`, clipped to the image bounds.
    /// A rect entirely outside the image yields an empty image.
    pub fn crop(&self, rect: Rect) -> NativeImage {
        let full = Rect::new(0, 0, self.width as i32, self.height as i32);
        let Some(area) = full.intersect(&rect) else {
            return Self::create_empty();
        };
        let (x, y, w, h) = (
            area.x as usize,
            area.y as usize,
            area.width as usize,
            area.height as usize,
        );
        let stride = self.width as usize * 4;
        let mut rgba = Vec::with_capacity(w * h * 4);
        for row in y..y + h {
            let start = row * stride + x * 4;
            rgba.extend_from_slice(&self.rgba[start..start + w * 4]);
        }
        Self {
            width: w as u32,
            height: h as u32,
            scale_factor: self.scale_factor,
            rgba,
        }
    }

    fn as_rgba_image(&self) -> Option<RgbaImage> {
        if self.is_empty() {
            return None;
        }
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> NativeImage {
        let mut buf = Vec::new();
        for y in 0..height {
            for x in 0..width {
                buf.extend_from_slice(&[(x * 40) as u8, (y * 60) as u8, 128, 255 - x as u8]);
            }
        }
        NativeImage::from_bitmap(&buf, width, height, 1.0).unwrap()
    }

    #[test]
    fn empty_image_is_empty() {
        let img = NativeImage::create_empty();
        assert!(img.is_empty());
        assert_eq!(img.size(), (0, 0));
        assert!(img.to_png().unwrap().is_empty());
    }

    #[test]
    fn png_round_trip_is_pixel_identical() {
        let original = gradient(5, 4);
        let png = original.to_png().unwrap();
        let decoded = NativeImage::from_buffer(&png, BufferOptions::default()).unwrap();
        assert_eq!(decoded.size(), (5, 4));
        assert_eq!(decoded.to_bitmap(), original.to_bitmap());

        let again = decoded.to_png().unwrap();
        let decoded_again = NativeImage::from_buffer(&again, BufferOptions::default()).unwrap();
        assert_eq!(decoded_again, decoded);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let original = NativeImage::filled(16, 8, [200, 10, 10, 255]);
        let jpeg = original.to_jpeg(80).unwrap();
        assert!(!jpeg.is_empty());
        let decoded = NativeImage::from_buffer(&jpeg, BufferOptions::default()).unwrap();
        assert_eq!(decoded.size(), (16, 8));
        assert!(!decoded.is_empty());
    }

    #[test]
    fn bitmap_with_wrong_length_is_rejected() {
        let err = NativeImage::from_bitmap(&[0; 10], 2, 2, 1.0).unwrap_err();
        assert!(matches!(err, PlatformError::ImageError(_)));
    }

    #[test]
    fn raw_buffer_with_dimensions_falls_back_to_bitmap() {
        let raw = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let opts = BufferOptions {
            width: Some(2),
            height: Some(1),
            scale_factor: Some(2.0),
        };
        let img = NativeImage::from_buffer(&raw, opts).unwrap();
        assert_eq!(img.size(), (2, 1));
        assert_eq!(img.scale_factor(), 2.0);
        assert_eq!(img.to_bitmap(), &raw);
    }

    #[test]
    fn garbage_without_dimensions_is_an_error() {
        assert!(NativeImage::from_buffer(b"not an image", BufferOptions::default()).is_err());
    }

    #[test]
    fn data_url_round_trip() {
        let original = gradient(3, 3);
        let url = original.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let decoded = NativeImage::from_data_url(&url).unwrap();
        assert_eq!(decoded.to_bitmap(), original.to_bitmap());
    }

    #[test]
    fn data_url_rejects_other_types() {
        assert!(NativeImage::from_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(NativeImage::from_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn from_path_reads_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let original = gradient(4, 2);
        std::fs::write(&path, original.to_png().unwrap()).unwrap();

        let loaded = NativeImage::from_path(&path).unwrap();
        assert_eq!(loaded.to_bitmap(), original.to_bitmap());
    }

    #[test]
    fn from_missing_path_is_an_error() {
        assert!(NativeImage::from_path("/nonexistent/casement.png").is_err());
    }

    #[test]
    fn crop_clips_to_image() {
        let img = gradient(4, 4);
        let cropped = img.crop(Rect::new(2, 1, 10, 2));
        assert_eq!(cropped.size(), (2, 2));
        assert_eq!(&cropped.to_bitmap()[0..4], &img.to_bitmap()[(4 + 2) * 4..(4 + 2) * 4 + 4]);

        assert!(img.crop(Rect::new(10, 10, 5, 5)).is_empty());
    }
}
