//! Photo ingestion: image file → downsampled JPEG data URL.
//!
//! The stored document embeds the background photo inline, so the image is
//! shrunk before it is saved:
//!
//! 1. decode whatever format the file holds (JPEG, PNG, GIF, WebP, BMP);
//! 2. if wider than `max_width`, scale to that width keeping the aspect
//!    ratio, with `h = round(max_width / (w / h))`;
//! 3. re-encode as JPEG at `quality` and wrap as
//!    `data:image/jpeg;base64,...`.
//!
//! Decoding and encoding are CPU-bound, so [`JpegDataUrlIngestor`] runs them
//! on the blocking thread pool.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::application::edit_settings::{IngestError, PhotoIngestor};

/// Default maximum width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1_800;

/// Default JPEG quality (1–100).
pub const DEFAULT_JPEG_QUALITY: u8 = 78;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Ingests photos as downsampled JPEG data URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegDataUrlIngestor {
    max_width: u32,
    quality: u8,
}

impl Default for JpegDataUrlIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_JPEG_QUALITY)
    }
}

impl JpegDataUrlIngestor {
    /// `quality` is clamped to 1–100 and `max_width` to at least 1.
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }
}

#[async_trait]
impl PhotoIngestor for JpegDataUrlIngestor {
    async fn ingest(&self, path: &Path) -> Result<String, IngestError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let (max_width, quality) = (self.max_width, self.quality);
        tokio::task::spawn_blocking(move || compress_to_data_url(&bytes, max_width, quality))
            .await
            .map_err(|e| IngestError::Worker(e.to_string()))?
    }
}

/// Output size for an image of `width × height` capped at `max_width`.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || height == 0 {
        return (width, height);
    }
    let ratio = f64::from(width) / f64::from(height);
    let scaled_height = (f64::from(max_width) / ratio).round().max(1.0) as u32;
    (max_width, scaled_height)
}

/// Decodes `bytes`, downsamples, and re-encodes as a JPEG data URL.
///
/// # Errors
///
/// Returns [`IngestError::Decode`] if `bytes` is not a supported image and
/// [`IngestError::Encode`] if JPEG encoding fails.
pub fn compress_to_data_url(bytes: &[u8], max_width: u32, quality: u8) -> Result<String, IngestError> {
    let img = image::load_from_memory(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;
    let (w, h) = img.dimensions();
    let (tw, th) = target_dimensions(w, h, max_width);

    let resized = if (tw, th) == (w, h) {
        img
    } else {
        img.resize_exact(tw, th, FilterType::Triangle)
    };

    let jpeg = encode_jpeg(&resized, quality)?;
    debug!(
        "photo re-encoded: {w}x{h} → {tw}x{th}, {} bytes (quality {quality})",
        jpeg.len()
    );

    let mut out = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    out.push_str(DATA_URL_PREFIX);
    B64.encode_string(&jpeg, &mut out);
    Ok(out)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, IngestError> {
    // JPEG has no alpha channel; transparent pixels flatten to their RGB.
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| IngestError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use uuid::Uuid;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn decode_data_url(url: &str) -> DynamicImage {
        let payload = url.strip_prefix(DATA_URL_PREFIX).expect("jpeg data URL");
        let bytes = B64.decode(payload).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap()
    }

    #[test]
    fn test_target_dimensions_keeps_small_images() {
        assert_eq!(target_dimensions(1_200, 800, 1_800), (1_200, 800));
        assert_eq!(target_dimensions(1_800, 900, 1_800), (1_800, 900));
    }

    #[test]
    fn test_target_dimensions_scales_wide_images() {
        assert_eq!(target_dimensions(4_000, 3_000, 1_800), (1_800, 1_350));
        // 1800 / (3001 / 2000) = 1199.6 → 1200
        assert_eq!(target_dimensions(3_001, 2_000, 1_800), (1_800, 1_200));
    }

    #[test]
    fn test_target_dimensions_never_collapses_height() {
        assert_eq!(target_dimensions(10_000, 1, 1_800), (1_800, 1));
    }

    #[test]
    fn test_compress_downsamples_and_wraps_as_jpeg_data_url() {
        // Arrange
        let png = png_bytes(400, 100);

        // Act
        let url = compress_to_data_url(&png, 200, DEFAULT_JPEG_QUALITY).unwrap();

        // Assert
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_data_url(&url).dimensions(), (200, 50));
    }

    #[test]
    fn test_compress_keeps_size_under_limit() {
        let url = compress_to_data_url(&png_bytes(64, 48), 1_800, 78).unwrap();
        assert_eq!(decode_data_url(&url).dimensions(), (64, 48));
    }

    #[test]
    fn test_compress_rejects_non_images() {
        let result = compress_to_data_url(b"definitely not an image", 1_800, 78);
        assert!(matches!(result, Err(IngestError::Decode(_))));
    }

    #[test]
    fn test_new_clamps_parameters() {
        assert_eq!(JpegDataUrlIngestor::new(0, 0), JpegDataUrlIngestor::new(1, 1));
        assert_eq!(JpegDataUrlIngestor::new(10, 255).quality, 100);
    }

    #[tokio::test]
    async fn test_ingest_reads_file_from_disk() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("oyster_img_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("photo.png");
        std::fs::write(&path, png_bytes(300, 200)).unwrap();
        let ingestor = JpegDataUrlIngestor::new(150, 78);

        // Act
        let url = ingestor.ingest(&path).await.unwrap();

        // Assert
        assert_eq!(decode_data_url(&url).dimensions(), (150, 100));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_ingest_of_missing_file_is_read_error() {
        let ingestor = JpegDataUrlIngestor::default();

        let result = ingestor.ingest(Path::new("/nonexistent/oyster/photo.jpg")).await;

        assert!(matches!(result, Err(IngestError::Read { .. })));
    }
}
