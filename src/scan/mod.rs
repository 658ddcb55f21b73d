//! # Scanner
//!
//! Decode QR codes from still images and from a stream of frames.
//!
//! Still images go through [`scan_image_bytes`] / [`scan_data_url`]; live
//! sources implement [`FrameSource`] and are driven by [`CameraScanner`].

mod camera;

pub use camera::{CameraScanner, FrameSource, ImageSequence, ScanSession, DEFAULT_FPS};

use image::DynamicImage;
use rqrr::PreparedImage;
use tracing::{debug, trace};

use crate::data_url::DataUrl;
use crate::error::{QrForgeError, Result};

const SCAN_FAILED: &str = "Failed to scan QR code from image";

/// Extracts a payload string from an image.
pub trait Decoder: Send + Sync {
    fn decode(&self, image: &DynamicImage) -> Result<String>;
}

/// QR decoder backed by `rqrr`. The first grid that decodes wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl Decoder for RqrrDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<String> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        let mut prepared = PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| luma.get_pixel(x as u32, y as u32)[0],
        );

        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), width, height, "detected grids");

        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(e) => trace!(error = %e, "grid failed to decode"),
            }
        }
        Err(QrForgeError::Decode("No QR code found".into()))
    }
}

/// Decode the first QR code in an encoded image (any format `image` reads).
pub fn scan_image_bytes(bytes: &[u8]) -> Result<String> {
    scan_with(&RqrrDecoder, bytes)
}

/// Decode the first QR code in a `data:` URL image.
pub fn scan_data_url(url: &str) -> Result<String> {
    let url = DataUrl::parse(url)?;
    scan_image_bytes(&url.bytes)
}

/// Like [`scan_image_bytes`] with a caller-chosen decoder.
pub fn scan_with(decoder: &dyn Decoder, bytes: &[u8]) -> Result<String> {
    let image = image::load_from_memory(bytes).map_err(|e| {
        debug!(error = %e, "scan input is not a readable image");
        QrForgeError::Decode(SCAN_FAILED.into())
    })?;
    decoder.decode(&image).map_err(|e| {
        debug!(error = %e, "scan failed");
        QrForgeError::Decode(SCAN_FAILED.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{Encoder, QrEncoder};
    use crate::options::QrOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_round_trip() {
        let url = QrEncoder.encode("scan me", &QrOptions::default()).unwrap();
        assert_eq!(scan_image_bytes(&url.bytes).unwrap(), "scan me");
        assert_eq!(scan_data_url(&url.to_string()).unwrap(), "scan me");
    }

    #[test]
    fn test_blank_image_is_generic_error() {
        let blank = image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]));
        let mut png = Vec::new();
        blank
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let err = scan_image_bytes(&png).unwrap_err();
        assert_eq!(err.to_string(), SCAN_FAILED);
    }

    #[test]
    fn test_garbage_bytes_is_generic_error() {
        let err = scan_image_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, QrForgeError::Decode(_)));
    }
}
