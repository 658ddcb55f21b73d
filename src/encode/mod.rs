//! # Encoders
//!
//! Turn a payload string plus visual options into a rendered image.
//!
//! Both paths share one contract: the caller passes fully resolved options
//! (see [`crate::options`] for the patch-over-defaults merge) and gets back a
//! PNG [`DataUrl`], or a single generic [`QrForgeError::Encode`]. Nothing
//! partial is ever returned.
//!
//! ## Example
//!
//! ```
//! use qrforge::encode::{Encoder, QrEncoder};
//! use qrforge::options::QrOptionsPatch;
//!
//! let options = QrOptionsPatch { width: Some(256), ..Default::default() }.resolve();
//! let image = QrEncoder.encode("https://example.com", &options)?;
//! assert!(image.to_string().starts_with("data:image/png;base64,"));
//! # Ok::<(), qrforge::QrForgeError>(())
//! ```

mod barcode;
mod font;
mod qr;

pub use barcode::{BarcodeEncoder, Symbol, gs1_check_digit};
pub use qr::QrEncoder;

use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::data_url::DataUrl;
use crate::error::Result;
use crate::options::{CodeKind, OptionsPatch};

/// Renders a payload string into an image.
pub trait Encoder {
    type Options;

    fn encode(&self, payload: &str, options: &Self::Options) -> Result<DataUrl>;
}

/// Encode `payload` as `kind`, merging `options` over that kind's defaults.
///
/// A patch of the other kind that only sets shared fields (`width`,
/// `margin`) is applied as this kind; any other is a validation error.
pub fn encode_code(kind: CodeKind, payload: &str, options: Option<&OptionsPatch>) -> Result<DataUrl> {
    let patch = match options {
        Some(patch) => {
            patch.check_kind(kind)?;
            patch.clone().normalized(kind)
        }
        None => OptionsPatch::empty(kind),
    };

    match patch {
        OptionsPatch::Qr(patch) => QrEncoder.encode(payload, &patch.resolve()),
        OptionsPatch::Barcode(patch) => BarcodeEncoder.encode(payload, &patch.resolve()),
    }
}

/// Longest side of a rendered image, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

/// Most pixels in one rendered image (4096 × 4096).
pub const MAX_PIXELS: u64 = 4096 * 4096;

/// Check a canvas computed from caller options before allocating it.
pub(crate) fn checked_canvas(width: u64, height: u64) -> std::result::Result<(u32, u32), String> {
    let limit = u64::from(MAX_DIMENSION);
    if width == 0 || height == 0 || width > limit || height > limit {
        return Err(format!(
            "image of {}x{} px is outside 1..={} per side",
            width, height, MAX_DIMENSION
        ));
    }
    if width * height > MAX_PIXELS {
        return Err(format!(
            "image of {}x{} px exceeds {} pixels",
            width, height, MAX_PIXELS
        ));
    }
    Ok((width as u32, height as u32))
}

/// PNG-encode an RGBA bitmap.
pub(crate) fn encode_png(img: &RgbaImage) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QrForgeError;
    use crate::options::{BarcodeFormat, BarcodeOptionsPatch, QrOptionsPatch};

    #[test]
    fn test_encode_code_dispatches_by_kind() {
        let qr = encode_code(CodeKind::Qr, "hello", None).unwrap();
        let bar = encode_code(CodeKind::Barcode, "hello", None).unwrap();
        assert_eq!(qr.mime, "image/png");
        assert_eq!(bar.mime, "image/png");
        assert_ne!(qr.bytes, bar.bytes);
    }

    #[test]
    fn test_empty_foreign_patch_is_ignored() {
        let empty_qr = OptionsPatch::Qr(QrOptionsPatch::default());
        assert!(encode_code(CodeKind::Barcode, "123", Some(&empty_qr)).is_ok());
    }

    #[test]
    fn test_mismatched_patch_rejected() {
        let barcode = OptionsPatch::Barcode(BarcodeOptionsPatch {
            format: Some(BarcodeFormat::Ean8),
            ..Default::default()
        });
        let err = encode_code(CodeKind::Qr, "x", Some(&barcode)).unwrap_err();
        assert!(matches!(err, QrForgeError::Validation(_)));
    }

    #[test]
    fn test_shared_width_applies_to_barcode() {
        let patch: OptionsPatch = serde_json::from_str(r#"{"width":3}"#).unwrap();
        let wide = encode_code(CodeKind::Barcode, "ABC", Some(&patch)).unwrap();
        let narrow = encode_code(CodeKind::Barcode, "ABC", None).unwrap();

        let wide = image::load_from_memory(&wide.bytes).unwrap();
        let narrow = image::load_from_memory(&narrow.bytes).unwrap();
        assert!(wide.width() > narrow.width());
    }

    #[test]
    fn test_checked_canvas_limits() {
        assert_eq!(checked_canvas(400, 400), Ok((400, 400)));
        assert!(checked_canvas(0, 10).is_err());
        assert!(checked_canvas(u64::from(MAX_DIMENSION) + 1, 10).is_err());
        assert!(checked_canvas(16_000, 16_000).is_err());
    }
}
