//! Linear barcode rendering with the barcoders crate.
//!
//! Numeric symbologies accept their data with or without the trailing GS1
//! check digit; when present it must be correct.
//!
//! | Format | Digits (without check) | Symbol |
//! |--------|------------------------|--------|
//! | EAN13 | 12 | EAN-13 |
//! | EAN8 | 7 | EAN-8 |
//! | UPC | 11 | UPC-A (EAN-13 with a leading 0) |
//! | ITF14 | 13 | Interleaved 2 of 5, 14 digits |

use barcoders::sym::code39::Code39;
use barcoders::sym::code128::Code128;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;
use image::RgbaImage;
use tracing::debug;

use super::{Encoder, checked_canvas, encode_png, font};
use crate::data_url::DataUrl;
use crate::error::{QrForgeError, Result};
use crate::options::{BarcodeFormat, BarcodeOptions, parse_hex_color};

const ENCODE_FAILED: &str = "Failed to generate barcode";

/// Gap between bars and caption, in pixels.
const TEXT_MARGIN: u32 = 2;

/// Renders payloads as 1D barcodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarcodeEncoder;

/// Encoded modules plus the text printed under them.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// One entry per module, 1 = bar
    pub modules: Vec<u8>,
    pub text: String,
}

impl BarcodeEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `data` to modules for `format`.
    pub fn symbol(&self, data: &str, format: BarcodeFormat) -> std::result::Result<Symbol, String> {
        if data.is_empty() {
            return Err("data is empty".into());
        }
        let err = |e| symbology_error(format, e);

        match format {
            BarcodeFormat::Code128 => {
                // Character set B covers printable ASCII
                let code = Code128::new(format!("\u{0181}{}", data)).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: data.to_string(),
                })
            }
            BarcodeFormat::Code39 => {
                let upper = data.to_uppercase();
                let code = Code39::new(&upper).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: upper,
                })
            }
            BarcodeFormat::Ean13 => {
                let body = gs1_body(data, 12)?;
                let code = EAN13::new(&body).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: with_check_digit(&body),
                })
            }
            BarcodeFormat::Ean8 => {
                let body = gs1_body(data, 7)?;
                let code = EAN8::new(&body).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: with_check_digit(&body),
                })
            }
            BarcodeFormat::Upc => {
                let body = gs1_body(data, 11)?;
                let code = EAN13::new(format!("0{}", body)).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: with_check_digit(&body),
                })
            }
            BarcodeFormat::Itf14 => {
                let body = gs1_body(data, 13)?;
                let full = with_check_digit(&body);
                let code = TF::interleaved(&full).map_err(err)?;
                Ok(Symbol {
                    modules: code.encode(),
                    text: full,
                })
            }
        }
    }

    pub(crate) fn render_image(
        &self,
        data: &str,
        options: &BarcodeOptions,
    ) -> std::result::Result<RgbaImage, String> {
        let symbol = self.symbol(data, options.format)?;
        let fg = parse_hex_color(&options.foreground_color).map_err(|e| e.to_string())?;
        let bg = parse_hex_color(&options.background_color).map_err(|e| e.to_string())?;

        // Sized in u64 so oversized options fail the canvas check, not overflow
        let module_width = u64::from(options.width.max(1));
        let bar_height = u64::from(options.height.max(1));
        let margin = u64::from(options.margin);
        let bars_width = symbol.modules.len() as u64 * module_width;

        let (text_block, text_width) = if options.display_value {
            (
                u64::from(TEXT_MARGIN) + u64::from(options.font_size),
                font::text_width(&symbol.text, options.font_size),
            )
        } else {
            (0, 0)
        };

        let content_width = bars_width.max(text_width);
        let (width, height) =
            checked_canvas(content_width + 2 * margin, bar_height + text_block + 2 * margin)?;

        // Every term is bounded by the canvas now
        let module_width = module_width as u32;
        let bar_height = bar_height as u32;
        let margin = margin as u32;
        let bars_width = bars_width as u32;
        let content_width = content_width as u32;
        let text_width = text_width as u32;

        let mut img = RgbaImage::from_pixel(width, height, bg);
        let bars_x = margin + (content_width - bars_width) / 2;

        for (i, &module) in symbol.modules.iter().enumerate() {
            if module != 1 {
                continue;
            }
            let x0 = bars_x + i as u32 * module_width;
            for x in x0..x0 + module_width {
                for y in margin..margin + bar_height {
                    img.put_pixel(x, y, fg);
                }
            }
        }

        if options.display_value {
            let text_x = margin + (content_width - text_width) / 2;
            let text_y = margin + bar_height + TEXT_MARGIN;
            font::draw_text(
                &mut img,
                &symbol.text,
                text_x as i64,
                text_y as i64,
                options.font_size,
                fg,
            )?;
        }

        Ok(img)
    }
}

impl Encoder for BarcodeEncoder {
    type Options = BarcodeOptions;

    fn encode(&self, payload: &str, options: &BarcodeOptions) -> Result<DataUrl> {
        self.render_image(payload, options)
            .and_then(|img| encode_png(&img).map_err(|e| e.to_string()))
            .map(DataUrl::png)
            .map_err(|cause| {
                debug!(%cause, "barcode encode failed");
                QrForgeError::Encode(ENCODE_FAILED.into())
            })
    }
}

fn symbology_error(format: BarcodeFormat, e: impl std::fmt::Debug) -> String {
    format!("{:?} encoding failed: {:?}", format, e)
}

/// GS1 mod-10 check digit for `body` (weights 3,1,3,… from the right).
pub fn gs1_check_digit(body: &str) -> u8 {
    let sum: u32 = body
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 0 { d * 3 } else { d }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn with_check_digit(body: &str) -> String {
    format!("{}{}", body, gs1_check_digit(body))
}

/// Strip and verify an optional check digit, leaving `len` body digits.
fn gs1_body(data: &str, len: usize) -> std::result::Result<String, String> {
    let data = data.trim();
    if !data.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' must contain digits only", data));
    }
    if data.len() == len {
        return Ok(data.to_string());
    }
    if data.len() == len + 1 {
        let (body, check) = data.split_at(len);
        let expected = gs1_check_digit(body);
        if check.as_bytes()[0] - b'0' == expected {
            return Ok(body.to_string());
        }
        return Err(format!("invalid check digit, expected {}", expected));
    }
    Err(format!("expected {} or {} digits, got {}", len, len + 1, data.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BarcodeOptionsPatch;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn opts(format: BarcodeFormat) -> BarcodeOptions {
        BarcodeOptionsPatch {
            format: Some(format),
            ..Default::default()
        }
        .resolve()
    }

    #[test]
    fn test_gs1_check_digits() {
        assert_eq!(gs1_check_digit("400638133393"), 1); // EAN-13 4006381333931
        assert_eq!(gs1_check_digit("9638507"), 4); // EAN-8 96385074
        assert_eq!(gs1_check_digit("03600029145"), 2); // UPC-A 036000291452
        assert_eq!(gs1_check_digit("1234567890123"), 1); // ITF-14 12345678901231
    }

    #[test]
    fn test_ean13_with_and_without_check() {
        let a = BarcodeEncoder.symbol("400638133393", BarcodeFormat::Ean13).unwrap();
        let b = BarcodeEncoder.symbol("4006381333931", BarcodeFormat::Ean13).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text, "4006381333931");
        // 3 + 42 + 5 + 42 + 3 modules
        assert_eq!(a.modules.len(), 95);
    }

    #[test]
    fn test_ean13_bad_check_digit() {
        assert!(BarcodeEncoder.symbol("4006381333930", BarcodeFormat::Ean13).is_err());
    }

    #[test]
    fn test_upc_is_ean13_with_leading_zero() {
        let upc = BarcodeEncoder.symbol("03600029145", BarcodeFormat::Upc).unwrap();
        let ean = BarcodeEncoder.symbol("003600029145", BarcodeFormat::Ean13).unwrap();
        assert_eq!(upc.modules, ean.modules);
        assert_eq!(upc.text, "036000291452");
    }

    #[test]
    fn test_ean8() {
        let sym = BarcodeEncoder.symbol("9638507", BarcodeFormat::Ean8).unwrap();
        assert_eq!(sym.text, "96385074");
        assert_eq!(sym.modules.len(), 67);
    }

    #[test]
    fn test_itf14_appends_check_digit() {
        let sym = BarcodeEncoder.symbol("1234567890123", BarcodeFormat::Itf14).unwrap();
        assert_eq!(sym.text, "12345678901231");
        assert!(sym.modules.iter().any(|&m| m == 1));
    }

    #[test]
    fn test_numeric_formats_reject_letters() {
        for format in [
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::Upc,
            BarcodeFormat::Itf14,
        ] {
            assert!(BarcodeEncoder.symbol("ABC", format).is_err(), "{:?}", format);
        }
    }

    #[test]
    fn test_code39_uppercases() {
        let sym = BarcodeEncoder.symbol("hello-1", BarcodeFormat::Code39).unwrap();
        assert_eq!(sym.text, "HELLO-1");
    }

    #[test]
    fn test_code128_image_geometry() {
        let options = BarcodeOptions {
            display_value: false,
            ..opts(BarcodeFormat::Code128)
        };
        let sym = BarcodeEncoder.symbol("Hello", BarcodeFormat::Code128).unwrap();
        let img = BarcodeEncoder.render_image("Hello", &options).unwrap();
        assert_eq!(img.width(), sym.modules.len() as u32 * 2 + 20);
        assert_eq!(img.height(), 100 + 20);
        // margin stays background
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_display_value_adds_caption_row() {
        let img = BarcodeEncoder.render_image("Hello", &opts(BarcodeFormat::Code128)).unwrap();
        assert_eq!(img.height(), 100 + TEXT_MARGIN + 16 + 20);
        let caption_has_ink = (0..img.width())
            .flat_map(|x| (112..128).map(move |y| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) == Rgba([0, 0, 0, 255]));
        assert!(caption_has_ink);
    }

    #[test]
    fn test_encode_failure_is_generic() {
        let err = BarcodeEncoder
            .encode("not digits", &opts(BarcodeFormat::Ean13))
            .unwrap_err();
        assert_eq!(err.to_string(), ENCODE_FAILED);
    }

    #[test]
    fn test_oversized_options_are_generic_errors() {
        let base = opts(BarcodeFormat::Code128);
        let cases = [
            BarcodeOptions {
                width: u32::MAX,
                ..base.clone()
            },
            BarcodeOptions {
                height: u32::MAX,
                ..base.clone()
            },
            BarcodeOptions {
                margin: u32::MAX,
                ..base.clone()
            },
            BarcodeOptions {
                font_size: u32::MAX,
                ..base.clone()
            },
            BarcodeOptions {
                width: 400,
                height: 5000,
                ..base.clone()
            },
        ];
        for options in cases {
            let err = BarcodeEncoder.encode("Hello", &options).unwrap_err();
            assert_eq!(err.to_string(), ENCODE_FAILED, "{:?}", options);
        }
    }

    #[test]
    fn test_hidden_value_ignores_font_size() {
        let options = BarcodeOptions {
            display_value: false,
            font_size: u32::MAX,
            ..opts(BarcodeFormat::Code128)
        };
        assert!(BarcodeEncoder.encode("Hello", &options).is_ok());
    }
}
