//! QR code rendering: raster, SVG, and centred logo overlay.

use image::{Rgba, RgbaImage, imageops::FilterType};
use qrcode::{Color, QrCode, render::svg};
use tracing::debug;

use super::{Encoder, MAX_DIMENSION, checked_canvas, encode_png};
use crate::data_url::DataUrl;
use crate::error::{QrForgeError, Result};
use crate::options::{QrOptions, parse_hex_color};

const ENCODE_FAILED: &str = "Failed to generate QR code";
const SVG_FAILED: &str = "Failed to generate QR code as SVG";

/// Logo backing square colour.
const LOGO_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Renders payloads as QR codes with the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl QrEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Render to an RGBA bitmap (logo included).
    ///
    /// The image is `max(width, modules + 2*margin)` pixels square; each
    /// output pixel samples the module under it, so module edges may differ
    /// by one pixel when the width is not a multiple of the module count.
    pub(crate) fn render_image(
        &self,
        payload: &str,
        options: &QrOptions,
    ) -> std::result::Result<RgbaImage, String> {
        if payload.is_empty() {
            return Err("payload is empty".into());
        }
        let code = build_code(payload, options)?;
        let dark = parse_hex_color(&options.dark_color).map_err(|e| e.to_string())?;
        let light = parse_hex_color(&options.light_color).map_err(|e| e.to_string())?;

        let modules = code.width();
        let total = modules as u64 + 2 * u64::from(options.margin);
        let side = u64::from(options.width).max(total);
        let (size, _) = checked_canvas(side, side)?;
        let size = size as usize;
        let total = total as usize;
        let margin = options.margin as usize;

        let mut img = RgbaImage::from_pixel(size as u32, size as u32, light);
        for py in 0..size {
            let my = py * total / size;
            if my < margin || my >= margin + modules {
                continue;
            }
            for px in 0..size {
                let mx = px * total / size;
                if mx < margin || mx >= margin + modules {
                    continue;
                }
                if code[(mx - margin, my - margin)] == Color::Dark {
                    img.put_pixel(px as u32, py as u32, dark);
                }
            }
        }

        if let Some(logo) = &options.logo {
            overlay_logo(&mut img, logo, options.logo_size, options.logo_margin)?;
        }

        Ok(img)
    }

    /// Render as SVG markup wrapped in a base64 data URL.
    ///
    /// The SVG renderer uses the standard four-module quiet zone whenever
    /// `margin` is non-zero. Logos are not applied to vector output.
    pub fn encode_svg(&self, payload: &str, options: &QrOptions) -> Result<DataUrl> {
        self.try_svg(payload, options).map_err(|cause| {
            debug!(%cause, "QR SVG encode failed");
            QrForgeError::Encode(SVG_FAILED.into())
        })
    }

    fn try_svg(&self, payload: &str, options: &QrOptions) -> std::result::Result<DataUrl, String> {
        if payload.is_empty() {
            return Err("payload is empty".into());
        }
        if options.width > MAX_DIMENSION {
            return Err(format!("width {} exceeds {} px", options.width, MAX_DIMENSION));
        }
        // Validate colours before they land in markup
        parse_hex_color(&options.dark_color).map_err(|e| e.to_string())?;
        parse_hex_color(&options.light_color).map_err(|e| e.to_string())?;

        let code = build_code(payload, options)?;
        let markup = code
            .render::<svg::Color<'_>>()
            .min_dimensions(options.width, options.width)
            .dark_color(svg::Color(&options.dark_color))
            .light_color(svg::Color(&options.light_color))
            .quiet_zone(options.margin > 0)
            .build();
        Ok(DataUrl::svg(markup))
    }
}

impl Encoder for QrEncoder {
    type Options = QrOptions;

    fn encode(&self, payload: &str, options: &QrOptions) -> Result<DataUrl> {
        self.render_image(payload, options)
            .and_then(|img| encode_png(&img).map_err(|e| e.to_string()))
            .map(DataUrl::png)
            .map_err(|cause| {
                debug!(%cause, "QR encode failed");
                QrForgeError::Encode(ENCODE_FAILED.into())
            })
    }
}

fn build_code(payload: &str, options: &QrOptions) -> std::result::Result<QrCode, String> {
    QrCode::with_error_correction_level(payload.as_bytes(), options.error_correction_level.into())
        .map_err(|e| format!("QR code generation failed: {}", e))
}

/// Centre a white square of side `size + 2*margin` on the code, then draw the
/// logo resized to `size`×`size` inside it.
fn overlay_logo(
    img: &mut RgbaImage,
    logo_url: &str,
    size: u32,
    margin: u32,
) -> std::result::Result<(), String> {
    let (width, height) = img.dimensions();
    if size > width.min(height) {
        return Err(format!("logo of {} px does not fit a {} px code", size, width));
    }
    let logo = DataUrl::parse(logo_url).map_err(|e| format!("Failed to load logo: {}", e))?;
    let logo = image::load_from_memory(&logo.bytes)
        .map_err(|e| format!("Failed to load logo: {}", e))?
        .resize_exact(size, size, FilterType::Lanczos3)
        .to_rgba8();

    let x = (width as i64 - size as i64) / 2;
    let y = (height as i64 - size as i64) / 2;
    let pad = margin as i64;

    let x0 = (x - pad).max(0);
    let y0 = (y - pad).max(0);
    let x1 = (x + size as i64 + pad).min(width as i64);
    let y1 = (y + size as i64 + pad).min(height as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px as u32, py as u32, LOGO_BACKGROUND);
        }
    }

    image::imageops::overlay(img, &logo, x, y);
    Ok(())
}
