//! Single-page PDF layout.
//!
//! ```text
//!  ┌──────────────────────────┐
//!  │     QR Code Generator    │  20 mm, 18 pt
//!  │        ┌────────┐        │  30 mm
//!  │        │  code  │        │  96 dpi, fit to (w-40) × (h-80) mm
//!  │        └────────┘        │
//!  │   Content: payload...    │  15 mm below image, 10 pt grey
//!  │                          │
//!  │  Generated on: <local>   │  10 mm from bottom, 8 pt
//!  └──────────────────────────┘
//! ```
//!
//! PDF coordinates grow upwards from the bottom-left corner; the layout is
//! expressed from the top and flipped when drawing.

use chrono::Local;
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rgb, image_crate,
};
use serde::{Deserialize, Serialize};

use crate::error::{QrForgeError, Result};
use crate::options::CodeKind;

/// Millimetres per CSS pixel (96 dpi).
pub const MM_PER_PX: f32 = 0.264583;

const TITLE_Y: f32 = 20.0;
const IMAGE_Y: f32 = 30.0;
const CAPTION_GAP: f32 = 15.0;
const FOOTER_FROM_BOTTOM: f32 = 10.0;
const SIDE_MARGIN: f32 = 40.0;
const VERTICAL_MARGIN: f32 = 80.0;

const TITLE_PT: f32 = 18.0;
const CAPTION_PT: f32 = 10.0;
const FOOTER_PT: f32 = 8.0;

/// Captions longer than this are cut and end in "...".
pub const CAPTION_MAX_CHARS: usize = 200;

const PT_TO_MM: f32 = 25.4 / 72.0;
/// Average Helvetica advance as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.15;

/// Portrait page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    A5,
}

impl PageSize {
    /// (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::A5 => (148.0, 210.0),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "a5" => Ok(PageSize::A5),
            other => Err(QrForgeError::Validation(format!(
                "Unknown page size '{}' (expected A4, Letter or A5)",
                other
            ))),
        }
    }
}

/// Where the image goes on the page, in millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit a `px_width`×`px_height` image inside the printable box, never
/// scaling up past its 96 dpi size.
pub fn place_image(px_width: u32, px_height: u32, page: PageSize) -> Placement {
    let (page_w, page_h) = page.dimensions_mm();
    let max_w = page_w - SIDE_MARGIN;
    let max_h = page_h - VERTICAL_MARGIN;

    let mut width = px_width as f32 * MM_PER_PX;
    let mut height = px_height as f32 * MM_PER_PX;

    if width > max_w {
        height = height * max_w / width;
        width = max_w;
    }
    if height > max_h {
        width = width * max_h / height;
        height = max_h;
    }

    Placement {
        x: (page_w - width) / 2.0,
        y: IMAGE_Y,
        width,
        height,
    }
}

/// `Content: <data>`, truncated to [`CAPTION_MAX_CHARS`] characters of data.
pub fn caption(data: &str) -> String {
    if data.chars().count() > CAPTION_MAX_CHARS {
        let cut: String = data.chars().take(CAPTION_MAX_CHARS).collect();
        format!("Content: {}...", cut)
    } else {
        format!("Content: {}", data)
    }
}

/// Greedy word wrap to `max_width_mm` at `font_pt`; words longer than a line
/// are split.
pub fn wrap_text(text: &str, max_width_mm: f32, font_pt: f32) -> Vec<String> {
    let max_chars = ((max_width_mm / glyph_width_mm(font_pt)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let mut word: Vec<char> = word.chars().collect();
            let line_len = line.chars().count();
            let sep = if line.is_empty() { 0 } else { 1 };

            if line_len + sep + word.len() <= max_chars {
                if sep == 1 {
                    line.push(' ');
                }
                line.extend(word);
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            while word.len() > max_chars {
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

fn glyph_width_mm(font_pt: f32) -> f32 {
    font_pt * AVG_GLYPH_EM * PT_TO_MM
}

fn text_width_mm(text: &str, font_pt: f32) -> f32 {
    text.chars().count() as f32 * glyph_width_mm(font_pt)
}

/// Lay out and serialize the page.
pub(crate) fn render(
    image: &DynamicImage,
    data: &str,
    kind: CodeKind,
    page: PageSize,
) -> std::result::Result<Vec<u8>, String> {
    let (page_w, page_h) = page.dimensions_mm();
    let title = format!("{} Generator", kind.label());

    let (doc, page_idx, layer_idx) = PdfDocument::new(&title, Mm(page_w), Mm(page_h), "Layer 1");
    let layer = doc.get_page(page_idx).get_layer(layer_idx);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| format!("Failed to load font: {}", e))?;

    // Title
    set_grey(&layer, 0.0);
    centred_text(&layer, &font, &title, TITLE_PT, page_w, page_h - TITLE_Y);

    // Image
    let placement = place_image(image.width(), image.height(), page);
    let rgb = super::flatten_on_white(image);
    let (px_w, px_h) = rgb.dimensions();
    let raster = image_crate::RgbImage::from_raw(px_w, px_h, rgb.into_raw())
        .ok_or("image buffer size mismatch")?;
    let pdf_image = Image::from_dynamic_image(&image_crate::DynamicImage::ImageRgb8(raster));

    let natural_w = px_w as f32 * MM_PER_PX;
    let natural_h = px_h as f32 * MM_PER_PX;
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placement.x)),
            translate_y: Some(Mm(page_h - placement.y - placement.height)),
            scale_x: Some(placement.width / natural_w),
            scale_y: Some(placement.height / natural_h),
            dpi: Some(96.0),
            ..Default::default()
        },
    );

    // Caption
    set_grey(&layer, 100.0 / 255.0);
    let line_height = CAPTION_PT * PT_TO_MM * LINE_SPACING;
    let caption_top = placement.y + placement.height + CAPTION_GAP;
    let lines = wrap_text(&caption(data), page_w - SIDE_MARGIN, CAPTION_PT);
    for (i, line) in lines.iter().enumerate() {
        let y = caption_top + i as f32 * line_height;
        centred_text(&layer, &font, line, CAPTION_PT, page_w, page_h - y);
    }

    // Footer
    let footer = format!(
        "Generated on: {}",
        Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p")
    );
    centred_text(&layer, &font, &footer, FOOTER_PT, page_w, FOOTER_FROM_BOTTOM);

    doc.save_to_bytes()
        .map_err(|e| format!("Failed to write PDF: {}", e))
}

fn set_grey(layer: &PdfLayerReference, level: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(level, level, level, None)));
}

/// Draw `text` centred on `page_w` with its baseline at `baseline_y` (PDF
/// coordinates).
fn centred_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_pt: f32,
    page_w: f32,
    baseline_y: f32,
) {
    let x = ((page_w - text_width_mm(text, font_pt)) / 2.0).max(0.0);
    layer.use_text(text, font_pt, Mm(x), Mm(baseline_y), font);
}
