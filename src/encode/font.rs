//! Bitmap text for barcode captions.
//!
//! Uses the Spleen 12x24 font, scaled nearest-neighbour to the requested
//! pixel height.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};

const GLYPH_WIDTH: usize = 12;
const GLYPH_HEIGHT: usize = 24;

/// Width in pixels of one character cell at `font_size` px height.
pub fn cell_width(font_size: u32) -> u32 {
    // 12/24 of a u32 always fits
    (u64::from(font_size) * GLYPH_WIDTH as u64)
        .div_ceil(GLYPH_HEIGHT as u64)
        .max(1) as u32
}

/// Width in pixels of `text` at `font_size`.
pub fn text_width(text: &str, font_size: u32) -> u64 {
    u64::from(cell_width(font_size)) * text.chars().count() as u64
}

/// Draw `text` with its top-left corner at (`x`, `y`). Pixels outside the
/// image are clipped.
pub fn draw_text(
    img: &mut RgbaImage,
    text: &str,
    x: i64,
    y: i64,
    font_size: u32,
    color: Rgba<u8>,
) -> Result<(), String> {
    let mut font =
        PSF2Font::new(FONT_12X24).map_err(|_| "embedded font data is invalid".to_string())?;

    let cw = cell_width(font_size) as usize;
    let ch = font_size.max(1) as usize;

    for (i, c) in text.chars().enumerate() {
        let glyph = glyph_bitmap(&mut font, c);
        let origin_x = x + (i * cw) as i64;

        for ty in 0..ch {
            let sy = ty * GLYPH_HEIGHT / ch;
            for tx in 0..cw {
                let sx = tx * GLYPH_WIDTH / cw;
                if !glyph[sy * GLYPH_WIDTH + sx] {
                    continue;
                }
                let px = origin_x + tx as i64;
                let py = y + ty as i64;
                if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
    Ok(())
}

/// 12x24 on/off bitmap for `c`; unknown characters render as a box.
fn glyph_bitmap(font: &mut PSF2Font, c: char) -> Vec<bool> {
    let mut bitmap = vec![false; GLYPH_WIDTH * GLYPH_HEIGHT];
    let utf8 = c.to_string();

    match font.glyph_for_utf8(utf8.as_bytes()) {
        Some(glyph) => {
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    let idx = row_y * GLYPH_WIDTH + col_x;
                    if col_x < GLYPH_WIDTH && idx < bitmap.len() {
                        bitmap[idx] = on;
                    }
                }
            }
        }
        None => {
            for y in 2..GLYPH_HEIGHT - 2 {
                for x in 1..GLYPH_WIDTH - 1 {
                    let edge = y == 2 || y == GLYPH_HEIGHT - 3 || x == 1 || x == GLYPH_WIDTH - 2;
                    bitmap[y * GLYPH_WIDTH + x] = edge;
                }
            }
        }
    }
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_scales_with_size() {
        assert_eq!(cell_width(24), 12);
        assert_eq!(cell_width(16), 8);
        assert_eq!(text_width("12345", 16), 40);
    }

    #[test]
    fn test_draw_text_marks_pixels() {
        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);
        let mut img = RgbaImage::from_pixel(40, 20, white);
        draw_text(&mut img, "8", 2, 2, 16, black).unwrap();
        assert!(img.pixels().any(|p| *p == black));
    }

    #[test]
    fn test_draw_text_clips_outside() {
        let white = Rgba([255, 255, 255, 255]);
        let mut img = RgbaImage::from_pixel(4, 4, white);
        draw_text(&mut img, "WWW", -10, -10, 32, Rgba([0, 0, 0, 255])).unwrap();
    }
}
