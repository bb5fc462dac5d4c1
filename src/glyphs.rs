//! Minimal 5x7 bitmap glyphs for raster labels.
//!
//! Labels on the legend and guide rasters are short ASCII strings, so a
//! small built-in glyph table avoids shipping a font file. Text is
//! uppercased before drawing; characters without a glyph advance the cursor
//! without drawing.

use image::{Rgb, RgbImage};

const GLYPH_COLS: u32 = 5;

/// Pixel width of a string at the given scale, including inter-glyph gaps.
pub(crate) fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    count * (GLYPH_COLS + 1) * scale - scale
}

/// Draw `text` with its top-left corner at (x, y), clipped to the image.
pub(crate) fn draw_text(img: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let mut cursor = x;
    let advance = ((GLYPH_COLS + 1) * scale) as i32;

    for ch in text.chars().flat_map(|c| c.to_uppercase()) {
        if let Some(rows) = glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for (col, bit) in bits.as_bytes().iter().enumerate() {
                    if *bit != b'1' {
                        continue;
                    }
                    fill_block(
                        img,
                        cursor + (col as u32 * scale) as i32,
                        y + (row as u32 * scale) as i32,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor += advance;
    }
}

fn fill_block(img: &mut RgbImage, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    for dy in 0..scale as i32 {
        for dx in 0..scale as i32 {
            let px = x + dx;
            let py = y + dy;
            if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

#[rustfmt::skip]
fn glyph(ch: char) -> Option<[&'static str; 7]> {
    let glyph = match ch {
        '0' => ["01110", "10001", "10011", "10101", "11001", "10001", "01110"],
        '1' => ["00100", "01100", "00100", "00100", "00100", "00100", "01110"],
        '2' => ["01110", "10001", "00001", "00010", "00100", "01000", "11111"],
        '3' => ["11110", "00001", "00001", "01110", "00001", "00001", "11110"],
        '4' => ["00010", "00110", "01010", "10010", "11111", "00010", "00010"],
        '5' => ["11111", "10000", "10000", "11110", "00001", "00001", "11110"],
        '6' => ["01110", "10000", "10000", "11110", "10001", "10001", "01110"],
        '7' => ["11111", "00001", "00010", "00100", "01000", "01000", "01000"],
        '8' => ["01110", "10001", "10001", "01110", "10001", "10001", "01110"],
        '9' => ["01110", "10001", "10001", "01111", "00001", "00001", "01110"],
        'A' => ["01110", "10001", "10001", "11111", "10001", "10001", "10001"],
        'B' => ["11110", "10001", "10001", "11110", "10001", "10001", "11110"],
        'C' => ["01111", "10000", "10000", "10000", "10000", "10000", "01111"],
        'D' => ["11110", "10001", "10001", "10001", "10001", "10001", "11110"],
        'E' => ["11111", "10000", "10000", "11110", "10000", "10000", "11111"],
        'F' => ["11111", "10000", "10000", "11110", "10000", "10000", "10000"],
        'G' => ["01111", "10000", "10000", "10111", "10001", "10001", "01110"],
        'H' => ["10001", "10001", "10001", "11111", "10001", "10001", "10001"],
        'I' => ["01110", "00100", "00100", "00100", "00100", "00100", "01110"],
        'J' => ["00111", "00010", "00010", "00010", "00010", "10010", "01100"],
        'K' => ["10001", "10010", "10100", "11000", "10100", "10010", "10001"],
        'L' => ["10000", "10000", "10000", "10000", "10000", "10000", "11111"],
        'M' => ["10001", "11011", "10101", "10101", "10001", "10001", "10001"],
        'N' => ["10001", "11001", "10101", "10011", "10001", "10001", "10001"],
        'O' => ["01110", "10001", "10001", "10001", "10001", "10001", "01110"],
        'P' => ["11110", "10001", "10001", "11110", "10000", "10000", "10000"],
        'Q' => ["01110", "10001", "10001", "10001", "10101", "10010", "01101"],
        'R' => ["11110", "10001", "10001", "11110", "10100", "10010", "10001"],
        'S' => ["01111", "10000", "10000", "01110", "00001", "00001", "11110"],
        'T' => ["11111", "00100", "00100", "00100", "00100", "00100", "00100"],
        'U' => ["10001", "10001", "10001", "10001", "10001", "10001", "01110"],
        'V' => ["10001", "10001", "10001", "10001", "10001", "01010", "00100"],
        'W' => ["10001", "10001", "10001", "10101", "10101", "10101", "01010"],
        'X' => ["10001", "10001", "01010", "00100", "01010", "10001", "10001"],
        'Y' => ["10001", "10001", "01010", "00100", "00100", "00100", "00100"],
        'Z' => ["11111", "00001", "00010", "00100", "01000", "10000", "11111"],
        ':' => ["00000", "00100", "00100", "00000", "00100", "00100", "00000"],
        '-' => ["00000", "00000", "00000", "01110", "00000", "00000", "00000"],
        ',' => ["00000", "00000", "00000", "00000", "00100", "00100", "01000"],
        '.' => ["00000", "00000", "00000", "00000", "00000", "00100", "00100"],
        '×' => ["00000", "10001", "01010", "00100", "01010", "10001", "00000"],
        '+' => ["00100", "00100", "00100", "11111", "00100", "00100", "00100"],
        _ => return None,
    };

    Some(glyph)
}
