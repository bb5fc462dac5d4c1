//! Shared raster helpers for the pattern and guide renderers.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

use crate::error::PatternError;

/// Shrink (w, h) proportionally so the longer side fits within `bound`.
/// Never upscales.
pub(crate) fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= bound {
        return (width, height);
    }
    let scale = bound as f32 / long as f32;
    (
        ((width as f32 * scale).round() as u32).max(1),
        ((height as f32 * scale).round() as u32).max(1),
    )
}

/// Shrink (w, h) proportionally until width + height fits the transport
/// ceiling.
pub(crate) fn clamp_dimension_sum(width: u32, height: u32, max_sum: u32) -> (u32, u32) {
    if width + height <= max_sum {
        return (width, height);
    }
    let scale = max_sum as f32 / (width + height) as f32;
    (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    )
}

/// Hollow rectangle with the outline growing inward, clipped to the image.
pub(crate) fn draw_thick_hollow_rect(
    img: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    for i in 0..thickness {
        let w = width.saturating_sub(2 * i);
        let h = height.saturating_sub(2 * i);
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            img,
            Rect::at(x + i as i32, y + i as i32).of_size(w, h),
            color,
        );
    }
}

/// Draw grid lines on a magnified cell raster.
///
/// Lines are placed at the effective cell pitch so they stay on cell
/// boundaries even after the raster was shrunk to fit transport limits.
pub(crate) fn draw_cell_grid_lines(img: &mut RgbImage, cols: u32, rows: u32, color: Rgb<u8>) {
    let width = img.width();
    let height = img.height();
    if cols == 0 || rows == 0 {
        return;
    }
    let pitch_x = width as f32 / cols as f32;
    let pitch_y = height as f32 / rows as f32;

    for col in 0..cols {
        let x = (col as f32 * pitch_x).round();
        imageproc::drawing::draw_line_segment_mut(
            img,
            (x, 0.0),
            (x, height as f32 - 1.0),
            color,
        );
    }
    for row in 0..rows {
        let y = (row as f32 * pitch_y).round();
        imageproc::drawing::draw_line_segment_mut(img, (0.0, y), (width as f32 - 1.0, y), color);
    }
}

/// Encode a raster as PNG bytes for the transport layer.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, PatternError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(PatternError::Encode)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_only_shrinks() {
        assert_eq!(fit_within(100, 50, 200), (100, 50));
        assert_eq!(fit_within(400, 200, 200), (200, 100));
        assert_eq!(fit_within(1000, 10, 100), (100, 1));
    }

    #[test]
    fn clamp_dimension_sum_respects_ceiling() {
        assert_eq!(clamp_dimension_sum(100, 100, 9900), (100, 100));
        let (w, h) = clamp_dimension_sum(8000, 8000, 9900);
        assert!(w + h <= 9900);
        assert_eq!(w, h);
    }

    #[test]
    fn encode_png_round_trips() {
        let img = RgbImage::from_pixel(12, 8, Rgb([10, 200, 30]));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (12, 8));
        assert_eq!(decoded.get_pixel(3, 3).0, [10, 200, 30]);
    }

    #[test]
    fn thick_rect_stays_in_bounds() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        draw_thick_hollow_rect(&mut img, -3, -3, 30, 30, 4, Rgb([255, 0, 0]));
        draw_thick_hollow_rect(&mut img, 2, 2, 10, 10, 3, Rgb([0, 0, 255]));
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 255]);
    }
}
