//! Per-step visual guides.
//!
//! A guide locates one step inside the whole pattern: a thumbnail of the
//! source photo marks the band of rows being worked, and a zoomed,
//! grid-lined crop outlines the step's exact cells. The zoom always renders
//! from the live color grid rather than a cached raster, so color edits show
//! up in the very next guide.

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};

use crate::glyphs;
use crate::mapper::ColorGrid;
use crate::palette::YarnPalette;
use crate::raster::{
    clamp_dimension_sum, draw_cell_grid_lines, draw_thick_hollow_rect, fit_within,
};
use crate::steps::StepUnit;

const CANVAS_COLOR: Rgb<u8> = Rgb([245, 245, 245]);
const GRID_LINE_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const BAND_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const HEADER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const INSTRUCTION_COLOR: Rgb<u8> = Rgb([50, 50, 50]);

/// Sizing knobs for the guide composition.
#[derive(Debug, Clone)]
pub struct GuideConfig {
    /// Rows shown in the zoom window.
    pub zoom_rows: u32,
    /// Columns shown in the zoom window.
    pub zoom_cols: u32,
    /// Pixels per cell in the zoom panel.
    pub cell_size: u32,
    /// Bound for the locator thumbnail.
    pub thumb_size: u32,
    /// Maximum width + height of the composed guide.
    pub max_dimension_sum: u32,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            zoom_rows: 50,
            zoom_cols: 40,
            cell_size: 20,
            thumb_size: 150,
            max_dimension_sum: 9900,
        }
    }
}

/// Compose the guide image for one step.
pub fn compose_guide(
    unit: &StepUnit,
    grid: &ColorGrid,
    original: &DynamicImage,
    palette: &YarnPalette,
    config: &GuideConfig,
) -> RgbImage {
    let row0 = unit.row - 1;
    let (min_row, max_row) = centered_window(row0, config.zoom_rows, grid.height());
    let mid_col = (unit.start_col + unit.end_col) / 2;
    let (min_col, max_col) = centered_window(mid_col, config.zoom_cols, grid.width());

    let locator = render_locator(original, min_row, max_row, grid.height(), config);
    let zoom = render_zoom(
        grid, palette, unit, min_row, max_row, min_col, max_col, config,
    );

    let canvas_w = (zoom.width() + 40).max(800);
    let canvas_h = 260 + zoom.height() + 20;
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, CANVAS_COLOR);

    let thumb_x = (canvas_w - locator.width()) / 2;
    image::imageops::replace(&mut canvas, &locator, thumb_x as i64, 20);

    let header = format!("ROW {} - STEP {}", unit.row, unit.number);
    let header_w = glyphs::text_width(&header, 4);
    glyphs::draw_text(
        &mut canvas,
        &header,
        (canvas_w.saturating_sub(header_w) / 2) as i32,
        190,
        4,
        HEADER_COLOR,
    );
    let instruction_w = glyphs::text_width(&unit.instruction, 2);
    glyphs::draw_text(
        &mut canvas,
        &unit.instruction,
        (canvas_w.saturating_sub(instruction_w) / 2) as i32,
        228,
        2,
        INSTRUCTION_COLOR,
    );

    let zoom_x = (canvas_w - zoom.width()) / 2;
    image::imageops::replace(&mut canvas, &zoom, zoom_x as i64, 260);

    let (cw, ch) = clamp_dimension_sum(canvas_w, canvas_h, config.max_dimension_sum);
    if (cw, ch) != (canvas_w, canvas_h) {
        canvas = image::imageops::resize(&canvas, cw, ch, FilterType::Lanczos3);
    }
    canvas
}

/// A window of `size` indices centered on `center`, clamped so it never
/// runs past either edge of `0..extent`. Used for both the row and column
/// extents of the zoom window.
fn centered_window(center: u32, size: u32, extent: u32) -> (u32, u32) {
    let size = size.min(extent);
    let mut min = center.saturating_sub(size / 2);
    let max = (min + size).min(extent);
    if max == extent {
        min = extent - size;
    }
    (min, min + size)
}

/// Source-photo thumbnail with a red band over the zoomed rows.
fn render_locator(
    original: &DynamicImage,
    min_row: u32,
    max_row: u32,
    grid_rows: u32,
    config: &GuideConfig,
) -> RgbImage {
    let rgb = original.to_rgb8();
    let (tw, th) = fit_within(rgb.width(), rgb.height(), config.thumb_size);
    let mut thumb = image::imageops::thumbnail(&rgb, tw, th);

    // Grid rows map to thumbnail rows by linear scaling.
    let band_top = ((min_row as f32 / grid_rows as f32) * th as f32) as i32;
    let band_bottom = ((max_row as f32 / grid_rows as f32) * th as f32) as i32;
    let band_height = (band_bottom - band_top).max(1) as u32;

    draw_thick_hollow_rect(&mut thumb, 0, band_top, tw, band_height, 4, BAND_COLOR);
    draw_thick_hollow_rect(&mut thumb, 0, 0, tw, th, 2, Rgb([0, 0, 0]));
    thumb
}

/// Zoomed crop of the cell grid with the step's visible cells outlined.
#[allow(clippy::too_many_arguments)]
fn render_zoom(
    grid: &ColorGrid,
    palette: &YarnPalette,
    unit: &StepUnit,
    min_row: u32,
    max_row: u32,
    min_col: u32,
    max_col: u32,
    config: &GuideConfig,
) -> RgbImage {
    let cols = max_col - min_col;
    let rows = max_row - min_row;

    // Crop from the undecorated cells; magnifying the lined raster instead
    // would compound the line artifacts.
    let crop = RgbImage::from_fn(cols, rows, |x, y| {
        let name = grid.get(min_row + y, min_col + x);
        Rgb(palette.get(name).map(|e| e.rgb).unwrap_or([0, 0, 0]))
    });

    let cell = config.cell_size;
    let mut zoom = image::imageops::resize(&crop, cols * cell, rows * cell, FilterType::Nearest);
    draw_cell_grid_lines(&mut zoom, cols, rows, GRID_LINE_COLOR);

    // Units store canonical left-to-right columns, so the outline needs no
    // direction handling, only clipping to the visible window.
    let row0 = unit.row - 1;
    let row_visible = row0 >= min_row && row0 < max_row;
    let span_visible = unit.end_col > min_col && unit.start_col < max_col;
    if row_visible && span_visible {
        let local_row = row0 - min_row;
        let local_start = unit.start_col.max(min_col) - min_col;
        let local_end = unit.end_col.min(max_col) - min_col;
        if local_end > local_start {
            draw_thick_hollow_rect(
                &mut zoom,
                (local_start * cell) as i32,
                (local_row * cell) as i32,
                (local_end - local_start) * cell,
                cell,
                6,
                HIGHLIGHT_COLOR,
            );
        }
    }
    zoom
}
