//! Pattern generation: resample a source image onto a stitch grid and map
//! every cell to a user-chosen subset of the yarn palette.
//!
//! The pipeline is resize -> median smooth -> nearest-palette recolor. The
//! median pass matters: JPEG artifacts and anti-aliasing otherwise fragment
//! solid regions into spurious extra colors. Only the final recolor stage
//! touches pixels independently, once the subset is fixed and small.

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::median_filter;
use imageproc::rect::Rect;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::PatternError;
use crate::glyphs;
use crate::palette::{lab_distance, rgb_to_lab, PaletteEntry, YarnPalette};
use crate::raster::{clamp_dimension_sum, draw_cell_grid_lines, draw_thick_hollow_rect};

const GRID_LINE_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const BORDER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const LEGEND_TEXT_COLOR: Rgb<u8> = Rgb([40, 40, 40]);

/// Raster sizing knobs.
///
/// The pixel floors and the width+height ceiling mirror the documented image
/// limits of the downstream chat transport; a different transport should
/// override them rather than treat them as business rules.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Magnification factor: one stitch becomes this many pixels.
    pub cell_size: u32,
    /// Minimum stitch count per grid side.
    pub min_side: u32,
    /// Minimum pixel size per raster side.
    pub min_raster_px: u32,
    /// Maximum width + height of any emitted raster.
    pub max_dimension_sum: u32,
    /// Legend layout cell, wide enough for a swatch plus label.
    pub legend_cell_width: u32,
    pub legend_cell_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_size: 20,
            min_side: 10,
            min_raster_px: 100,
            max_dimension_sum: 9900,
            legend_cell_width: 300,
            legend_cell_height: 80,
        }
    }
}

/// The canonical stitch grid: one palette color name per cell, row-major.
///
/// Owned by a single session; step edits mutate it in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorGrid {
    width: u32,
    height: u32,
    cells: Vec<&'static str>,
}

impl ColorGrid {
    /// Build a grid from explicit rows. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<&'static str>]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        assert!(height > 0 && width > 0, "grid must be non-empty");
        let mut cells = Vec::with_capacity((width * height) as usize);
        for row in rows {
            assert_eq!(row.len() as u32, width, "ragged grid rows");
            cells.extend_from_slice(row);
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color name at (row, col), 0-indexed.
    pub fn get(&self, row: u32, col: u32) -> &'static str {
        self.cells[(row * self.width + col) as usize]
    }

    pub(crate) fn set(&mut self, row: u32, col: u32, name: &'static str) {
        self.cells[(row * self.width + col) as usize] = name;
    }

    /// One row of cells in left-to-right order.
    pub fn row(&self, row: u32) -> &[&'static str] {
        let start = (row * self.width) as usize;
        &self.cells[start..start + self.width as usize]
    }

    pub(crate) fn cells(&self) -> &[&'static str] {
        &self.cells
    }
}

/// One used color in the pattern with its stitch count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub name: &'static str,
    pub rgb: [u8; 3],
    pub count: u32,
}

/// Everything produced for one pattern request.
#[derive(Debug)]
pub struct PatternOutput {
    /// The canonical per-cell grid.
    pub grid: ColorGrid,
    /// One pixel per stitch, no decoration. Used for zoom crops.
    pub cell_image: RgbImage,
    /// Magnified raster with grid lines and border.
    pub grid_image: RgbImage,
    /// Swatch table of the used colors.
    pub legend_image: RgbImage,
    pub legend: Vec<LegendEntry>,
    pub total_stitches: u32,
}

/// Generate a pattern from raw image bytes.
pub fn generate_pattern<S: AsRef<str>>(
    bytes: &[u8],
    long_side: u32,
    chosen: &[S],
    palette: &YarnPalette,
    config: &RenderConfig,
) -> Result<PatternOutput, PatternError> {
    let img = image::load_from_memory(bytes)?;
    generate_from_image(&img, long_side, chosen, palette, config)
}

/// Generate a pattern from an already-decoded image.
pub fn generate_from_image<S: AsRef<str>>(
    img: &DynamicImage,
    long_side: u32,
    chosen: &[S],
    palette: &YarnPalette,
    config: &RenderConfig,
) -> Result<PatternOutput, PatternError> {
    // Resolve the selection before any pixel work. Unknown names are
    // skipped; a selection with nothing usable is rejected outright.
    let mut seen = HashSet::new();
    let subset: Vec<&PaletteEntry> = chosen
        .iter()
        .filter_map(|name| palette.get(name.as_ref()))
        .filter(|entry| seen.insert(entry.name))
        .collect();
    if subset.is_empty() {
        return Err(PatternError::InvalidColorSelection);
    }

    let (orig_w, orig_h) = img.dimensions();
    let long_side = long_side.max(config.min_side);
    let (mut new_w, mut new_h) = if orig_w >= orig_h {
        (
            long_side,
            ((orig_h as f32 / orig_w as f32) * long_side as f32) as u32,
        )
    } else {
        (
            ((orig_w as f32 / orig_h as f32) * long_side as f32) as u32,
            long_side,
        )
    };
    new_w = new_w.max(config.min_side);
    new_h = new_h.max(config.min_side);

    let resized = image::imageops::resize(&img.to_rgb8(), new_w, new_h, FilterType::Lanczos3);
    let smoothed = median_filter(&resized, 1, 1);

    // Map every cell to its nearest chosen color by Lab Delta-E.
    let mapped: Vec<[u8; 3]> = smoothed
        .pixels()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|pixel| {
            let lab = rgb_to_lab(pixel.0);
            let mut best = subset[0];
            let mut best_dist = f32::MAX;
            for &entry in &subset {
                let dist = lab_distance(entry.lab, lab);
                if dist < best_dist {
                    best_dist = dist;
                    best = entry;
                }
            }
            best.rgb
        })
        .collect();

    let mut cell_image = RgbImage::new(new_w, new_h);
    for (pixel, rgb) in cell_image.pixels_mut().zip(&mapped) {
        *pixel = Rgb(*rgb);
    }

    // Read the grid back from the recolored raster; every pixel is an exact
    // palette triplet at this point.
    let cells: Vec<&'static str> = cell_image.pixels().map(|p| palette.name_of(p.0)).collect();
    let grid = ColorGrid {
        width: new_w,
        height: new_h,
        cells,
    };

    let mut counts: HashMap<&'static str, u32> = HashMap::new();
    for &name in grid.cells() {
        *counts.entry(name).or_insert(0) += 1;
    }
    let mut legend: Vec<LegendEntry> = counts
        .into_iter()
        .map(|(name, count)| LegendEntry {
            name,
            rgb: palette.get(name).map(|e| e.rgb).unwrap_or([0, 0, 0]),
            count,
        })
        .collect();
    legend.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(palette.position(a.name).cmp(&palette.position(b.name)))
    });

    let grid_image = render_grid_raster(&cell_image, config);
    let legend_image = render_legend(&legend, config);
    let total_stitches = new_w * new_h;

    log::info!(
        "pattern generated: {}x{} stitches, {} colors used of {} chosen",
        new_w,
        new_h,
        legend.len(),
        subset.len()
    );

    Ok(PatternOutput {
        grid,
        cell_image,
        grid_image,
        legend_image,
        legend,
        total_stitches,
    })
}

/// Magnify the cell raster and decorate it with grid lines and a border.
fn render_grid_raster(cell_image: &RgbImage, config: &RenderConfig) -> RgbImage {
    let cols = cell_image.width();
    let rows = cell_image.height();

    let gw = (cols * config.cell_size).max(config.min_raster_px);
    let gh = (rows * config.cell_size).max(config.min_raster_px);
    let (gw, gh) = clamp_dimension_sum(gw, gh, config.max_dimension_sum);

    let mut out = image::imageops::resize(cell_image, gw, gh, FilterType::Nearest);
    draw_cell_grid_lines(&mut out, cols, rows, GRID_LINE_COLOR);
    draw_thick_hollow_rect(&mut out, 0, 0, gw, gh, 3, BORDER_COLOR);
    out
}

/// Lay the used colors out in a roughly square swatch table.
fn render_legend(legend: &[LegendEntry], config: &RenderConfig) -> RgbImage {
    let n = legend.len().max(1) as u32;
    let rows = (n as f32).sqrt().ceil() as u32;
    let cols = n.div_ceil(rows);

    let width = (cols * config.legend_cell_width).max(config.legend_cell_width);
    let height = (rows * config.legend_cell_height).max(config.legend_cell_height);
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (i, entry) in legend.iter().enumerate() {
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        let x = (col * config.legend_cell_width) as i32;
        let y = (row * config.legend_cell_height) as i32;

        draw_filled_rect_mut(
            &mut img,
            Rect::at(x + 10, y + 10).of_size(40, 40),
            Rgb(entry.rgb),
        );
        draw_thick_hollow_rect(&mut img, x + 10, y + 10, 40, 40, 2, BORDER_COLOR);

        glyphs::draw_text(&mut img, entry.name, x + 60, y + 16, 2, BORDER_COLOR);
        glyphs::draw_text(
            &mut img,
            &format!("STITCHES: {}", entry.count),
            x + 60,
            y + 46,
            2,
            LEGEND_TEXT_COLOR,
        );
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_and_half(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([220, 20, 60])
            } else {
                Rgb([0, 0, 255])
            }
        }))
    }

    #[test]
    fn grid_readback_matches_the_chosen_subset() {
        let palette = YarnPalette::standard();
        let out = generate_from_image(
            &half_and_half(40, 20),
            40,
            &["Red", "Blue"],
            &palette,
            &RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(out.grid.width(), 40);
        assert_eq!(out.grid.height(), 20);
        assert_eq!(out.total_stitches, 800);
        assert_eq!(out.grid.get(0, 0), "Red");
        assert_eq!(out.grid.get(19, 39), "Blue");
        for &name in out.grid.cells() {
            assert!(name == "Red" || name == "Blue");
        }
    }

    #[test]
    fn legend_is_sorted_by_count_then_palette_order() {
        let palette = YarnPalette::standard();
        let out = generate_from_image(
            &half_and_half(40, 20),
            40,
            &["Blue", "Red"],
            &palette,
            &RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(out.legend.len(), 2);
        let total: u32 = out.legend.iter().map(|e| e.count).sum();
        assert_eq!(total, out.total_stitches);
        // Equal counts: Red precedes Blue in the curated palette order.
        assert_eq!(out.legend[0].count, out.legend[1].count);
        assert_eq!(out.legend[0].name, "Red");
    }

    #[test]
    fn empty_or_unknown_selection_is_rejected_before_pixel_work() {
        let palette = YarnPalette::standard();
        let img = half_and_half(20, 20);
        let config = RenderConfig::default();

        let empty: &[&str] = &[];
        assert!(matches!(
            generate_from_image(&img, 20, empty, &palette, &config),
            Err(PatternError::InvalidColorSelection)
        ));
        assert!(matches!(
            generate_from_image(&img, 20, &["NotAColor"], &palette, &config),
            Err(PatternError::InvalidColorSelection)
        ));
    }

    #[test]
    fn unknown_names_in_a_mixed_selection_are_skipped() {
        let palette = YarnPalette::standard();
        let out = generate_from_image(
            &half_and_half(20, 20),
            20,
            &["Red", "NotAColor", "Blue"],
            &palette,
            &RenderConfig::default(),
        )
        .unwrap();
        assert_eq!(out.legend.len(), 2);
    }

    #[test]
    fn narrow_images_are_clamped_to_the_minimum_side() {
        let palette = YarnPalette::standard();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 10, Rgb([220, 20, 60])));
        let out =
            generate_from_image(&img, 40, &["Red"], &palette, &RenderConfig::default()).unwrap();
        assert_eq!(out.grid.width(), 40);
        assert_eq!(out.grid.height(), 10);
    }

    #[test]
    fn grid_raster_respects_the_dimension_sum_ceiling() {
        let palette = YarnPalette::standard();
        let config = RenderConfig {
            max_dimension_sum: 2000,
            ..RenderConfig::default()
        };
        let out = generate_from_image(&half_and_half(60, 60), 60, &["Red", "Blue"], &palette, &config)
            .unwrap();

        // 60 cells at 20px would be 1200+1200; the ceiling forces a shrink.
        let (w, h) = out.grid_image.dimensions();
        assert!(w + h <= config.max_dimension_sum);
        assert!(w >= config.min_raster_px && h >= config.min_raster_px);
    }

    #[test]
    fn legend_raster_uses_a_square_ish_layout() {
        let palette = YarnPalette::standard();
        let config = RenderConfig::default();
        let out =
            generate_from_image(&half_and_half(40, 20), 40, &["Red", "Blue"], &palette, &config)
                .unwrap();

        // Two entries: 2 rows x 1 column of 300x80 cells.
        assert_eq!(out.legend_image.dimensions(), (300, 160));
    }

    #[test]
    fn byte_entrypoint_decodes_and_generates() {
        let palette = YarnPalette::standard();
        let mut bytes = Vec::new();
        half_and_half(30, 30)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let out = generate_pattern(&bytes, 30, &["Red", "Blue"], &palette, &RenderConfig::default())
            .unwrap();
        assert_eq!(out.grid.width(), 30);

        assert!(matches!(
            generate_pattern(b"junk", 30, &["Red"], &palette, &RenderConfig::default()),
            Err(PatternError::Decode(_))
        ));
    }
}
