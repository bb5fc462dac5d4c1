//! Image complexity analysis for grid-size recommendation.
//!
//! Two independent signals are combined: how many distinct colors a
//! downsampled copy contains, and how dense its edges are. Busy images get
//! a larger recommended stitch count so detail survives discretization.

use image::{DynamicImage, GenericImageView};
use imageproc::filter::laplacian_filter;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::PatternError;
use crate::raster::fit_within;

/// Downsample bound for the distinct-color count.
const COLOR_SAMPLE_BOUND: u32 = 200;
/// Downsample bound for the edge-density pass.
const EDGE_SAMPLE_BOUND: u32 = 400;
/// Minimum Laplacian response counted as an edge pixel.
const EDGE_THRESHOLD: i16 = 30;

/// Tuned knobs for the size recommendation.
///
/// The defaults are calibrated against cartoon-style source images; none of
/// them is load-bearing for correctness.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Weight of the distinct-color signal in the combined score.
    pub color_weight: f32,
    /// Weight of the edge-density signal. Edges are the stronger detail
    /// indicator, so this defaults higher.
    pub edge_weight: f32,
    /// Combined score above which an image counts as high detail.
    pub high_threshold: f32,
    /// Combined score above which an image counts as medium detail.
    pub medium_threshold: f32,
    /// Fraction of the longer pixel dimension used per detail level.
    pub high_fraction: f32,
    pub medium_fraction: f32,
    pub low_fraction: f32,
    /// Clamp range for the recommended stitch count.
    pub min_recommended: u32,
    pub max_recommended: u32,
    /// Margins for the suggested size band around the recommendation.
    pub band_below: u32,
    pub band_above: u32,
    /// Clamp range for the suggested band itself.
    pub band_floor: u32,
    pub band_ceiling: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            color_weight: 0.4,
            edge_weight: 0.6,
            high_threshold: 0.65,
            medium_threshold: 0.35,
            high_fraction: 0.35,
            medium_fraction: 0.22,
            low_fraction: 0.13,
            min_recommended: 100,
            max_recommended: 400,
            band_below: 50,
            band_above: 100,
            band_floor: 80,
            band_ceiling: 500,
        }
    }
}

/// Qualitative detail level of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailLevel {
    Low,
    Medium,
    High,
}

/// Result of analyzing one source image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityProfile {
    /// Recommended stitch count for the longer side.
    pub recommended: u32,
    /// Lower end of the suggested size band.
    pub min_size: u32,
    /// Upper end of the suggested size band.
    pub max_size: u32,
    pub detail_level: DetailLevel,
    /// Source dimensions in pixels (width, height).
    pub original_size: (u32, u32),
    /// Raw 0-1 distinct-color signal.
    pub color_complexity: f32,
    /// Raw 0-1 edge-density signal.
    pub edge_density: f32,
}

/// Analyze raw image bytes. Decoding is the only failure path.
pub fn analyze_complexity(
    bytes: &[u8],
    config: &AnalyzerConfig,
) -> Result<ComplexityProfile, PatternError> {
    let img = image::load_from_memory(bytes)?;
    Ok(analyze_image(&img, config))
}

/// Analyze an already-decoded image. Deterministic for identical pixels.
pub fn analyze_image(img: &DynamicImage, config: &AnalyzerConfig) -> ComplexityProfile {
    let (width, height) = img.dimensions();

    let color_complexity = color_complexity(img);
    let edge_density = edge_density(img);

    let combined = color_complexity * config.color_weight + edge_density * config.edge_weight;
    let (detail_level, fraction) = if combined > config.high_threshold {
        (DetailLevel::High, config.high_fraction)
    } else if combined > config.medium_threshold {
        (DetailLevel::Medium, config.medium_fraction)
    } else {
        (DetailLevel::Low, config.low_fraction)
    };

    let max_dimension = width.max(height);
    let raw = (max_dimension as f32 * fraction) as u32;
    let clamped = raw.clamp(config.min_recommended, config.max_recommended);
    // Round to the nearest multiple of 10 for cleaner size options.
    let recommended = ((clamped + 5) / 10) * 10;

    let profile = ComplexityProfile {
        recommended,
        min_size: recommended.saturating_sub(config.band_below).max(config.band_floor),
        max_size: (recommended + config.band_above).min(config.band_ceiling),
        detail_level,
        original_size: (width, height),
        color_complexity,
        edge_density,
    };

    log::debug!(
        "complexity: {}x{} colors={:.2} edges={:.2} -> {:?} {} stitches",
        width,
        height,
        color_complexity,
        edge_density,
        profile.detail_level,
        profile.recommended
    );

    profile
}

/// Distinct-color signal, 0-1.
///
/// Counted on a <=200px copy and log-scaled in three bands: under 100
/// colors reads as sparse, 100-500 as moderate, beyond that as rich.
fn color_complexity(img: &DynamicImage) -> f32 {
    let rgb = img.to_rgb8();
    let (w, h) = fit_within(rgb.width(), rgb.height(), COLOR_SAMPLE_BOUND);
    let small = image::imageops::thumbnail(&rgb, w, h);

    let unique: HashSet<[u8; 3]> = small.pixels().map(|p| p.0).collect();
    let count = unique.len() as f32;

    if count < 100.0 {
        count / 300.0
    } else if count < 500.0 {
        0.33 + (count - 100.0) / 1000.0
    } else {
        (0.73 + (count - 500.0) / 2000.0).min(1.0)
    }
}

/// Edge-density signal, 0-1: fraction of Laplacian responses above the
/// brightness threshold, saturating at a 20% edge fraction.
fn edge_density(img: &DynamicImage) -> f32 {
    let gray = img.to_luma8();
    let (w, h) = fit_within(gray.width(), gray.height(), EDGE_SAMPLE_BOUND);
    let small = image::imageops::thumbnail(&gray, w, h);

    let edges = laplacian_filter(&small);
    let total = (edges.width() as usize * edges.height() as usize).max(1);
    let edge_pixels = edges.pixels().filter(|p| p.0[0] > EDGE_THRESHOLD).count();

    let density = edge_pixels as f32 / total as f32;
    (density / 0.2).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn flat_image(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([90, 120, 200])))
    }

    fn noisy_image(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
            // Deterministic high-frequency pattern with many distinct colors.
            let r = ((x * 37 + y * 91) % 256) as u8;
            let g = ((x * 53 + y * 13) % 256) as u8;
            let b = ((x * 7 + y * 71) % 256) as u8;
            Rgb([r, g, b])
        }))
    }

    #[test]
    fn flat_image_reads_as_low_detail() {
        let profile = analyze_image(&flat_image(400), &AnalyzerConfig::default());
        assert_eq!(profile.detail_level, DetailLevel::Low);
        assert_eq!(profile.recommended, 100);
        assert_eq!(profile.original_size, (400, 400));
    }

    #[test]
    fn noisy_image_reads_as_more_detailed_than_flat() {
        let config = AnalyzerConfig::default();
        let flat = analyze_image(&flat_image(400), &config);
        let noisy = analyze_image(&noisy_image(400), &config);

        assert!(noisy.color_complexity >= flat.color_complexity);
        assert!(noisy.edge_density >= flat.edge_density);
        assert!(noisy.recommended >= flat.recommended);
    }

    #[test]
    fn recommendation_stays_within_bounds_and_band() {
        let config = AnalyzerConfig::default();
        for img in [flat_image(50), flat_image(900), noisy_image(300), noisy_image(1200)] {
            let profile = analyze_image(&img, &config);
            assert!(profile.recommended >= 100 && profile.recommended <= 400);
            assert_eq!(profile.recommended % 10, 0);
            assert!(profile.min_size >= 80);
            assert!(profile.max_size <= 500);
            assert!(profile.min_size <= profile.recommended);
            assert!(profile.recommended <= profile.max_size);
        }
    }

    #[test]
    fn analysis_is_deterministic_for_identical_bytes() {
        let img = noisy_image(200);
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        let config = AnalyzerConfig::default();
        let a = analyze_complexity(&bytes, &config).unwrap();
        let b = analyze_complexity(&bytes, &config).unwrap();
        assert_eq!(a.recommended, b.recommended);
        assert_eq!(a.color_complexity, b.color_complexity);
        assert_eq!(a.edge_density, b.edge_density);
    }

    #[test]
    fn invalid_bytes_fail_with_decode_error() {
        let err = analyze_complexity(b"not an image", &AnalyzerConfig::default()).unwrap_err();
        assert!(matches!(err, PatternError::Decode(_)));
    }
}
