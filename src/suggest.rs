//! Dominant-color suggestion.
//!
//! The image's actual dominant colors are extracted first (clustering with a
//! generous cluster count, so small but salient regions like eyes and
//! highlights survive) and only then matched to the yarn palette. Matching
//! every raw pixel independently instead would erase infrequent-but-visible
//! colors and drag common hues toward neighboring palette entries.

use image::DynamicImage;
use palette::{white_point::D65, Lab};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::PatternError;
use crate::palette::{classify, lab_distance, rgb_to_lab, YarnPalette};
use crate::raster::fit_within;

/// Downsample bound for color analysis.
const ANALYSIS_BOUND: u32 = 400;
/// Clusters extracted before palette matching; generous on purpose.
const EXTRACT_CLUSTERS: usize = 32;
const KMEANS_MAX_ITERATIONS: usize = 12;
/// Below this sample count clustering is pointless; fall back to raw
/// frequency counting.
const MIN_CLUSTER_SAMPLES: usize = 16;

/// Suggest up to `max_colors` palette names for raw image bytes, ranked by
/// how much of the image they cover.
pub fn suggest_colors(
    bytes: &[u8],
    palette: &YarnPalette,
    max_colors: usize,
) -> Result<Vec<&'static str>, PatternError> {
    let img = image::load_from_memory(bytes)?;
    Ok(suggest_from_image(&img, palette, max_colors))
}

/// Suggest palette names for an already-decoded image.
pub fn suggest_from_image(
    img: &DynamicImage,
    palette: &YarnPalette,
    max_colors: usize,
) -> Vec<&'static str> {
    let rgb = img.to_rgb8();
    let (w, h) = fit_within(rgb.width(), rgb.height(), ANALYSIS_BOUND);
    let small = if (w, h) == (rgb.width(), rgb.height()) {
        rgb
    } else {
        image::imageops::resize(&rgb, w, h, image::imageops::FilterType::Lanczos3)
    };
    let raw: Vec<[u8; 3]> = small.pixels().map(|p| p.0).collect();

    let mut counts = vec![0u64; palette.len()];
    if raw.len() >= MIN_CLUSTER_SAMPLES {
        let labs: Vec<Lab<D65, f32>> = raw.par_iter().map(|&rgb| rgb_to_lab(rgb)).collect();
        let (centers, labels) = cluster_colors(&labs, EXTRACT_CLUSTERS, KMEANS_MAX_ITERATIONS);

        let mut occupancy = vec![0u64; centers.len()];
        for &label in &labels {
            occupancy[label as usize] += 1;
        }
        for (center, &count) in centers.iter().zip(&occupancy) {
            if count > 0 {
                counts[palette.nearest_index(*center)] += count;
            }
        }
    } else {
        accumulate_raw_frequencies(&raw, palette, &mut counts);
    }

    let mut ranked: Vec<(usize, u64)> = counts
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, count)| count > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let names: Vec<&'static str> = ranked
        .into_iter()
        .take(max_colors)
        .map(|(idx, _)| palette.entries()[idx].name)
        .collect();

    log::debug!(
        "suggested {} of {} palette colors from {} sample pixels",
        names.len(),
        palette.len(),
        raw.len()
    );
    names
}

/// Degenerate-input fallback: count exact pixel colors, merge near-duplicates
/// through their classification bucket, then match the bucket representative
/// to the palette.
fn accumulate_raw_frequencies(raw: &[[u8; 3]], palette: &YarnPalette, counts: &mut [u64]) {
    let mut freq: HashMap<[u8; 3], u64> = HashMap::new();
    for &rgb in raw {
        *freq.entry(rgb).or_insert(0) += 1;
    }

    // bucket -> (representative rgb, representative count, bucket total)
    let mut buckets: HashMap<&'static str, ([u8; 3], u64, u64)> = HashMap::new();
    for (&rgb, &count) in &freq {
        let entry = buckets.entry(classify(rgb)).or_insert((rgb, count, 0));
        if count > entry.1 || (count == entry.1 && rgb < entry.0) {
            entry.0 = rgb;
            entry.1 = count;
        }
        entry.2 += count;
    }

    for (rep, _, total) in buckets.into_values() {
        counts[palette.nearest_index(rgb_to_lab(rep))] += total;
    }
}

/// Deterministic k-means over Lab pixels.
///
/// Returns the final centroids and a per-pixel cluster label.
fn cluster_colors(
    pixels: &[Lab<D65, f32>],
    k: usize,
    max_iterations: usize,
) -> (Vec<Lab<D65, f32>>, Vec<u16>) {
    if pixels.is_empty() || k == 0 {
        return (vec![], vec![]);
    }
    let k = k.min(pixels.len());
    let mut centers = seed_centers(pixels, k);
    let mut labels = vec![0u16; pixels.len()];

    for _ in 0..max_iterations {
        let new_labels: Vec<u16> = pixels
            .par_iter()
            .map(|pixel| {
                let mut best_idx = 0u16;
                let mut best_dist = f32::MAX;
                for (i, center) in centers.iter().enumerate() {
                    let dist = lab_distance(*pixel, *center);
                    if dist < best_dist {
                        best_dist = dist;
                        best_idx = i as u16;
                    }
                }
                best_idx
            })
            .collect();

        let changed = new_labels
            .iter()
            .zip(labels.iter())
            .filter(|(a, b)| a != b)
            .count();
        labels = new_labels;
        if changed == 0 {
            break;
        }

        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64, 0u64); k];
        for (pixel, &label) in pixels.iter().zip(labels.iter()) {
            let sum = &mut sums[label as usize];
            sum.0 += pixel.l as f64;
            sum.1 += pixel.a as f64;
            sum.2 += pixel.b as f64;
            sum.3 += 1;
        }
        for (center, sum) in centers.iter_mut().zip(&sums) {
            if sum.3 > 0 {
                *center = Lab::new(
                    (sum.0 / sum.3 as f64) as f32,
                    (sum.1 / sum.3 as f64) as f32,
                    (sum.2 / sum.3 as f64) as f32,
                );
            }
        }
    }

    (centers, labels)
}

/// Farthest-point seeding. The first center is the median-luminance pixel, a
/// deterministic stand-in for random initialization.
fn seed_centers(pixels: &[Lab<D65, f32>], k: usize) -> Vec<Lab<D65, f32>> {
    let mut by_luminance: Vec<(usize, f32)> =
        pixels.iter().enumerate().map(|(i, p)| (i, p.l)).collect();
    by_luminance.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let first = by_luminance[pixels.len() / 2].0;

    let mut centers = vec![pixels[first]];
    let mut chosen: HashSet<usize> = HashSet::from([first]);

    let mut min_distances: Vec<f32> = pixels
        .par_iter()
        .map(|p| lab_distance(*p, centers[0]))
        .collect();

    while centers.len() < k {
        let (best_idx, _) = min_distances
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen.contains(i))
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
            .unwrap_or((0, &0.0));

        chosen.insert(best_idx);
        let new_center = pixels[best_idx];
        min_distances
            .par_iter_mut()
            .zip(pixels.par_iter())
            .for_each(|(min_d, pixel)| {
                let d = lab_distance(*pixel, new_center);
                if d < *min_d {
                    *min_d = d;
                }
            });
        centers.push(new_center);
    }

    centers
}
