//! Curated yarn palette with perceptual color matching.
//!
//! All pattern colors come from a fixed set of named yarn colors. Matching
//! uses Delta-E in CIE Lab (D65), which ranks hue differences far closer to
//! how they read by eye than raw RGB distance does.

use palette::{white_point::D65, FromColor, Hsv, Lab, Srgb};
use std::collections::HashMap;

/// Name used when a pixel cannot be matched back to a palette entry.
pub const FALLBACK_COLOR: &str = "Black";

/// Standard yarn palette (37 curated colors).
/// Based on common Bernat/Red Heart solid yarn lines.
/// Each entry: (name, rgb)
const STANDARD_YARN_PALETTE: &[(&str, [u8; 3])] = &[
    // Neutrals
    ("Black", [0, 0, 0]),
    ("White", [255, 255, 255]),
    ("Dark Gray", [80, 80, 80]),
    ("Gray", [128, 128, 128]),
    ("Light Gray", [192, 192, 192]),
    ("Cream", [255, 253, 208]),
    ("Beige", [245, 222, 179]),
    // Skin tones
    ("Skin", [255, 224, 189]),
    ("Light Skin", [255, 239, 219]),
    ("Dark Skin", [210, 180, 140]),
    // Reds & Pinks
    ("Dark Red", [128, 0, 0]),
    ("Red", [220, 20, 60]),
    ("Dark Pink", [199, 21, 133]),
    ("Pink", [255, 192, 203]),
    ("Light Pink", [255, 228, 225]),
    // Oranges & Browns
    ("Dark Brown", [101, 67, 33]),
    ("Brown", [165, 42, 42]),
    ("Rust", [183, 65, 14]),
    ("Orange", [255, 140, 0]),
    ("Peach", [255, 218, 185]),
    ("Camel", [193, 154, 107]),
    // Yellows & Golds
    ("Dark Gold", [184, 134, 11]),
    ("Gold", [255, 215, 0]),
    ("Yellow", [255, 255, 0]),
    // Greens
    ("Dark Green", [0, 100, 0]),
    ("Green", [0, 180, 0]),
    ("Olive", [128, 128, 0]),
    ("Light Green", [144, 238, 144]),
    ("Mint", [152, 255, 152]),
    // Blues
    ("Navy", [0, 0, 128]),
    ("Dark Blue", [0, 0, 205]),
    ("Blue", [0, 0, 255]),
    ("Sky Blue", [135, 206, 235]),
    ("Turquoise", [64, 224, 208]),
    // Purples
    ("Dark Purple", [75, 0, 130]),
    ("Purple", [128, 0, 128]),
    ("Lilac", [200, 162, 200]),
    ("Lavender", [230, 230, 250]),
];

/// One palette color with its precomputed Lab coordinates.
#[derive(Debug, Clone)]
pub struct PaletteEntry {
    pub name: &'static str,
    pub rgb: [u8; 3],
    pub lab: Lab<D65, f32>,
}

/// The process-wide yarn palette.
///
/// Built once with [`YarnPalette::standard`] and passed by reference; there
/// is no global instance.
pub struct YarnPalette {
    entries: Vec<PaletteEntry>,
    by_name: HashMap<&'static str, usize>,
    by_rgb: HashMap<[u8; 3], usize>,
}

impl YarnPalette {
    /// Build the standard palette with precomputed Lab values.
    pub fn standard() -> Self {
        let entries: Vec<PaletteEntry> = STANDARD_YARN_PALETTE
            .iter()
            .map(|&(name, rgb)| PaletteEntry {
                name,
                rgb,
                lab: rgb_to_lab(rgb),
            })
            .collect();

        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_rgb = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            by_name.insert(entry.name, idx);
            by_rgb.insert(entry.rgb, idx);
        }

        Self {
            entries,
            by_name,
            by_rgb,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All palette entries in their curated order.
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&PaletteEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Position of a named entry within the curated order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Exact reverse lookup from an RGB triplet to its palette name.
    ///
    /// Returns [`FALLBACK_COLOR`] for a triplet the palette does not contain.
    pub fn name_of(&self, rgb: [u8; 3]) -> &'static str {
        self.by_rgb
            .get(&rgb)
            .map(|&idx| self.entries[idx].name)
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Closest palette entry to an arbitrary RGB color by Lab Delta-E.
    pub fn nearest(&self, rgb: [u8; 3]) -> &PaletteEntry {
        &self.entries[self.nearest_index(rgb_to_lab(rgb))]
    }

    pub(crate) fn nearest_index(&self, lab: Lab<D65, f32>) -> usize {
        let mut best_idx = 0usize;
        let mut best_dist = f32::MAX;
        for (idx, entry) in self.entries.iter().enumerate() {
            let dist = lab_distance(entry.lab, lab);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }
        best_idx
    }
}

/// Perceptual distance between two RGB colors (CIE76 Delta-E).
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    lab_distance(rgb_to_lab(a), rgb_to_lab(b))
}

/// Euclidean distance in Lab space.
pub(crate) fn lab_distance(a: Lab<D65, f32>, b: Lab<D65, f32>) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// Convert RGB [0-255] to Lab color space.
pub(crate) fn rgb_to_lab(rgb: [u8; 3]) -> Lab<D65, f32> {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

/// Classify an arbitrary RGB color into a palette bucket by hue, saturation
/// and value.
///
/// This is a naming heuristic for grouping near-duplicate raw colors; final
/// pixel assignment always goes through Delta-E matching instead.
pub fn classify(rgb: [u8; 3]) -> &'static str {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    let hsv: Hsv = Hsv::from_color(srgb);
    let hue = hsv.hue.into_positive_degrees();
    let saturation = hsv.saturation;
    let value = hsv.value;

    // Black/white dominate any hue reading at the extremes.
    if value < 0.15 {
        return "Black";
    }
    if value > 0.9 && saturation < 0.1 {
        return "White";
    }

    // Nearly achromatic: gray ladder.
    if saturation < 0.15 {
        return if value > 0.75 {
            "Light Gray"
        } else if value > 0.45 {
            "Gray"
        } else {
            "Dark Gray"
        };
    }

    // Washed-out warm tones read as cream/beige, cool ones stay gray.
    if saturation < 0.30 {
        if hue < 60.0 || hue > 300.0 {
            return if value > 0.75 { "Cream" } else { "Beige" };
        }
        return if value > 0.65 { "Light Gray" } else { "Gray" };
    }

    if !(15.0..345.0).contains(&hue) {
        return if value < 0.5 {
            "Dark Red"
        } else if saturation > 0.6 {
            "Red"
        } else {
            "Pink"
        };
    }
    if hue < 45.0 {
        return if value < 0.4 {
            "Dark Brown"
        } else if value < 0.6 || saturation < 0.5 {
            "Brown"
        } else {
            "Orange"
        };
    }
    if hue < 70.0 {
        return if saturation < 0.5 {
            "Beige"
        } else if value > 0.7 {
            "Yellow"
        } else {
            "Gold"
        };
    }
    if hue < 160.0 {
        return if value < 0.4 {
            "Dark Green"
        } else if saturation > 0.5 {
            "Green"
        } else {
            "Olive"
        };
    }
    if hue < 200.0 {
        return "Turquoise";
    }
    if hue < 260.0 {
        return if value < 0.4 {
            "Navy"
        } else if value > 0.7 {
            "Sky Blue"
        } else {
            "Blue"
        };
    }
    if hue < 330.0 {
        return if saturation > 0.5 { "Purple" } else { "Pink" };
    }
    "Pink"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn palette_names_and_triplets_are_unique() {
        let palette = YarnPalette::standard();
        let names: HashSet<_> = palette.entries().iter().map(|e| e.name).collect();
        let rgbs: HashSet<_> = palette.entries().iter().map(|e| e.rgb).collect();
        assert_eq!(names.len(), palette.len());
        assert_eq!(rgbs.len(), palette.len());
    }

    #[test]
    fn distance_is_symmetric_with_zero_identity() {
        let samples = [[0u8, 0, 0], [255, 255, 255], [220, 20, 60], [0, 0, 255]];
        for a in samples {
            assert_eq!(color_distance(a, a), 0.0);
            for b in samples {
                let ab = color_distance(a, b);
                let ba = color_distance(b, a);
                assert!((ab - ba).abs() < 1e-4);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn every_entry_has_a_distinct_deterministic_nearest_neighbor() {
        let palette = YarnPalette::standard();
        for entry in palette.entries() {
            let pick = || {
                palette
                    .entries()
                    .iter()
                    .filter(|other| other.name != entry.name)
                    .min_by(|a, b| {
                        lab_distance(a.lab, entry.lab)
                            .partial_cmp(&lab_distance(b.lab, entry.lab))
                            .unwrap()
                    })
                    .map(|e| e.name)
                    .unwrap()
            };
            let first = pick();
            let second = pick();
            assert_eq!(first, second);
            assert_ne!(first, entry.name);
        }
    }

    #[test]
    fn nearest_returns_exact_entry_for_palette_colors() {
        let palette = YarnPalette::standard();
        for entry in palette.entries() {
            assert_eq!(palette.nearest(entry.rgb).name, entry.name);
        }
    }

    #[test]
    fn name_of_falls_back_for_unknown_triplets() {
        let palette = YarnPalette::standard();
        assert_eq!(palette.name_of([220, 20, 60]), "Red");
        assert_eq!(palette.name_of([1, 2, 3]), FALLBACK_COLOR);
    }

    #[test]
    fn classify_buckets_obvious_colors() {
        assert_eq!(classify([0, 0, 0]), "Black");
        assert_eq!(classify([255, 255, 255]), "White");
        assert_eq!(classify([128, 128, 128]), "Gray");
        assert_eq!(classify([255, 0, 0]), "Red");
        assert_eq!(classify([0, 0, 255]), "Blue");
        assert_eq!(classify([255, 255, 0]), "Yellow");
        assert_eq!(classify([0, 200, 0]), "Green");
    }

    #[test]
    fn classify_always_returns_a_palette_key() {
        let palette = YarnPalette::standard();
        for r in (0..=255u16).step_by(51) {
            for g in (0..=255u16).step_by(51) {
                for b in (0..=255u16).step_by(51) {
                    let name = classify([r as u8, g as u8, b as u8]);
                    assert!(palette.contains(name), "{name} is not a palette key");
                }
            }
        }
    }
}
