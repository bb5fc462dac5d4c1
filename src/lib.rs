//! Image to stitch-pattern conversion.
//!
//! Turns a raster image into a discretized, color-reduced stitch grid plus
//! ordered row-by-row working instructions and per-step visual guides:
//!
//! 1. [`analyze_complexity`] recommends a grid resolution from the image's
//!    color and edge complexity.
//! 2. [`suggest_colors`] extracts the image's dominant colors and ranks the
//!    matching yarn palette entries.
//! 3. [`generate_pattern`] resamples the image onto the stitch grid,
//!    recolors every cell from the chosen palette subset, and renders the
//!    grid and legend rasters.
//! 4. [`StepSequence`] converts the grid into direction-alternating
//!    run-length steps and supports per-step recoloring.
//! 5. [`compose_guide`] renders the locator + zoom guide for one step.
//!
//! The crate is computation-only: no I/O beyond image decode/encode, no
//! shared mutable state. Each session owns its own grid and step sequence;
//! callers wrapping this in an interactive surface are responsible for
//! serializing concurrent edits against the same grid.

mod complexity;
mod error;
mod glyphs;
mod guide;
mod mapper;
mod palette;
mod raster;
mod steps;
mod suggest;

pub use complexity::{
    analyze_complexity, analyze_image, AnalyzerConfig, ComplexityProfile, DetailLevel,
};
pub use error::PatternError;
pub use guide::{compose_guide, GuideConfig};
pub use mapper::{
    generate_from_image, generate_pattern, ColorGrid, LegendEntry, PatternOutput, RenderConfig,
};
pub use self::palette::{classify, color_distance, PaletteEntry, YarnPalette, FALLBACK_COLOR};
pub use raster::encode_png;
pub use steps::{Direction, StepSequence, StepUnit};
pub use suggest::{suggest_colors, suggest_from_image};
