use thiserror::Error;

/// Errors surfaced by the pattern pipeline.
///
/// Anything not listed here is a total computation: resizing, distance math
/// and raster drawing cannot fail on well-formed inputs.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The input bytes are not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A produced raster could not be encoded for the caller.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),

    /// The chosen color subset is empty or matches no palette entry.
    #[error("color selection is empty or matches no palette color")]
    InvalidColorSelection,

    /// A color name that is not a palette key was passed to an edit.
    #[error("unknown palette color: {0}")]
    UnknownColor(String),

    /// A step number outside the generated sequence was requested.
    #[error("step {requested} is out of range (1..={total})")]
    StepOutOfRange { requested: u32, total: u32 },
}
