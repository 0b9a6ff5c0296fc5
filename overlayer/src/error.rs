//! Error types used by the crate.

use thiserror::Error;

/// Reason a bitmap tile could not be produced.
///
/// The type is cheap to clone so that every caller waiting for the same tile receives the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileLoadError {
    /// The resolved locator points to nothing (missing file or HTTP 404).
    #[error("tile not found: {0}")]
    NotFound(String),
    /// Transport level failure. Retrying is left to the caller.
    #[error("network error: {0}")]
    Network(String),
    /// A local tile file exists but could not be read.
    #[error("failed to read tile file: {0}")]
    Io(String),
    /// The payload was loaded but is not a valid image.
    #[error("failed to decode tile: {0}")]
    Decode(String),
    /// The fetch was abandoned before it completed.
    #[error("tile request was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TileLoadError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<image::ImageError> for TileLoadError {
    fn from(value: image::ImageError) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Error in a tile URL template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a placeholder other than `{x}`, `{y}`, `{z}` and `{scale}`.
    #[error("invalid tile url template {template:?}: {reason}")]
    Invalid {
        /// The offending template.
        template: String,
        /// Formatter message.
        reason: String,
    },
}

/// Error converting a feed record into an overlay.
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    /// A coordinate is outside of valid latitude/longitude ranges or is not finite.
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
    },
    /// The record does not have enough vertices for its geometry type.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    /// The geometry type has no overlay representation.
    #[error("unsupported geometry type: {0}")]
    Unsupported(String),
    /// The interchange payload itself could not be parsed.
    #[error("failed to decode feed: {0}")]
    Decoding(String),
}

/// Invalid style configuration value.
#[derive(Debug, Error, PartialEq)]
pub enum StyleError {
    /// Dash pattern contains a length that is not a positive finite number.
    #[error("dash pattern lengths must be positive, got {0}")]
    InvalidDashLength(f64),
    /// Gradient stop fraction is not a finite number.
    #[error("gradient stop fraction must be finite, got {0}")]
    InvalidStopFraction(f64),
}

/// Error creating a raster surface or a rasterizer.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Requested surface has zero or too large dimensions.
    #[error("invalid raster size {width}x{height}")]
    InvalidSize {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Base image does not have the size of the output.
    #[error("base image is {actual_width}x{actual_height} pixels, output is {width}x{height}")]
    BaseSizeMismatch {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
        /// Base image width in pixels.
        actual_width: u32,
        /// Base image height in pixels.
        actual_height: u32,
    },
    /// Worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Invalid scalar grid definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Number of values does not match `columns * rows`, or one of the dimensions is zero.
    #[error("grid expects {expected} values, got {actual}")]
    DimensionMismatch {
        /// Expected number of values.
        expected: usize,
        /// Provided number of values.
        actual: usize,
    },
    /// Corners are not valid coordinates or are not in north-west / south-east order.
    #[error("invalid grid bounds")]
    InvalidBounds,
}
