//! Error types for lux-core operations.
//!
//! Only construction-time validation can fail in this crate. Degenerate
//! pixel data (empty or fully transparent images) is never an error: the
//! statistics pass answers it with [`crate::ColorStats::neutral`].
//!
//! # Usage
//!
//! ```rust
//! use lux_core::{Error, RasterImage};
//!
//! let err = RasterImage::from_rgba8(vec![0; 3], 1, 1).unwrap_err();
//! assert!(matches!(err, Error::BufferSizeMismatch { .. }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or addressing a [`crate::RasterImage`].
#[derive(Debug, Error)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when `width * height * 4` would overflow `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Row stride is smaller than one row of RGBA8 pixels.
    #[error("stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride
        stride: usize,
        /// Minimum required stride (`width * 4`)
        min_stride: usize,
        /// Image width
        width: u32,
    },

    /// Pixel buffer does not match the declared geometry.
    #[error("buffer size mismatch: expected at least {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes supplied
        actual: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a buffer geometry error.
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. } | Self::InvalidStride { .. } | Self::BufferSizeMismatch { .. }
        )
    }
}
