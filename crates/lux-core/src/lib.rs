//! # lux-core
//!
//! Core types for the lux photo adjustment engine.
//!
//! - [`RasterImage`] - 8-bit RGBA buffer with explicit row stride
//! - [`ColorStats`] - perceptual statistics consumed by the color resolver
//! - [`StatsAccumulator`] - reduction record shared by the CPU and GPU statistics passes
//! - [`color`] - HSV, sRGB EOTF, luma weights and other scalar helpers
//!
//! ## Crate Structure
//!
//! ```text
//! lux-core (this crate)
//!    ^
//!    +-- lux-adjust  (typed parameters, resolvers, pixel transform)
//!    +-- lux-compute (statistics engine, preview backends)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod image;
pub mod stats;

pub use error::{Error, Result};
pub use image::{BYTES_PER_PIXEL, RasterImage};
pub use stats::{ColorStats, HIST_BINS, StatsAccumulator};

/// Prelude module for convenient imports.
///
/// ```
/// use lux_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{Hsv, luma_rec601, luminance_rec709, rgb_to_hsv, srgb_eotf};
    pub use crate::error::{Error, Result};
    pub use crate::image::RasterImage;
    pub use crate::stats::{ColorStats, StatsAccumulator};
}
