//! # lux-adjust
//!
//! Adjustment parameters, master-slider resolvers and the per-pixel
//! tone/color/black & white transform.
//!
//! # Modules
//!
//! - [`params`] - boundary [`AdjustmentVector`] and typed [`AdjustParams`]
//! - [`resolve`] - Light, Color and B&W master resolvers
//! - [`transform`] - the three-stage pixel transform shared with the GPU shader
//! - [`keys`] - parameter key names
//!
//! # Example
//!
//! ```rust
//! use lux_adjust::{AdjustmentVector, OverrideMode, resolve_adjustments, transform};
//! use lux_core::ColorStats;
//!
//! let raw = AdjustmentVector::new()
//!     .with("Light_Master", 0.5)
//!     .with("Light_Enabled", true);
//! let params = resolve_adjustments(&raw, &ColorStats::neutral(), OverrideMode::Delta);
//!
//! let out = transform::apply_rgba8([64, 64, 64, 255], &params, 0, 0);
//! assert!(out[0] > 64);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod keys;
pub mod params;
pub mod resolve;
pub mod transform;

pub use error::{AdjustError, AdjustResult};
pub use params::{AdjustParams, AdjustValue, AdjustmentVector, BwParams, ColorParams, LightParams, ParamFamily};
pub use resolve::{OverrideMode, apply_overrides, resolve_adjustments, resolve_bw, resolve_color, resolve_light};
